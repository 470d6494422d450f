//! Two-phase commands
//!
//! Destructive or outward-facing operations are split in two: `prepare`
//! computes everything and returns a [`Prepared`] value showing what would
//! happen; nothing changes until [`Prepared::confirm`] is called. Dropping
//! the prepared value cancels the command.

use toyu_types::Result;

pub trait Prepared {
    /// What the user is asked to confirm
    type Preview;
    /// Result of the confirmed command
    type Outcome;

    fn preview(&self) -> &Self::Preview;

    fn confirm(self) -> Result<Self::Outcome>;
}
