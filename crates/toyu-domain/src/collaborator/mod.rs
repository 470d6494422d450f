//! Interfaces to collaborators outside the ledger core

mod clock;
mod sink;

pub use clock::{Clock, FixedClock, SystemClock};
pub use sink::{ArtifactSink, MemorySink};
