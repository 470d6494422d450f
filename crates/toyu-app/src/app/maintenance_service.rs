//! Clearing the ledger (全データ削除)

use serde::Serialize;
use tracing::warn;

use toyu_domain::repository::RecordLedger;
use toyu_domain::RecordFilter;
use toyu_types::Result;

use super::command::Prepared;
use super::session::Session;

#[derive(Debug, Clone, Serialize)]
pub struct ClearPreview {
    pub records: usize,
    /// Records not yet handed to accounting; they are lost for good
    pub unexported: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearOutcome {
    pub deleted: usize,
}

pub struct PreparedClear<'a> {
    session: &'a Session,
    preview: ClearPreview,
}

pub fn prepare_clear(session: &Session) -> Result<PreparedClear<'_>> {
    let ledger = session.ledger();
    let preview = ClearPreview {
        records: ledger.count(&RecordFilter::all())?,
        unexported: ledger.count(&RecordFilter::unexported())?,
    };
    Ok(PreparedClear { session, preview })
}

impl Prepared for PreparedClear<'_> {
    type Preview = ClearPreview;
    type Outcome = ClearOutcome;

    fn preview(&self) -> &ClearPreview {
        &self.preview
    }

    fn confirm(self) -> Result<ClearOutcome> {
        let deleted = self.session.ledger().clear_all()?;
        warn!(deleted, "all delivery records deleted");
        Ok(ClearOutcome { deleted })
    }
}
