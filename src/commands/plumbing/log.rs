use crate::areas::repository::Repository;
use crate::artifacts::log::rev_list::{LogEntry, RevList};
use crate::errors::DepotResult;

impl Repository {
    /// Up to `max_entries` commits reachable from `HEAD`, newest first.
    pub fn log(&self, max_entries: usize) -> DepotResult<Vec<LogEntry>> {
        let head = self.refs().read_head()?;

        let entries = RevList::new(self.database(), head)
            .into_iter()
            .take(max_entries)
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(entries)
    }
}
