use crate::artifacts::log::rev_list::LogEntry;
use chrono::{DateTime, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};

/// A commit as listed in a repository record.
///
/// Intent records are appended when a caller commits and carry no hash;
/// records rebuilt from history on revert carry the commit id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct CommitRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub message: String,
    pub date: DateTime<Utc>,
}

impl CommitRecord {
    pub fn intent(message: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self::new(None, message.into(), date)
    }

    pub fn is_reconciled(&self) -> bool {
        self.hash.is_some()
    }
}

impl From<LogEntry> for CommitRecord {
    fn from(entry: LogEntry) -> Self {
        Self::new(
            Some(entry.hash.to_string()),
            entry.message,
            entry.date.with_timezone(&Utc),
        )
    }
}
