use chrono::{DateTime, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "directory"),
        }
    }
}

/// What the working tree reports for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct EntryStat {
    pub kind: EntryKind,
    /// Present for files only.
    pub size: Option<u64>,
}

impl EntryStat {
    pub fn file(size: u64) -> Self {
        Self::new(EntryKind::File, Some(size))
    }

    pub fn directory() -> Self {
        Self::new(EntryKind::Directory, None)
    }
}

/// One file or directory listed in a repository record.
///
/// Entries are never edited in place; an overwrite replaces the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    /// POSIX path relative to the repository root.
    pub path: String,
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl FileEntry {
    pub fn from_stat(path: &str, stat: EntryStat, created_at: DateTime<Utc>) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_owned();

        FileEntry {
            name,
            path: path.to_owned(),
            kind: stat.kind,
            size: stat.size,
            created_at,
        }
    }

    pub fn stat(&self) -> EntryStat {
        EntryStat::new(self.kind, self.size)
    }
}
