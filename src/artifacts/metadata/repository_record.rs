//! Repository record: the metadata index of one hosted repository
//!
//! The record lists the repository's files and commits for fast querying.
//! It is a projection of the working tree and version history; whenever
//! they disagree, [`RepositoryRecord::reconcile_from_authoritative`]
//! rebuilds it from them.

use crate::artifacts::metadata::commit_record::CommitRecord;
use crate::artifacts::metadata::file_entry::{EntryKind, EntryStat, FileEntry};
use crate::artifacts::metadata::identity::{OwnerId, RepoId, RepoName};
use crate::errors::{DepotError, DepotResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub id: RepoId,
    pub owner: OwnerId,
    pub name: RepoName,
    pub created_at: DateTime<Utc>,
    /// Keyed by POSIX relative path, so paths are unique.
    files: BTreeMap<String, FileEntry>,
    /// Oldest first.
    commits: Vec<CommitRecord>,
}

impl RepositoryRecord {
    pub fn new(id: RepoId, owner: OwnerId, name: RepoName, created_at: DateTime<Utc>) -> Self {
        RepositoryRecord {
            id,
            owner,
            name,
            created_at,
            files: BTreeMap::new(),
            commits: Vec::new(),
        }
    }

    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.values()
    }

    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.files.get(path)
    }

    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    /// Record an uploaded file. Re-uploading a file replaces its entry.
    pub fn append_file(&mut self, entry: FileEntry) -> DepotResult<()> {
        self.check_kind(&entry.path, EntryKind::File)?;
        self.files.insert(entry.path.clone(), entry);

        Ok(())
    }

    /// Record a directory. Recording the same directory again is a no-op.
    pub fn append_directory(&mut self, entry: FileEntry) -> DepotResult<()> {
        self.check_kind(&entry.path, EntryKind::Directory)?;
        self.files.entry(entry.path.clone()).or_insert(entry);

        Ok(())
    }

    fn check_kind(&self, path: &str, kind: EntryKind) -> DepotResult<()> {
        match self.files.get(path) {
            Some(existing) if existing.kind != kind => Err(DepotError::Conflict(format!(
                "{path} already exists as a {}",
                existing.kind
            ))),
            _ => Ok(()),
        }
    }

    pub fn append_commit_intent(&mut self, message: impl Into<String>, date: DateTime<Utc>) {
        self.commits.push(CommitRecord::intent(message, date));
    }

    /// Rebuild files and commits from the working tree and history.
    ///
    /// `commits` is newest first, as history is walked. Every tracked path
    /// is stat'ed again; an entry whose kind and size did not change keeps
    /// its creation time. Paths no longer tracked are dropped, including
    /// directory entries. A failing `stat` leaves the record untouched.
    pub fn reconcile_from_authoritative<F>(
        &mut self,
        tracked_paths: &BTreeSet<String>,
        mut stat: F,
        commits: Vec<CommitRecord>,
        now: DateTime<Utc>,
    ) -> DepotResult<()>
    where
        F: FnMut(&str) -> DepotResult<EntryStat>,
    {
        let mut files = BTreeMap::new();

        for path in tracked_paths {
            let current = stat(path)?;
            let created_at = match self.files.get(path) {
                Some(previous) if previous.stat() == current => previous.created_at,
                _ => now,
            };

            files.insert(path.clone(), FileEntry::from_stat(path, current, created_at));
        }

        let mut commits = commits;
        commits.reverse();

        self.files = files;
        self.commits = commits;

        Ok(())
    }
}
