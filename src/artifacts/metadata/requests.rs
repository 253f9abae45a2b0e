//! Typed requests and responses for the hosting operations
//!
//! Requests are validated when they are built, so the orchestrator only
//! ever sees well-formed identities and contained paths. Uploaded bytes
//! are fully buffered in the request before any lock is taken.

use crate::artifacts::metadata::commit_record::CommitRecord;
use crate::artifacts::metadata::file_entry::FileEntry;
use crate::artifacts::metadata::identity::{OwnerId, RepoId, RepoName};
use crate::artifacts::workspace::containment::RelativePath;
use crate::errors::{DepotError, DepotResult};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CreateRepositoryRequest {
    pub owner: OwnerId,
    pub name: RepoName,
}

impl CreateRepositoryRequest {
    pub fn try_new(owner: &str, name: &str) -> DepotResult<Self> {
        Ok(Self {
            owner: OwnerId::try_parse(owner)?,
            name: RepoName::try_parse(name)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct UploadFileRequest {
    pub owner: OwnerId,
    pub repo_id: RepoId,
    /// Path of the uploaded file, target directory and file name joined.
    pub path: RelativePath,
    pub content: Bytes,
}

impl UploadFileRequest {
    pub fn try_new(
        owner: &str,
        repo_id: &str,
        target_dir: &str,
        file_name: &str,
        content: Bytes,
    ) -> DepotResult<Self> {
        let owner = OwnerId::try_parse(owner)?;
        let repo_id = RepoId::try_parse(repo_id)?;
        let path = RelativePath::parse(target_dir)
            .and_then(|dir| dir.join_file_name(file_name))
            .map_err(|violation| DepotError::Storage(violation.into()))?;

        Ok(Self {
            owner,
            repo_id,
            path,
            content,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateDirectoryRequest {
    pub owner: OwnerId,
    pub repo_id: RepoId,
    pub path: RelativePath,
}

impl CreateDirectoryRequest {
    pub fn try_new(owner: &str, repo_id: &str, dir_path: &str) -> DepotResult<Self> {
        let owner = OwnerId::try_parse(owner)?;
        let repo_id = RepoId::try_parse(repo_id)?;
        let path = RelativePath::parse_non_root(dir_path)
            .map_err(|violation| DepotError::Storage(violation.into()))?;

        Ok(Self {
            owner,
            repo_id,
            path,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub repo_id: RepoId,
    /// Trimmed, never empty.
    pub message: String,
}

impl CommitRequest {
    pub fn try_new(repo_id: &str, message: &str) -> DepotResult<Self> {
        let repo_id = RepoId::try_parse(repo_id)?;

        Ok(Self {
            repo_id,
            message: validate_commit_message(message)?,
        })
    }
}

/// Trim the message; an empty message is refused.
pub fn validate_commit_message(message: &str) -> DepotResult<String> {
    let message = message.trim();
    if message.is_empty() {
        return Err(DepotError::InvalidRequest(
            "commit message cannot be empty".to_string(),
        ));
    }

    Ok(message.to_string())
}

#[derive(Debug, Clone)]
pub struct RevertRequest {
    pub repo_id: RepoId,
    pub commit_ref: String,
}

impl RevertRequest {
    pub fn try_new(repo_id: &str, commit_ref: &str) -> DepotResult<Self> {
        Ok(Self {
            repo_id: RepoId::try_parse(repo_id)?,
            commit_ref: commit_ref.trim().to_string(),
        })
    }
}

/// Result of a commit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommitOutcome {
    Committed { hash: String, date: DateTime<Utc> },
    /// The working tree matched the last commit; no intent was recorded.
    NothingToCommit,
}

/// Files and commits of a repository after a revert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevertOutcome {
    pub commits: Vec<CommitRecord>,
    pub files: Vec<FileEntry>,
}
