//! Multi-tenant repository hosting
//!
//! Every hosted repository is a working tree on disk with its own
//! git-compatible object store, plus a metadata record in the catalog.
//! [`Depot`] is the entry point; its operations keep the three in step.

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod config;
pub mod errors;
pub mod telemetry;

pub use areas::depot::Depot;
pub use artifacts::metadata::commit_record::CommitRecord;
pub use artifacts::metadata::file_entry::{EntryKind, FileEntry};
pub use artifacts::metadata::identity::{OwnerId, RepoId, RepoName};
pub use artifacts::metadata::repository_record::RepositoryRecord;
pub use artifacts::metadata::requests::{
    CommitOutcome, CommitRequest, CreateDirectoryRequest, CreateRepositoryRequest, RevertOutcome,
    RevertRequest, UploadFileRequest,
};
pub use config::DepotConfig;
pub use errors::{DepotError, DepotResult};
