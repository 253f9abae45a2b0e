//! Error taxonomy for depot operations
//!
//! [`DepotError`] is what every orchestrator and engine operation returns.
//! Low-level object store code keeps using `anyhow` and is folded into
//! [`DepotError::Internal`] at the engine boundary, while working-tree and
//! catalog I/O surfaces as [`DepotError::Storage`].

use thiserror::Error;

/// Text shown to callers for failures that must not leak internal detail.
const GENERIC_FAILURE: &str = "server error";

/// Errors returned by depot operations.
#[derive(Debug, Error)]
pub enum DepotError {
    /// A repository or commit reference does not exist.
    #[error("{what} not found: {name}")]
    NotFound {
        /// Kind of thing that was looked up (`repository`, `commit`, `path`).
        what: &'static str,
        /// The identifier the caller supplied.
        name: String,
    },

    /// Duplicate repository name, or a path that exists with the other kind.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The staged tree is identical to the HEAD commit's tree.
    #[error("nothing to commit, working tree clean")]
    NothingToCommit,

    /// Disk I/O failure or a path escaping the repository root.
    #[error("storage failure: {0:#}")]
    Storage(anyhow::Error),

    /// Input rejected at the boundary (bad names, empty messages).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unexpected failure in any dependency.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type DepotResult<T> = Result<T, DepotError>;

impl DepotError {
    pub fn not_found(what: &'static str, name: impl Into<String>) -> Self {
        DepotError::NotFound {
            what,
            name: name.into(),
        }
    }

    pub fn storage(message: impl std::fmt::Display) -> Self {
        DepotError::Storage(anyhow::anyhow!("{message}"))
    }

    /// Message safe to hand back to the caller.
    ///
    /// Only not-found, conflict and invalid-request failures carry detail;
    /// storage and internal failures collapse to a generic message so that
    /// on-disk paths never reach the caller.
    pub fn public_message(&self) -> String {
        match self {
            DepotError::NotFound { .. }
            | DepotError::Conflict(_)
            | DepotError::InvalidRequest(_)
            | DepotError::NothingToCommit => self.to_string(),
            DepotError::Storage(_) | DepotError::Internal(_) => GENERIC_FAILURE.to_string(),
        }
    }

    /// Whether the failure was caused by the caller rather than the server.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            DepotError::NotFound { .. }
                | DepotError::Conflict(_)
                | DepotError::InvalidRequest(_)
                | DepotError::NothingToCommit
        )
    }
}

impl From<std::io::Error> for DepotError {
    fn from(error: std::io::Error) -> Self {
        DepotError::Storage(error.into())
    }
}
