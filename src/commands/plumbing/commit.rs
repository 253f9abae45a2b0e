use crate::areas::repository::Repository;
use crate::artifacts::metadata::requests::validate_commit_message;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::config::AuthorConfig;
use crate::errors::{DepotError, DepotResult};
use chrono::{DateTime, FixedOffset};

/// A commit that was written and is now the branch tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub hash: ObjectId,
    pub date: DateTime<FixedOffset>,
}

impl Repository {
    /// Commit the staged index on top of `HEAD`.
    ///
    /// Fails with [`DepotError::NothingToCommit`] when the staged tree is
    /// the tree of the `HEAD` commit, or when nothing was ever staged.
    pub fn commit(&mut self, message: &str, author: &AuthorConfig) -> DepotResult<CommitSummary> {
        let message = validate_commit_message(message)?;

        self.index_mut().rehydrate()?;
        let parent = self.refs().read_head()?;

        if parent.is_none() && self.index().is_empty() {
            return Err(DepotError::NothingToCommit);
        }

        let tree = Tree::build(self.index().entries())?;
        let tree_id = tree.object_id()?;

        if let Some(parent) = &parent {
            let head = self
                .database()
                .parse_object_as_commit(parent)?
                .ok_or_else(|| anyhow::anyhow!("HEAD {parent} is not a commit"))?;
            if head.tree_oid() == &tree_id {
                return Err(DepotError::NothingToCommit);
            }
        }

        tree.traverse(&mut |subtree| self.database().store(subtree).map(|_| ()))?;

        let commit = Commit::new(parent, tree_id, Author::from_config(author), message);
        let commit_id = self.database().store(&commit)?;
        self.refs().update_head(&commit_id)?;

        tracing::debug!(
            root = %self.path().display(),
            commit = %commit_id.to_short_oid(),
            "commit written"
        );

        Ok(CommitSummary {
            hash: commit_id,
            date: commit.timestamp(),
        })
    }
}
