use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{DepotError, DepotResult};

impl Repository {
    /// Resolve a full or abbreviated commit id.
    ///
    /// Anything that does not name exactly one stored commit is not found.
    pub fn resolve_commit(&self, commit_ref: &str) -> DepotResult<ObjectId> {
        let not_found = || DepotError::not_found("commit", commit_ref);

        if !ObjectId::is_valid_prefix(commit_ref) {
            return Err(not_found());
        }

        let candidates = self.database().find_objects_by_prefix(commit_ref)?;
        let [oid] = candidates.as_slice() else {
            return Err(not_found());
        };

        match self.database().object_type(oid)? {
            ObjectType::Commit => Ok(oid.clone()),
            _ => Err(not_found()),
        }
    }

    /// Hard reset to `commit_ref`.
    ///
    /// The working tree becomes exactly the commit's tree: uncommitted
    /// changes and untracked files are discarded. The index is rebuilt from
    /// the tree and the branch moves to the commit, dropping every later
    /// commit from history.
    pub fn checkout_and_reset(&mut self, commit_ref: &str) -> DepotResult<ObjectId> {
        let target = self.resolve_commit(commit_ref)?;
        let commit = self
            .database()
            .parse_object_as_commit(&target)?
            .ok_or_else(|| DepotError::not_found("commit", commit_ref))?;

        let snapshot = self.database().flatten_tree(commit.tree_oid())?;

        let database = self.database();
        self.workspace()
            .apply_snapshot(&snapshot, |oid| {
                database
                    .parse_object_as_blob(oid)?
                    .map(|blob| blob.into_content())
                    .ok_or_else(|| anyhow::anyhow!("Object {oid} is not a blob"))
            })
            .map_err(DepotError::Storage)?;

        let mut entries = Vec::with_capacity(snapshot.len());
        for (path, entry) in snapshot {
            let stat = self
                .workspace()
                .stat_file(&path)
                .map_err(DepotError::Storage)?;
            entries.push(IndexEntry::new(path, entry.oid, stat));
        }

        let index = self.index_mut();
        index.replace(entries);
        index.write_updates()?;

        self.refs().update_head(&target)?;

        tracing::debug!(
            root = %self.path().display(),
            commit = %target.to_short_oid(),
            tree = %commit.tree_oid().to_short_oid(),
            "working tree reset"
        );

        Ok(target)
    }
}
