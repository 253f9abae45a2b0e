use crate::areas::repository::Repository;
use crate::errors::DepotResult;
use std::collections::BTreeSet;

impl Repository {
    /// Every file path in the `HEAD` tree, recursively, `/`-separated.
    ///
    /// Directories are implied by their files. A repository without
    /// commits tracks nothing.
    pub fn list_tracked_paths(&self) -> DepotResult<BTreeSet<String>> {
        let Some(head) = self.refs().read_head()? else {
            return Ok(BTreeSet::new());
        };

        let commit = self
            .database()
            .parse_object_as_commit(&head)?
            .ok_or_else(|| anyhow::anyhow!("HEAD {head} is not a commit"))?;

        let paths = self
            .database()
            .flatten_tree(commit.tree_oid())?
            .into_keys()
            .map(|path| {
                path.to_str()
                    .map(|path| path.replace(std::path::MAIN_SEPARATOR, "/"))
                    .ok_or_else(|| anyhow::anyhow!("Tracked path {} is not UTF-8", path.display()))
            })
            .collect::<anyhow::Result<BTreeSet<_>>>()?;

        Ok(paths)
    }
}
