use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::blob::Blob;
use crate::errors::{DepotError, DepotResult};

impl Repository {
    /// Stage every file in the working tree.
    ///
    /// The index ends up holding exactly the files present on disk, so
    /// deletions are staged too. Empty directories are not tracked.
    pub fn stage_all(&mut self) -> DepotResult<()> {
        let files = self
            .workspace()
            .list_files()
            .map_err(DepotError::Storage)?;

        let mut entries = Vec::with_capacity(files.len());
        for path in files {
            let data = self
                .workspace()
                .read_file(&path)
                .map_err(DepotError::Storage)?;
            let stat = self
                .workspace()
                .stat_file(&path)
                .map_err(DepotError::Storage)?;

            let blob_id = self.database().store(&Blob::new(data))?;
            entries.push(IndexEntry::new(path, blob_id, stat));
        }

        let index = self.index_mut();
        index.replace(entries);
        index.write_updates()?;

        tracing::debug!(
            root = %self.path().display(),
            staged = self.index().entries().count(),
            "working tree staged"
        );

        Ok(())
    }
}
