use crate::areas::repository::Repository;
use crate::errors::{DepotError, DepotResult};
use anyhow::Context;
use std::fs;

impl Repository {
    /// Create the version-control store at the working tree root.
    ///
    /// Running it on an initialized root changes nothing: existing refs,
    /// objects and index are kept.
    pub fn init(&mut self) -> DepotResult<()> {
        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create .git/objects directory")
            .map_err(DepotError::Storage)?;

        self.refs()
            .init_head()
            .context("Failed to create initial HEAD reference")
            .map_err(DepotError::Storage)?;

        if !self.index().path().exists() {
            self.index_mut()
                .write_updates()
                .context("Failed to create .git/index file")
                .map_err(DepotError::Storage)?;
        }

        tracing::debug!(root = %self.path().display(), "repository initialized");

        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.refs().head_path().is_file() && self.database().objects_path().is_dir()
    }
}
