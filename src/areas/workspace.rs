//! Working tree of one hosted repository
//!
//! Every caller-supplied path arrives as a [`RelativePath`], which already
//! guarantees containment; this area only performs the filesystem work.

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::index_entry::EntryMetadata;
use crate::artifacts::metadata::file_entry::{EntryStat, FileEntry};
use crate::artifacts::metadata::identity::{OwnerId, RepoName};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::workspace::containment::{RelativePath, VCS_DIR};
use crate::errors::{DepotError, DepotResult};
use anyhow::Context;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    /// `<base>/<owner>/<name>`; both components are validated identifiers.
    pub fn locate(base: &Path, owner: &OwnerId, name: &RepoName) -> PathBuf {
        base.join(owner.as_ref()).join(name.as_ref())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the root and any missing ancestors.
    pub fn ensure_root(&self) -> DepotResult<()> {
        std::fs::create_dir_all(&self.path)
            .with_context(|| format!("Unable to create working tree {}", self.path.display()))
            .map_err(DepotError::Storage)
    }

    /// Write `content` to `path`, creating parent directories. An existing
    /// file is replaced; an existing directory at `path` is a conflict.
    pub fn write_file(&self, path: &RelativePath, content: &[u8]) -> DepotResult<FileEntry> {
        let absolute = path.under(&self.path);
        self.check_parents(path)?;

        if absolute.is_dir() {
            return Err(DepotError::Conflict(format!(
                "{path} already exists as a directory"
            )));
        }

        if let Some(parent) = absolute.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Unable to create directory {}", parent.display()))
                .map_err(DepotError::Storage)?;
        }

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&absolute)
            .with_context(|| format!("Unable to open file {}", absolute.display()))
            .map_err(DepotError::Storage)?;
        file.write_all(content)
            .with_context(|| format!("Unable to write file {}", absolute.display()))
            .map_err(DepotError::Storage)?;

        Ok(FileEntry::from_stat(
            &path.as_posix(),
            EntryStat::file(content.len() as u64),
            chrono::Utc::now(),
        ))
    }

    /// Create `path` and its ancestors; an existing directory is fine, an
    /// existing file is a conflict.
    pub fn make_directory(&self, path: &RelativePath) -> DepotResult<FileEntry> {
        let absolute = path.under(&self.path);
        self.check_parents(path)?;

        if absolute.exists() && !absolute.is_dir() {
            return Err(DepotError::Conflict(format!("{path} already exists as a file")));
        }

        std::fs::create_dir_all(&absolute)
            .with_context(|| format!("Unable to create directory {}", absolute.display()))
            .map_err(DepotError::Storage)?;

        Ok(FileEntry::from_stat(
            &path.as_posix(),
            EntryStat::directory(),
            chrono::Utc::now(),
        ))
    }

    /// No ancestor of `path` may be an existing non-directory.
    fn check_parents(&self, path: &RelativePath) -> DepotResult<()> {
        let relative = path.to_path_buf();

        for ancestor in relative.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                continue;
            }

            let absolute = self.path.join(ancestor);
            if absolute.exists() && !absolute.is_dir() {
                return Err(DepotError::Conflict(format!(
                    "{} already exists as a file",
                    ancestor.display()
                )));
            }
        }

        Ok(())
    }

    /// Kind and size of an entry; a missing path is not found.
    pub fn stat_entry(&self, path: &Path) -> DepotResult<EntryStat> {
        let absolute = self.path.join(path);

        let metadata = match std::fs::symlink_metadata(&absolute) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(DepotError::not_found("path", path.display().to_string()));
            }
            Err(error) => return Err(error.into()),
        };

        if metadata.is_dir() {
            Ok(EntryStat::directory())
        } else {
            Ok(EntryStat::file(metadata.len()))
        }
    }

    /// Stat data recorded in the staging index.
    pub fn stat_file(&self, path: &Path) -> anyhow::Result<EntryMetadata> {
        EntryMetadata::capture(&self.path.join(path), path)
    }

    pub fn read_file(&self, path: &Path) -> anyhow::Result<Bytes> {
        let absolute = self.path.join(path);

        std::fs::read(&absolute)
            .map(Bytes::from)
            .with_context(|| format!("Unable to read file {}", absolute.display()))
    }

    /// Every regular file below the root, relative and sorted, skipping the
    /// version-control store.
    pub fn list_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.path)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_name() != VCS_DIR);

        for entry in walker {
            let entry = entry.context("Unable to walk working tree")?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.path)
                .with_context(|| format!("{} is outside the working tree", entry.path().display()))?;
            files.push(relative.to_path_buf());
        }

        Ok(files)
    }

    /// Make the tree hold exactly `snapshot`.
    ///
    /// Order matters: stray files go first, then target files are written
    /// (replacing any directory in the way), then directories left empty
    /// are pruned deepest first.
    pub fn apply_snapshot<F>(
        &self,
        snapshot: &BTreeMap<PathBuf, DatabaseEntry>,
        load_blob: F,
    ) -> anyhow::Result<()>
    where
        F: Fn(&ObjectId) -> anyhow::Result<Bytes>,
    {
        for file in self.list_files()? {
            if !snapshot.contains_key(&file) {
                let absolute = self.path.join(&file);
                std::fs::remove_file(&absolute)
                    .with_context(|| format!("Failed to remove file {}", absolute.display()))?;
            }
        }

        for (file, entry) in snapshot {
            self.write_tracked(file, entry, load_blob(&entry.oid)?)?;
        }

        self.prune_empty_directories()
    }

    fn write_tracked(&self, file: &Path, entry: &DatabaseEntry, data: Bytes) -> anyhow::Result<()> {
        let absolute = self.path.join(file);

        if absolute.is_dir() {
            std::fs::remove_dir_all(&absolute).with_context(|| {
                format!("Failed to remove existing directory {}", absolute.display())
            })?;
        }
        if let Some(parent) = absolute.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&absolute, &data)
            .with_context(|| format!("Failed to write file {}", absolute.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(entry.mode.as_u32() & 0o777);
            std::fs::set_permissions(&absolute, permissions).with_context(|| {
                format!("Failed to set permissions for file {}", absolute.display())
            })?;
        }

        Ok(())
    }

    /// Remove every directory left without entries, deepest first, so a
    /// parent emptied by its children's removal goes too.
    fn prune_empty_directories(&self) -> anyhow::Result<()> {
        let mut directories = Vec::new();
        let mut walker = WalkDir::new(&self.path).min_depth(1).into_iter();

        while let Some(entry) = walker.next() {
            let entry = entry.context("Unable to walk working tree")?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if entry.depth() == 1 && entry.file_name() == VCS_DIR {
                walker.skip_current_dir();
                continue;
            }

            directories.push((entry.depth(), entry.into_path()));
        }

        directories.sort_by(|(left, _), (right, _)| right.cmp(left));

        for (_, directory) in directories {
            let is_empty = std::fs::read_dir(&directory)
                .with_context(|| format!("Unable to read directory {}", directory.display()))?
                .next()
                .is_none();
            if is_empty {
                std::fs::remove_dir(&directory).with_context(|| {
                    format!("Failed to remove directory {}", directory.display())
                })?;
            }
        }

        Ok(())
    }
}
