//! References: `HEAD` and the branch it points to
//!
//! Hosted repositories keep one branch. `HEAD` is the symbolic reference
//! `ref: refs/heads/master`; the branch file holds the tip commit id, or
//! nothing before the first commit.
//!
//! ## File Format
//!
//! A ref file contains either a 40-character object id or
//! `ref: <path>` for symbolic references.

use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// Branch every hosted repository commits to
pub const DEFAULT_BRANCH: &str = "refs/heads/master";

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (refs/[A-Za-z0-9._/-]+)$";

#[derive(Debug, Clone, PartialEq)]
enum SymRefOrOid {
    SymRef(String),
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read(path: &Path) -> anyhow::Result<Option<SymRefOrOid>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ref file at {}", path.display()))?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        match regex::Regex::new(SYMREF_REGEX)?.captures(content) {
            Some(symref) => Ok(Some(SymRefOrOid::SymRef(symref[1].to_string()))),
            None => Ok(Some(SymRefOrOid::Oid(ObjectId::try_parse(
                content.to_string(),
            )?))),
        }
    }
}

#[derive(Debug, new)]
pub struct Refs {
    /// Path to the `.git` directory
    path: Box<Path>,
}

impl Refs {
    pub fn head_path(&self) -> PathBuf {
        self.path.join(HEAD_REF_NAME)
    }

    fn heads_path(&self) -> PathBuf {
        self.path.join("refs").join("heads")
    }

    /// Point `HEAD` at the default branch and create the empty branch file.
    ///
    /// Existing refs are left untouched.
    pub fn init_head(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(self.heads_path())
            .with_context(|| format!("failed to create {}", self.heads_path().display()))?;

        if !self.head_path().exists() {
            self.update_ref_file(&self.head_path(), &format!("ref: {DEFAULT_BRANCH}\n"))?;
        }

        let branch_path = self.path.join(DEFAULT_BRANCH);
        if !branch_path.exists() {
            self.update_ref_file(&branch_path, "")?;
        }

        Ok(())
    }

    /// Commit id `HEAD` resolves to, following symbolic refs.
    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.read_symref(&self.head_path())
    }

    /// Move whatever `HEAD` resolves to (the branch, when attached).
    pub fn update_head(&self, oid: &ObjectId) -> anyhow::Result<()> {
        let target = self.resolve_target(&self.head_path())?;
        self.update_ref_file(&target, &format!("{oid}\n"))
    }

    /// The file that ends the symbolic chain starting at `path`.
    fn resolve_target(&self, path: &Path) -> anyhow::Result<PathBuf> {
        match SymRefOrOid::read(path)? {
            Some(SymRefOrOid::SymRef(target)) => self.resolve_target(&self.path.join(target)),
            Some(SymRefOrOid::Oid(_)) | None => Ok(path.to_path_buf()),
        }
    }

    fn read_symref(&self, path: &Path) -> anyhow::Result<Option<ObjectId>> {
        match SymRefOrOid::read(path)? {
            Some(SymRefOrOid::SymRef(target)) => self.read_symref(&self.path.join(target)),
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            None => Ok(None),
        }
    }

    fn update_ref_file(&self, path: &Path, raw_ref: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(path.parent().with_context(|| {
            format!("failed to create parent directories for {}", path.display())
        })?)?;

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("failed to open ref file at {}", path.display()))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(raw_ref.as_bytes())?;

        Ok(())
    }
}
