//! Durable store for repository records
//!
//! ## Layout
//!
//! ```text
//! <metadata>/repositories/<repo-id>.json   one record per repository
//! <metadata>/names/<owner>/<name>          name claim holding the repo id
//! ```
//!
//! Name claims are created with create-new semantics, which makes the
//! `(owner, name)` uniqueness check atomic across concurrent creates.
//! Records are replaced by writing a temp file and renaming it over the
//! old one, so a reader always sees a complete record.

use crate::artifacts::metadata::identity::{OwnerId, RepoId, RepoName};
use crate::artifacts::metadata::repository_record::RepositoryRecord;
use crate::errors::{DepotError, DepotResult};
use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Catalog {
    path: Box<Path>,
}

impl Catalog {
    pub fn new(path: Box<Path>) -> Self {
        Catalog { path }
    }

    fn records_path(&self) -> PathBuf {
        self.path.join("repositories")
    }

    fn record_path(&self, id: &RepoId) -> PathBuf {
        self.records_path().join(format!("{id}.json"))
    }

    fn owner_names_path(&self, owner: &OwnerId) -> PathBuf {
        self.path.join("names").join(owner.as_ref())
    }

    fn claim_path(&self, owner: &OwnerId, name: &RepoName) -> PathBuf {
        self.owner_names_path(owner).join(name.as_ref())
    }

    /// Reserve `(owner, name)` for `id`; a taken name is a conflict.
    pub fn claim_name(&self, owner: &OwnerId, name: &RepoName, id: &RepoId) -> DepotResult<()> {
        let claim_path = self.claim_path(owner, name);
        std::fs::create_dir_all(self.owner_names_path(owner))?;

        let claim = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&claim_path)
        {
            Ok(claim) => claim,
            Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(DepotError::Conflict(format!(
                    "repository {name} already exists for {owner}"
                )));
            }
            Err(error) => return Err(error.into()),
        };

        Self::fill_claim(&claim_path, claim, id)
    }

    /// Write the id into a freshly created claim. A claim that cannot be
    /// filled is removed again, so the name stays free.
    fn fill_claim(claim_path: &Path, mut claim: impl Write, id: &RepoId) -> DepotResult<()> {
        let written = claim
            .write_all(id.to_string().as_bytes())
            .and_then(|()| claim.flush());
        drop(claim);

        if let Err(error) = written {
            if let Err(cleanup) = std::fs::remove_file(claim_path) {
                tracing::warn!(
                    claim = %claim_path.display(),
                    error = %cleanup,
                    "unable to remove unfilled name claim"
                );
            }
            return Err(error.into());
        }

        Ok(())
    }

    pub fn release_name(&self, owner: &OwnerId, name: &RepoName) -> DepotResult<()> {
        match std::fs::remove_file(self.claim_path(owner, name)) {
            Err(error) if error.kind() != std::io::ErrorKind::NotFound => Err(error.into()),
            _ => Ok(()),
        }
    }

    /// Atomically replace the stored record.
    pub fn save(&self, record: &RepositoryRecord) -> DepotResult<()> {
        let records_path = self.records_path();
        std::fs::create_dir_all(&records_path)?;

        let record_path = self.record_path(&record.id);
        let temp_path = records_path.join(format!("tmp-{}-{}", record.id, uuid::Uuid::new_v4()));

        let content = serde_json::to_vec_pretty(record)
            .context("Unable to serialize repository record")?;

        let written = std::fs::write(&temp_path, content)
            .and_then(|_| std::fs::rename(&temp_path, &record_path))
            .with_context(|| format!("Unable to save record {}", record_path.display()));

        if let Err(error) = written {
            let _ = std::fs::remove_file(&temp_path);
            return Err(DepotError::Storage(error));
        }

        Ok(())
    }

    pub fn load(&self, id: &RepoId) -> DepotResult<RepositoryRecord> {
        let record_path = self.record_path(id);

        let content = match std::fs::read(&record_path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(DepotError::not_found("repository", id.to_string()));
            }
            Err(error) => return Err(error.into()),
        };

        let record: RepositoryRecord = serde_json::from_slice(&content)
            .with_context(|| format!("Corrupted repository record {}", record_path.display()))?;

        Ok(record)
    }

    /// Load a record on behalf of `owner`.
    ///
    /// Another owner's repository is reported as not found.
    pub fn load_owned(&self, id: &RepoId, owner: &OwnerId) -> DepotResult<RepositoryRecord> {
        let record = self.load(id)?;
        if &record.owner != owner {
            return Err(DepotError::not_found("repository", id.to_string()));
        }

        Ok(record)
    }

    /// Records of `owner`, ordered by name.
    pub fn list(&self, owner: &OwnerId) -> DepotResult<Vec<RepositoryRecord>> {
        let names_path = self.owner_names_path(owner);
        if !names_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut claims = std::fs::read_dir(&names_path)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()?;
        claims.sort();

        let mut records = Vec::with_capacity(claims.len());
        for claim in claims {
            let id = std::fs::read_to_string(&claim)?;
            let Ok(id) = RepoId::try_parse(&id) else {
                continue;
            };

            // a claim without a record belongs to a create still in flight
            match self.load(&id) {
                Ok(record) => records.push(record),
                Err(DepotError::NotFound { .. }) => continue,
                Err(error) => return Err(error),
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::metadata::file_entry::{EntryStat, FileEntry};
    use assert_fs::TempDir;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn catalog() -> (TempDir, Catalog) {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::new(dir.path().join("metadata").into_boxed_path());
        (dir, catalog)
    }

    fn record(owner: &str, name: &str) -> RepositoryRecord {
        RepositoryRecord::new(
            RepoId::generate(),
            OwnerId::try_parse(owner).unwrap(),
            RepoName::try_parse(name).unwrap(),
            Utc::now(),
        )
    }

    #[rstest]
    fn saved_record_loads_back(catalog: (TempDir, Catalog)) {
        let (_dir, catalog) = catalog;
        let mut record = record("u1", "demo");
        record
            .append_file(FileEntry::from_stat("a.txt", EntryStat::file(5), Utc::now()))
            .unwrap();
        record.append_commit_intent("first", Utc::now());

        catalog.save(&record).unwrap();

        assert_eq!(catalog.load(&record.id).unwrap(), record);
    }

    #[rstest]
    fn foreign_owner_cannot_load_record(catalog: (TempDir, Catalog)) {
        let (_dir, catalog) = catalog;
        let record = record("u1", "demo");
        catalog.save(&record).unwrap();

        let intruder = OwnerId::try_parse("u2").unwrap();

        assert!(catalog.load_owned(&record.id, &record.owner).is_ok());
        assert!(matches!(
            catalog.load_owned(&record.id, &intruder),
            Err(DepotError::NotFound { .. })
        ));
    }

    #[rstest]
    fn unknown_record_is_not_found(catalog: (TempDir, Catalog)) {
        let (_dir, catalog) = catalog;

        assert!(matches!(
            catalog.load(&RepoId::generate()),
            Err(DepotError::NotFound { what: "repository", .. })
        ));
    }

    #[rstest]
    fn second_claim_conflicts_until_released(catalog: (TempDir, Catalog)) {
        let (_dir, catalog) = catalog;
        let first = record("u1", "demo");
        let second = record("u1", "demo");

        catalog.claim_name(&first.owner, &first.name, &first.id).unwrap();
        assert!(matches!(
            catalog.claim_name(&second.owner, &second.name, &second.id),
            Err(DepotError::Conflict(_))
        ));

        catalog.release_name(&first.owner, &first.name).unwrap();
        catalog.claim_name(&second.owner, &second.name, &second.id).unwrap();
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("no space left on device"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[rstest]
    fn unfilled_claim_is_removed(catalog: (TempDir, Catalog)) {
        let (_dir, catalog) = catalog;
        let record = record("u1", "demo");
        let claim_path = catalog.claim_path(&record.owner, &record.name);
        std::fs::create_dir_all(catalog.owner_names_path(&record.owner)).unwrap();
        std::fs::write(&claim_path, b"").unwrap();

        let result = Catalog::fill_claim(&claim_path, FullDisk, &record.id);

        assert!(matches!(result, Err(DepotError::Storage(_))));
        assert!(!claim_path.exists());
        catalog.claim_name(&record.owner, &record.name, &record.id).unwrap();
    }

    #[rstest]
    fn same_name_for_different_owners_is_allowed(catalog: (TempDir, Catalog)) {
        let (_dir, catalog) = catalog;
        let mine = record("u1", "demo");
        let theirs = record("u2", "demo");

        catalog.claim_name(&mine.owner, &mine.name, &mine.id).unwrap();
        catalog.claim_name(&theirs.owner, &theirs.name, &theirs.id).unwrap();
    }

    #[rstest]
    fn list_orders_by_name_and_skips_pending_claims(catalog: (TempDir, Catalog)) {
        let (_dir, catalog) = catalog;
        for name in ["zeta", "alpha"] {
            let record = record("u1", name);
            catalog.claim_name(&record.owner, &record.name, &record.id).unwrap();
            catalog.save(&record).unwrap();
        }
        let pending = record("u1", "middle");
        catalog.claim_name(&pending.owner, &pending.name, &pending.id).unwrap();

        let names = catalog
            .list(&OwnerId::try_parse("u1").unwrap())
            .unwrap()
            .into_iter()
            .map(|record| record.name.to_string())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
