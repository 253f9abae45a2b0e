//! Repository orchestrator
//!
//! [`Depot`] ties the working trees, their version-control repositories and
//! the metadata catalog together. The operations themselves live in
//! `commands::porcelain`; this module holds the shared state they run on and
//! the per-repository locking.

use crate::areas::catalog::Catalog;
use crate::areas::repository::Repository;
use crate::areas::workspace::Workspace;
use crate::artifacts::metadata::identity::RepoId;
use crate::artifacts::metadata::repository_record::RepositoryRecord;
use crate::config::DepotConfig;
use crate::errors::DepotResult;
use anyhow::Context;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

/// Hosting backend for many repositories of many owners.
///
/// Cheap to clone; clones share configuration, catalog and locks.
#[derive(Debug, Clone)]
pub struct Depot {
    config: Arc<DepotConfig>,
    catalog: Arc<Catalog>,
    locks: Arc<RepoLocks>,
}

impl Depot {
    pub fn new(config: DepotConfig) -> Self {
        let catalog = Catalog::new(config.storage.metadata.clone().into_boxed_path());

        Depot {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            locks: Arc::new(RepoLocks::default()),
        }
    }

    pub fn config(&self) -> &DepotConfig {
        &self.config
    }

    pub(crate) fn shared_config(&self) -> Arc<DepotConfig> {
        Arc::clone(&self.config)
    }

    pub(crate) fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    /// Wait for exclusive access to one repository.
    ///
    /// Operations on other repositories are not blocked.
    pub(crate) async fn exclusive(&self, id: &RepoId) -> RepoGuard {
        RepoLocks::acquire(&self.locks, id).await
    }

    /// Working tree location of a catalogued repository.
    pub(crate) fn working_tree(config: &DepotConfig, record: &RepositoryRecord) -> PathBuf {
        Workspace::locate(&config.storage.base, &record.owner, &record.name)
    }

    /// Version-control repository of a catalogued repository.
    pub(crate) fn open_repository(config: &DepotConfig, record: &RepositoryRecord) -> Repository {
        Repository::new(&Self::working_tree(config, record))
    }
}

/// Run blocking filesystem work off the async runtime.
pub(crate) async fn run_blocking<T, F>(work: F) -> DepotResult<T>
where
    F: FnOnce() -> DepotResult<T> + Send + 'static,
    T: Send + 'static,
{
    let span = tracing::Span::current();

    tokio::task::spawn_blocking(move || span.in_scope(work))
        .await
        .context("blocking task panicked")?
}

/// Log a failed operation before it is handed back to the caller.
///
/// Caller mistakes are warnings; everything else is an error.
pub(crate) fn report<T>(result: DepotResult<T>) -> DepotResult<T> {
    if let Err(error) = &result {
        if error.is_caller_error() {
            tracing::warn!(%error, "operation rejected");
        } else {
            tracing::error!(error = %format_args!("{error:#}"), "operation failed");
        }
    }

    result
}

/// One async mutex per repository id, created on first use and dropped
/// again once nobody holds or waits for it.
#[derive(Debug, Default)]
struct RepoLocks {
    locks: Mutex<HashMap<RepoId, Arc<tokio::sync::Mutex<()>>>>,
}

impl RepoLocks {
    async fn acquire(this: &Arc<Self>, id: &RepoId) -> RepoGuard {
        let lease = {
            let mut locks = this.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Lease {
                id: *id,
                locks: Arc::clone(this),
                mutex: Arc::clone(locks.entry(*id).or_default()),
            }
        };
        let guard = Arc::clone(&lease.mutex).lock_owned().await;

        RepoGuard {
            _guard: guard,
            _lease: lease,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Exclusive access to one repository until dropped.
#[derive(Debug)]
pub(crate) struct RepoGuard {
    // Fields drop in order: the mutex is released before the lease is.
    _guard: OwnedMutexGuard<()>,
    _lease: Lease,
}

/// Interest in one repository's mutex, held while waiting and while locked.
#[derive(Debug)]
struct Lease {
    id: RepoId,
    locks: Arc<RepoLocks>,
    mutex: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut locks = self.locks.locks.lock().unwrap_or_else(PoisonError::into_inner);

        // The map and this lease are the only owners left.
        if Arc::strong_count(&self.mutex) == 2 {
            locks.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::metadata::requests::CommitRequest;
    use crate::errors::DepotError;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[tokio::test]
    async fn same_repository_is_serialized() {
        let locks = Arc::new(RepoLocks::default());
        let id = RepoId::generate();

        let _guard = RepoLocks::acquire(&locks, &id).await;
        let second =
            tokio::time::timeout(Duration::from_millis(50), RepoLocks::acquire(&locks, &id)).await;

        assert!(second.is_err());
    }

    #[tokio::test]
    async fn different_repositories_do_not_block() {
        let locks = Arc::new(RepoLocks::default());

        let _first = RepoLocks::acquire(&locks, &RepoId::generate()).await;
        let second = tokio::time::timeout(
            Duration::from_millis(50),
            RepoLocks::acquire(&locks, &RepoId::generate()),
        )
        .await;

        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn released_locks_leave_no_entries() {
        let locks = Arc::new(RepoLocks::default());
        let id = RepoId::generate();

        let first = RepoLocks::acquire(&locks, &id).await;
        let waiter = tokio::spawn({
            let locks = Arc::clone(&locks);
            async move { RepoLocks::acquire(&locks, &id).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        assert_eq!(locks.len(), 1);

        drop(waiter.await.unwrap());
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn abandoned_wait_leaves_no_entry() {
        let locks = Arc::new(RepoLocks::default());
        let id = RepoId::generate();

        let held = RepoLocks::acquire(&locks, &id).await;
        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), RepoLocks::acquire(&locks, &id)).await;
        assert!(timed_out.is_err());

        drop(held);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn operations_on_unknown_repositories_leave_no_locks() {
        let dir = assert_fs::TempDir::new().unwrap();
        let depot = Depot::new(DepotConfig::rooted_at(dir.path()));

        for _ in 0..100 {
            let request =
                CommitRequest::try_new(&RepoId::generate().to_string(), "message").unwrap();
            let result = depot.commit_changes(request).await;
            assert!(matches!(result, Err(DepotError::NotFound { .. })));
        }

        assert_eq!(depot.locks.len(), 0);
    }

    #[tokio::test]
    async fn panicking_work_is_internal() {
        let result: DepotResult<()> = run_blocking(|| panic!("boom")).await;

        assert!(matches!(result, Err(DepotError::Internal(_))));
    }
}
