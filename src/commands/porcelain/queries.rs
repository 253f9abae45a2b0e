use crate::areas::depot::{Depot, report, run_blocking};
use crate::artifacts::metadata::commit_record::CommitRecord;
use crate::artifacts::metadata::identity::{OwnerId, RepoId};
use crate::artifacts::metadata::repository_record::RepositoryRecord;
use crate::errors::DepotResult;

impl Depot {
    /// The stored record of one repository.
    #[tracing::instrument(skip(self), fields(operation = "show"))]
    pub async fn repository(&self, repo: RepoId) -> DepotResult<RepositoryRecord> {
        let catalog = self.catalog();

        report(run_blocking(move || catalog.load(&repo)).await)
    }

    /// Every repository of `owner`, ordered by name.
    #[tracing::instrument(skip(self), fields(operation = "list"))]
    pub async fn repositories(&self, owner: OwnerId) -> DepotResult<Vec<RepositoryRecord>> {
        let catalog = self.catalog();

        report(run_blocking(move || catalog.list(&owner)).await)
    }

    /// Up to `max_entries` commits straight from version control, newest
    /// first. Useful for choosing a revert target.
    #[tracing::instrument(skip(self), fields(operation = "log"))]
    pub async fn history(&self, repo: RepoId, max_entries: usize) -> DepotResult<Vec<CommitRecord>> {
        let _guard = self.exclusive(&repo).await;
        let config = self.shared_config();
        let catalog = self.catalog();

        report(
            run_blocking(move || {
                let record = catalog.load(&repo)?;
                let repository = Depot::open_repository(&config, &record);

                let history = repository
                    .log(max_entries)?
                    .into_iter()
                    .map(CommitRecord::from)
                    .collect();

                Ok(history)
            })
            .await,
        )
    }
}
