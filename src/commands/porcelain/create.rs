use crate::areas::catalog::Catalog;
use crate::areas::depot::{Depot, report, run_blocking};
use crate::artifacts::metadata::identity::RepoId;
use crate::artifacts::metadata::repository_record::RepositoryRecord;
use crate::artifacts::metadata::requests::CreateRepositoryRequest;
use crate::config::DepotConfig;
use crate::errors::DepotResult;
use chrono::Utc;

impl Depot {
    /// Create an empty repository for `owner`.
    ///
    /// The `(owner, name)` pair is claimed first; a second repository with
    /// the same name is a conflict. If any later step fails the claim is
    /// released so the name can be retried.
    #[tracing::instrument(
        skip_all,
        fields(operation = "create", owner = %request.owner, name = %request.name, repo = tracing::field::Empty)
    )]
    pub async fn create_repository(
        &self,
        request: CreateRepositoryRequest,
    ) -> DepotResult<RepositoryRecord> {
        let id = RepoId::generate();
        tracing::Span::current().record("repo", tracing::field::display(&id));

        let _guard = self.exclusive(&id).await;
        let config = self.shared_config();
        let catalog = self.catalog();

        report(
            run_blocking(move || {
                let CreateRepositoryRequest { owner, name } = request;
                catalog.claim_name(&owner, &name, &id)?;

                let record = RepositoryRecord::new(id, owner, name, Utc::now());
                if let Err(error) = provision(&config, &catalog, &record) {
                    if let Err(release_error) = catalog.release_name(&record.owner, &record.name) {
                        tracing::warn!(error = %release_error, "unable to release name claim");
                    }
                    return Err(error);
                }

                tracing::info!("repository created");
                Ok(record)
            })
            .await,
        )
    }
}

/// Working tree, version control and the first persisted record.
fn provision(config: &DepotConfig, catalog: &Catalog, record: &RepositoryRecord) -> DepotResult<()> {
    let mut repository = Depot::open_repository(config, record);

    repository.workspace().ensure_root()?;
    repository.init()?;
    catalog.save(record)
}
