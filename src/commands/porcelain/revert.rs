use crate::areas::depot::{Depot, report, run_blocking};
use crate::artifacts::metadata::commit_record::CommitRecord;
use crate::artifacts::metadata::requests::{RevertOutcome, RevertRequest};
use crate::errors::DepotResult;
use chrono::Utc;
use std::path::Path;

impl Depot {
    /// Reset a repository to an earlier commit and rebuild its record.
    ///
    /// Destructive: uncommitted changes, untracked files and every commit
    /// after the target are gone afterwards. The record's files and commits
    /// are replaced from the working tree and history, so entries left
    /// behind by earlier failures disappear too.
    #[tracing::instrument(
        skip_all,
        fields(operation = "revert", repo = %request.repo_id, target = %request.commit_ref, owner = tracing::field::Empty)
    )]
    pub async fn revert_repository(&self, request: RevertRequest) -> DepotResult<RevertOutcome> {
        let _guard = self.exclusive(&request.repo_id).await;
        let config = self.shared_config();
        let catalog = self.catalog();

        report(
            run_blocking(move || {
                let mut record = catalog.load(&request.repo_id)?;
                tracing::Span::current().record("owner", tracing::field::display(&record.owner));

                let mut repository = Depot::open_repository(&config, &record);
                let target = repository.checkout_and_reset(&request.commit_ref)?;

                let history = repository
                    .log(config.history.log_depth)?
                    .into_iter()
                    .map(CommitRecord::from)
                    .collect::<Vec<_>>();
                let tracked = repository.list_tracked_paths()?;

                let workspace = repository.workspace();
                record.reconcile_from_authoritative(
                    &tracked,
                    |path| workspace.stat_entry(Path::new(path)),
                    history,
                    Utc::now(),
                )?;
                catalog.save(&record)?;

                tracing::info!(
                    commit = %target,
                    files = tracked.len(),
                    commits = record.commits().len(),
                    "repository reverted"
                );

                Ok(RevertOutcome {
                    commits: record.commits().to_vec(),
                    files: record.files().cloned().collect(),
                })
            })
            .await,
        )
    }
}
