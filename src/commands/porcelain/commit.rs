use crate::areas::depot::{Depot, report, run_blocking};
use crate::artifacts::metadata::requests::{CommitOutcome, CommitRequest};
use crate::errors::{DepotError, DepotResult};
use chrono::Utc;

impl Depot {
    /// Stage the whole working tree and commit it.
    ///
    /// A tree identical to the last commit is not an error: the outcome is
    /// [`CommitOutcome::NothingToCommit`] and no commit is recorded.
    #[tracing::instrument(
        skip_all,
        fields(operation = "commit", repo = %request.repo_id, owner = tracing::field::Empty)
    )]
    pub async fn commit_changes(&self, request: CommitRequest) -> DepotResult<CommitOutcome> {
        let _guard = self.exclusive(&request.repo_id).await;
        let config = self.shared_config();
        let catalog = self.catalog();

        report(
            run_blocking(move || {
                let mut record = catalog.load(&request.repo_id)?;
                tracing::Span::current().record("owner", tracing::field::display(&record.owner));

                let mut repository = Depot::open_repository(&config, &record);
                repository.stage_all()?;

                let summary = match repository.commit(&request.message, &config.author) {
                    Ok(summary) => summary,
                    Err(DepotError::NothingToCommit) => {
                        tracing::info!("nothing to commit");
                        return Ok(CommitOutcome::NothingToCommit);
                    }
                    Err(error) => return Err(error),
                };

                let date = summary.date.with_timezone(&Utc);
                record.append_commit_intent(request.message, date);
                catalog.save(&record)?;

                tracing::info!(commit = %summary.hash, "changes committed");
                Ok(CommitOutcome::Committed {
                    hash: summary.hash.to_string(),
                    date,
                })
            })
            .await,
        )
    }
}
