use crate::areas::depot::{Depot, report, run_blocking};
use crate::areas::workspace::Workspace;
use crate::artifacts::metadata::file_entry::FileEntry;
use crate::artifacts::metadata::requests::CreateDirectoryRequest;
use crate::errors::DepotResult;

impl Depot {
    /// Create a directory (and its parents) in the working tree.
    ///
    /// Creating a directory that already exists succeeds and leaves the
    /// record unchanged.
    #[tracing::instrument(
        skip_all,
        fields(operation = "mkdir", owner = %request.owner, repo = %request.repo_id, path = %request.path)
    )]
    pub async fn create_directory(&self, request: CreateDirectoryRequest) -> DepotResult<FileEntry> {
        let _guard = self.exclusive(&request.repo_id).await;
        let config = self.shared_config();
        let catalog = self.catalog();

        report(
            run_blocking(move || {
                let mut record = catalog.load_owned(&request.repo_id, &request.owner)?;
                let workspace =
                    Workspace::new(Depot::working_tree(&config, &record).into_boxed_path());

                let entry = workspace.make_directory(&request.path)?;
                record.append_directory(entry.clone())?;
                catalog.save(&record)?;

                tracing::info!("directory created");
                Ok(record.file(&entry.path).cloned().unwrap_or(entry))
            })
            .await,
        )
    }
}
