use crate::areas::depot::{Depot, report, run_blocking};
use crate::areas::workspace::Workspace;
use crate::artifacts::metadata::file_entry::FileEntry;
use crate::artifacts::metadata::requests::UploadFileRequest;
use crate::errors::DepotResult;

impl Depot {
    /// Write an uploaded file into the working tree and record it.
    ///
    /// The bytes reach the disk before the record is saved. An upload to a
    /// path that already holds a file overwrites it.
    #[tracing::instrument(
        skip_all,
        fields(
            operation = "upload",
            owner = %request.owner,
            repo = %request.repo_id,
            path = %request.path,
            size = request.content.len(),
        )
    )]
    pub async fn upload_file(&self, request: UploadFileRequest) -> DepotResult<FileEntry> {
        let _guard = self.exclusive(&request.repo_id).await;
        let config = self.shared_config();
        let catalog = self.catalog();

        report(
            run_blocking(move || {
                let mut record = catalog.load_owned(&request.repo_id, &request.owner)?;
                let workspace =
                    Workspace::new(Depot::working_tree(&config, &record).into_boxed_path());

                let entry = workspace.write_file(&request.path, &request.content)?;
                record.append_file(entry.clone())?;
                catalog.save(&record)?;

                tracing::info!("file uploaded");
                Ok(entry)
            })
            .await,
        )
    }
}
