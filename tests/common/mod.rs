use assert_fs::TempDir;
use bytes::Bytes;
use depot::{
    CommitOutcome, CommitRequest, CreateDirectoryRequest, CreateRepositoryRequest, Depot,
    DepotConfig, FileEntry, RepositoryRecord, RevertRequest, UploadFileRequest,
};
use rstest::fixture;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const OWNER: &str = "u1";

/// A depot rooted in a fresh temp directory; keep the `TempDir` alive.
#[fixture]
pub fn hosted_depot() -> (TempDir, Depot) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let depot = Depot::new(DepotConfig::rooted_at(dir.path()));
    (dir, depot)
}

pub async fn create(depot: &Depot, name: &str) -> RepositoryRecord {
    let request = CreateRepositoryRequest::try_new(OWNER, name).expect("valid create request");
    depot
        .create_repository(request)
        .await
        .expect("Failed to create repository")
}

pub async fn upload(depot: &Depot, repo: &RepositoryRecord, dir: &str, name: &str, content: &str) -> FileEntry {
    let request = UploadFileRequest::try_new(
        OWNER,
        &repo.id.to_string(),
        dir,
        name,
        Bytes::copy_from_slice(content.as_bytes()),
    )
    .expect("valid upload request");

    depot.upload_file(request).await.expect("Failed to upload file")
}

pub async fn mkdir(depot: &Depot, repo: &RepositoryRecord, path: &str) -> FileEntry {
    let request = CreateDirectoryRequest::try_new(OWNER, &repo.id.to_string(), path)
        .expect("valid directory request");

    depot
        .create_directory(request)
        .await
        .expect("Failed to create directory")
}

pub async fn commit(depot: &Depot, repo: &RepositoryRecord, message: &str) -> CommitOutcome {
    let request =
        CommitRequest::try_new(&repo.id.to_string(), message).expect("valid commit request");

    depot.commit_changes(request).await.expect("Failed to commit")
}

/// Hash of a commit that must have been written.
pub async fn commit_hash(depot: &Depot, repo: &RepositoryRecord, message: &str) -> String {
    match commit(depot, repo, message).await {
        CommitOutcome::Committed { hash, .. } => hash,
        CommitOutcome::NothingToCommit => panic!("expected a commit for {message:?}"),
    }
}

pub fn revert_request(repo: &RepositoryRecord, commit_ref: &str) -> RevertRequest {
    RevertRequest::try_new(&repo.id.to_string(), commit_ref).expect("valid revert request")
}

pub fn working_tree(dir: &TempDir, repo: &RepositoryRecord) -> PathBuf {
    dir.path()
        .join("repos")
        .join(repo.owner.as_ref())
        .join(repo.name.as_ref())
}

/// Files and directories under `root`, relative and `/`-separated,
/// excluding `.git`.
pub fn tree_listing(root: &Path) -> BTreeSet<String> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git")
        .map(|entry| entry.expect("Failed to walk working tree"))
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .expect("entry under root")
                .to_string_lossy()
                .replace('\\', "/");
            if entry.file_type().is_dir() {
                format!("{relative}/")
            } else {
                relative
            }
        })
        .collect()
}

pub fn record_paths(record: &RepositoryRecord) -> Vec<String> {
    record.files().map(|entry| entry.path.clone()).collect()
}

pub fn commit_messages(record: &RepositoryRecord) -> Vec<String> {
    record
        .commits()
        .iter()
        .map(|commit| commit.message.clone())
        .collect()
}
