use assert_fs::TempDir;
use bytes::Bytes;
use depot::{
    CommitOutcome, CreateRepositoryRequest, Depot, DepotError, RepositoryRecord,
    UploadFileRequest,
};
use futures::future::join_all;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::BTreeSet;

mod common;
use common::{
    OWNER, commit, commit_hash, commit_messages, create, hosted_depot, mkdir, record_paths,
    revert_request, tree_listing, upload, working_tree,
};

fn upload_request(repo: &RepositoryRecord, name: &str, content: &str) -> UploadFileRequest {
    UploadFileRequest::try_new(
        OWNER,
        &repo.id.to_string(),
        "",
        name,
        Bytes::copy_from_slice(content.as_bytes()),
    )
    .unwrap()
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_uploads_to_one_repository_are_all_recorded(hosted_depot: (TempDir, Depot)) {
    let (dir, depot) = hosted_depot;
    let repo = create(&depot, "demo").await;

    let uploads = (0..16).map(|i| {
        let depot = depot.clone();
        let request = upload_request(&repo, &format!("file-{i:02}.txt"), "payload");
        tokio::spawn(async move { depot.upload_file(request).await })
    });
    for result in join_all(uploads).await {
        result.unwrap().unwrap();
    }

    let expected = (0..16)
        .map(|i| format!("file-{i:02}.txt"))
        .collect::<Vec<_>>();
    let record = depot.repository(repo.id).await.unwrap();
    assert_eq!(record_paths(&record), expected);
    assert_eq!(
        tree_listing(&working_tree(&dir, &repo)),
        expected.into_iter().collect::<BTreeSet<_>>()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn revert_racing_an_upload_leaves_a_consistent_record(hosted_depot: (TempDir, Depot)) {
    let (dir, depot) = hosted_depot;
    let repo = create(&depot, "demo").await;
    upload(&depot, &repo, "", "a.txt", "hello").await;
    let first = commit_hash(&depot, &repo, "first").await;

    let revert = {
        let depot = depot.clone();
        let request = revert_request(&repo, &first);
        tokio::spawn(async move { depot.revert_repository(request).await })
    };
    let late_upload = {
        let depot = depot.clone();
        let request = upload_request(&repo, "late.txt", "late");
        tokio::spawn(async move { depot.upload_file(request).await })
    };
    revert.await.unwrap().unwrap();
    late_upload.await.unwrap().unwrap();

    // whichever ran first, record and working tree agree
    let record = depot.repository(repo.id).await.unwrap();
    let on_disk = tree_listing(&working_tree(&dir, &repo));
    assert_eq!(
        record_paths(&record).into_iter().collect::<BTreeSet<_>>(),
        on_disk
    );
    assert!(on_disk.contains("a.txt"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_creates_with_one_name_yield_one_repository(hosted_depot: (TempDir, Depot)) {
    let (_dir, depot) = hosted_depot;

    let creates = (0..8).map(|_| {
        let depot = depot.clone();
        tokio::spawn(async move {
            depot
                .create_repository(CreateRepositoryRequest::try_new(OWNER, "demo").unwrap())
                .await
        })
    });
    let results = join_all(creates)
        .await
        .into_iter()
        .map(|result| result.unwrap())
        .collect::<Vec<_>>();

    let created = results.iter().filter(|result| result.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|result| matches!(result, Err(DepotError::Conflict(_))))
        .count();
    assert_eq!((created, conflicts), (1, 7));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_repositories_commit_in_parallel(hosted_depot: (TempDir, Depot)) {
    let (_dir, depot) = hosted_depot;
    let mut repos = Vec::new();
    for name in ["one", "two", "three"] {
        let repo = create(&depot, name).await;
        upload(&depot, &repo, "", "a.txt", name).await;
        repos.push(repo);
    }

    let commits = repos.iter().map(|repo| {
        let depot = depot.clone();
        let repo = repo.clone();
        tokio::spawn(async move { commit_hash(&depot, &repo, "first").await })
    });
    let hashes = join_all(commits)
        .await
        .into_iter()
        .map(|result| result.unwrap())
        .collect::<BTreeSet<_>>();

    assert_eq!(hashes.len(), 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_commits_build_one_linear_history(hosted_depot: (TempDir, Depot)) {
    let (_dir, depot) = hosted_depot;
    let repo = create(&depot, "demo").await;

    let writers = (0..6).map(|i| {
        let depot = depot.clone();
        let repo = repo.clone();
        tokio::spawn(async move {
            upload(&depot, &repo, "", &format!("file-{i}.txt"), "content").await;
            commit(&depot, &repo, &format!("commit {i}")).await
        })
    });
    let committed = join_all(writers)
        .await
        .into_iter()
        .map(|result| result.unwrap())
        .filter(|outcome| matches!(outcome, CommitOutcome::Committed { .. }))
        .count();

    let record = depot.repository(repo.id).await.unwrap();
    let history = depot.history(repo.id, 100).await.unwrap();
    assert!(committed >= 1);
    assert_eq!(commit_messages(&record).len(), committed);
    assert_eq!(history.len(), committed);
    assert_eq!(record.files().count(), 6);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_mkdirs_of_one_path_record_it_once(hosted_depot: (TempDir, Depot)) {
    let (dir, depot) = hosted_depot;
    let repo = create(&depot, "demo").await;

    let makers = (0..8).map(|_| {
        let depot = depot.clone();
        let repo = repo.clone();
        tokio::spawn(async move { mkdir(&depot, &repo, "docs/guides").await })
    });
    let entries = join_all(makers)
        .await
        .into_iter()
        .map(|result| result.unwrap())
        .collect::<Vec<_>>();

    assert!(entries.windows(2).all(|pair| pair[0] == pair[1]));
    let record = depot.repository(repo.id).await.unwrap();
    assert_eq!(record_paths(&record), vec!["docs/guides"]);
    assert!(working_tree(&dir, &repo).join("docs/guides").is_dir());
}
