mod common;

use assert_matches::assert_matches;
use tempfile::TempDir;

use common::{context, local, repo, FakeRunner, RepoBuilder, TEST_TOKEN};
use gitgrab::{
    CloneMethod, FetchReason, GitClient, GitVerb, SyncAction, SyncEngine, SyncError,
};

fn engine(runner: &FakeRunner, max_parallel: usize) -> SyncEngine<FakeRunner> {
    SyncEngine::new(GitClient::new(runner.clone()), max_parallel)
}

#[tokio::test]
async fn test_second_sync_pulls_instead_of_cloning() {
    let temp_dir = TempDir::new().unwrap();
    let runner = FakeRunner::new();
    let engine = engine(&runner, 1);
    let ctx = context(temp_dir.path(), CloneMethod::Ssh);

    let first = engine.sync_repos(vec![repo("widgets")], &ctx, |_, _, _| {}).await;
    assert_eq!(first.successful_operations, 1);
    assert_matches!(first.outcomes[0].result, Ok(SyncAction::Clone));
    assert!(local(temp_dir.path(), "widgets").is_dir());

    runner.clear();
    let second = engine.sync_repos(vec![repo("widgets")], &ctx, |_, _, _| {}).await;
    assert_matches!(second.outcomes[0].result, Ok(SyncAction::Pull));
    assert_eq!(runner.verbs(), vec!["branch", "pull"]);
}

#[tokio::test]
async fn test_off_default_branch_fetches() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir(local(temp_dir.path(), "widgets")).unwrap();

    let runner = FakeRunner::new();
    runner.set_branch("feature/x");
    let ctx = context(temp_dir.path(), CloneMethod::Ssh);

    let summary = engine(&runner, 1)
        .sync_repos(vec![repo("widgets")], &ctx, |_, _, _| {})
        .await;

    assert_matches!(
        &summary.outcomes[0].result,
        Ok(SyncAction::Fetch { reason: FetchReason::OffDefaultBranch { current } })
            if current.as_str() == "feature/x"
    );
    assert_eq!(runner.verbs(), vec!["branch", "fetch"]);
}

#[tokio::test]
async fn test_missing_default_branch_fetches_without_branch_query() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir(local(temp_dir.path(), "widgets")).unwrap();

    let runner = FakeRunner::new();
    let ctx = context(temp_dir.path(), CloneMethod::Ssh);
    let record = RepoBuilder::new("widgets").default_branch(None).build();

    let summary = engine(&runner, 1).sync_repos(vec![record], &ctx, |_, _, _| {}).await;

    assert_matches!(
        summary.outcomes[0].result,
        Ok(SyncAction::Fetch {
            reason: FetchReason::NoDefaultBranch
        })
    );
    assert_eq!(runner.verbs(), vec!["fetch"]);
}

#[tokio::test]
async fn test_clone_failure_is_isolated() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir(local(temp_dir.path(), "existing")).unwrap();

    let runner = FakeRunner::new();
    runner.fail_on("clone");
    let ctx = context(temp_dir.path(), CloneMethod::Ssh);

    let summary = engine(&runner, 1)
        .sync_repos(vec![repo("fresh"), repo("existing")], &ctx, |_, _, _| {})
        .await;

    assert_eq!(summary.total_repositories, 2);
    assert_eq!(summary.successful_operations, 1);
    assert_eq!(summary.failed_operations, 1);

    let err = summary.outcomes[0].result.as_ref().unwrap_err();
    assert_eq!(err.verb(), Some(GitVerb::Clone));
    assert_eq!(err.repository().as_str(), "fresh");
    assert_matches!(summary.outcomes[1].result, Ok(SyncAction::Pull));
}

#[tokio::test]
async fn test_existing_directory_is_never_cloned_over() {
    let temp_dir = TempDir::new().unwrap();
    let path = local(temp_dir.path(), "widgets");
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("notes.txt"), "local work").unwrap();

    let runner = FakeRunner::new();
    runner.set_branch("main");
    runner.fail_on("pull");
    let ctx = context(temp_dir.path(), CloneMethod::Ssh);

    let summary = engine(&runner, 1)
        .sync_repos(vec![repo("widgets")], &ctx, |_, _, _| {})
        .await;

    assert_eq!(summary.failed_operations, 1);
    assert!(!runner.verbs().contains(&"clone".to_string()));
    assert_eq!(
        std::fs::read_to_string(path.join("notes.txt")).unwrap(),
        "local work"
    );
}

#[tokio::test]
async fn test_duplicate_names_are_reported_not_synced() {
    let temp_dir = TempDir::new().unwrap();
    let runner = FakeRunner::new();
    let ctx = context(temp_dir.path(), CloneMethod::Ssh);

    let summary = engine(&runner, 1)
        .sync_repos(vec![repo("Widgets"), repo("widgets")], &ctx, |_, _, _| {})
        .await;

    assert_matches!(summary.outcomes[0].result, Ok(SyncAction::Clone));
    assert_matches!(
        &summary.outcomes[1].result,
        Err(SyncError::DuplicateTarget { repository, .. }) if repository.as_str() == "widgets"
    );
    assert_eq!(runner.verbs(), vec!["clone"]);
}

#[tokio::test]
async fn test_http_private_clone_embeds_token() {
    let temp_dir = TempDir::new().unwrap();
    let runner = FakeRunner::new();
    let ctx = context(temp_dir.path(), CloneMethod::Http);

    engine(&runner, 1)
        .sync_repos(
            vec![repo("public"), RepoBuilder::new("secret").private().build()],
            &ctx,
            |_, _, _| {},
        )
        .await;

    let calls = runner.calls();
    assert_eq!(calls[0][1..3], ["--", "https://github.com/acme/public.git"]);
    assert_eq!(
        calls[1][2],
        format!("https://{}@github.com/acme/secret.git", TEST_TOKEN)
    );
}

#[tokio::test]
async fn test_parallel_run_reports_in_listing_order() {
    let temp_dir = TempDir::new().unwrap();
    let runner = FakeRunner::new();
    let ctx = context(temp_dir.path(), CloneMethod::Ssh);
    let names = ["a", "b", "c", "d", "e", "f"];

    let mut seen = Vec::new();
    let summary = engine(&runner, 4)
        .sync_repos(names.iter().map(|n| repo(n)).collect(), &ctx, |i, total, o| {
            assert_eq!(total, names.len());
            seen.push((i, o.name.to_string()));
        })
        .await;

    assert_eq!(summary.successful_operations, names.len());
    let expected: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, n)| (i + 1, n.to_string()))
        .collect();
    assert_eq!(seen, expected);
    for name in names {
        assert!(local(temp_dir.path(), name).is_dir());
    }
}

#[tokio::test]
async fn test_plan_does_not_touch_anything() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir(local(temp_dir.path(), "old")).unwrap();

    let runner = FakeRunner::new();
    let ctx = context(temp_dir.path(), CloneMethod::Ssh);

    let plans = engine(&runner, 1)
        .plan_repos(vec![repo("new"), repo("old")], &ctx)
        .await;

    assert_eq!(plans[0].1, SyncAction::Clone);
    assert_eq!(plans[1].1, SyncAction::Pull);
    assert_eq!(runner.verbs(), vec!["branch"]);
    assert!(!local(temp_dir.path(), "new").exists());
}
