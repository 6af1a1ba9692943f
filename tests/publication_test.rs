//! Publication controller tests against in-memory collaborators

mod common;

use common::{modified, FakeHosting, FakeVcs};
use frizbee_action::apply::{ApplyOptions, ChangeApplier};
use frizbee_action::config::PublishSettings;
use frizbee_action::error::{FrizbeeError, PublishStep};
use frizbee_action::providers::PullRequest;
use frizbee_action::publish::{decide, PublicationController, PublishOutcome};
use frizbee_action::results::{merge, UnifiedResult};
use pretty_assertions::assert_eq;

const WORKFLOW: &str = ".github/workflows/ci.yml";

fn unified(path: &str, content: &str) -> UnifiedResult {
    merge(UnifiedResult::new(), modified(path, content))
        .unwrap()
        .result
}

#[tokio::test]
async fn test_publish_creates_pull_request_against_default_branch() {
    let vcs = FakeVcs::with_files(&[(WORKFLOW, "uses: actions/checkout@v4\n")]);
    let hosting = FakeHosting::with_default_branch("trunk");
    let settings = PublishSettings::default();

    let mut result = unified(WORKFLOW, "uses: actions/checkout@abc # v4\n");
    let report = ChangeApplier::new(&vcs)
        .apply(&result, ApplyOptions { dry_run: false })
        .unwrap();

    let controller = PublicationController::new(&vcs, &hosting, &settings);
    let outcome = controller
        .execute(decide(&result, true, false), &mut result, &report)
        .await
        .unwrap();

    assert!(matches!(outcome, Some(PublishOutcome::Created(_))));
    assert!(result.is_published());

    let state = vcs.state.lock().unwrap();
    assert_eq!(state.commits.len(), 1);
    assert_eq!(
        state.commits[0].0,
        "Update .github/workflows/ci.yml by pinning its image references"
    );
    assert_eq!(state.commits[0].1.name, "github-actions[bot]");
    assert_eq!(
        state.pushes,
        vec![("frizbee-action-patch".to_string(), true)]
    );

    let hosting_state = hosting.state.lock().unwrap();
    assert_eq!(hosting_state.created.len(), 1);
    let intent = &hosting_state.created[0];
    assert_eq!(intent.base_branch, "trunk");
    assert_eq!(intent.head_branch, "frizbee-action-patch");
    assert_eq!(intent.title, "Frizbee: Pin images and actions to commit hash");
}

#[tokio::test]
async fn test_existing_pull_request_is_not_duplicated() {
    let vcs = FakeVcs::with_files(&[(WORKFLOW, "old\n")]);
    let hosting = FakeHosting::default();
    hosting.state.lock().unwrap().open_prs.push(PullRequest {
        number: 42,
        head_ref: "frizbee-action-patch".to_string(),
        url: None,
    });
    let settings = PublishSettings::default();

    let mut result = unified(WORKFLOW, "new\n");
    let report = ChangeApplier::new(&vcs)
        .apply(&result, ApplyOptions { dry_run: false })
        .unwrap();

    let controller = PublicationController::new(&vcs, &hosting, &settings);
    let outcome = controller.publish(&mut result, &report).await.unwrap();

    assert_eq!(outcome.pull_request().number, 42);
    assert!(matches!(outcome, PublishOutcome::AlreadyOpen(_)));
    assert_eq!(hosting.calls(), vec!["list frizbee-action-patch".to_string()]);
    // The branch is still refreshed
    assert_eq!(vcs.state.lock().unwrap().pushes.len(), 1);
}

#[tokio::test]
async fn test_second_run_creates_no_second_pull_request() {
    let vcs = FakeVcs::with_files(&[(WORKFLOW, "old\n")]);
    let hosting = FakeHosting::default();
    let settings = PublishSettings::default();
    let controller = PublicationController::new(&vcs, &hosting, &settings);

    for _ in 0..2 {
        let mut result = unified(WORKFLOW, "new\n");
        let report = ChangeApplier::new(&vcs)
            .apply(&result, ApplyOptions { dry_run: false })
            .unwrap();
        controller.publish(&mut result, &report).await.unwrap();
    }

    assert_eq!(hosting.state.lock().unwrap().created.len(), 1);
    assert_eq!(vcs.state.lock().unwrap().pushes.len(), 2);
}

#[tokio::test]
async fn test_summary_message_for_several_files() {
    let vcs = FakeVcs::with_files(&[("a.yml", "a"), ("b.yml", "b")]);
    let hosting = FakeHosting::default();
    let settings = PublishSettings::default();

    let mut scan = modified("a.yml", "A");
    scan.add_modified("b.yml", "B");
    let mut result = merge(UnifiedResult::new(), scan).unwrap().result;
    let report = ChangeApplier::new(&vcs)
        .apply(&result, ApplyOptions { dry_run: false })
        .unwrap();

    PublicationController::new(&vcs, &hosting, &settings)
        .publish(&mut result, &report)
        .await
        .unwrap();

    assert_eq!(
        vcs.state.lock().unwrap().commits[0].0,
        "frizbee: pin images and actions to commit hash"
    );
}

#[tokio::test]
async fn test_push_failure_names_the_step_and_stops() {
    let vcs = FakeVcs::with_files(&[(WORKFLOW, "old\n")]);
    vcs.state.lock().unwrap().fail_push = true;
    let hosting = FakeHosting::default();
    let settings = PublishSettings::default();

    let mut result = unified(WORKFLOW, "new\n");
    let report = ChangeApplier::new(&vcs)
        .apply(&result, ApplyOptions { dry_run: false })
        .unwrap();

    let err = PublicationController::new(&vcs, &hosting, &settings)
        .publish(&mut result, &report)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FrizbeeError::Publish {
            step: PublishStep::Push,
            ..
        }
    ));
    assert!(hosting.calls().is_empty());
    assert!(!result.is_published());
}

#[tokio::test]
async fn test_create_failure_is_fatal() {
    let vcs = FakeVcs::with_files(&[(WORKFLOW, "old\n")]);
    let hosting = FakeHosting::default();
    hosting.state.lock().unwrap().fail_create = Some(422);
    let settings = PublishSettings::default();

    let mut result = unified(WORKFLOW, "new\n");
    let report = ChangeApplier::new(&vcs)
        .apply(&result, ApplyOptions { dry_run: false })
        .unwrap();

    let err = PublicationController::new(&vcs, &hosting, &settings)
        .publish(&mut result, &report)
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("Failed to create pull request"));
}

#[tokio::test]
async fn test_fail_fast_publishes_then_fails() {
    let vcs = FakeVcs::with_files(&[(WORKFLOW, "old\n")]);
    let hosting = FakeHosting::default();
    let settings = PublishSettings::default();

    let mut result = unified(WORKFLOW, "new\n");
    let report = ChangeApplier::new(&vcs)
        .apply(&result, ApplyOptions { dry_run: false })
        .unwrap();

    let err = PublicationController::new(&vcs, &hosting, &settings)
        .execute(decide(&result, true, true), &mut result, &report)
        .await
        .unwrap_err();

    assert!(err.is_unpinned_found());
    assert_eq!(hosting.state.lock().unwrap().created.len(), 1);
}

#[tokio::test]
async fn test_fail_fast_without_open_pr_touches_nothing() {
    let vcs = FakeVcs::with_files(&[(WORKFLOW, "old\n")]);
    let hosting = FakeHosting::default();
    let settings = PublishSettings::default();

    let mut result = unified(WORKFLOW, "new\n");
    let report = ChangeApplier::new(&vcs)
        .apply(&result, ApplyOptions { dry_run: true })
        .unwrap();

    let err = PublicationController::new(&vcs, &hosting, &settings)
        .execute(decide(&result, false, true), &mut result, &report)
        .await
        .unwrap_err();

    assert!(err.is_unpinned_found());
    assert_eq!(vcs.file(WORKFLOW).as_deref(), Some("old\n"));
    assert!(vcs.state.lock().unwrap().commits.is_empty());
    assert!(hosting.calls().is_empty());
}
