mod common;

use std::sync::Arc;
use std::time::Duration;

use common::MockHttpClient;
use flowcheck_core::{Environment, FailurePolicy, Flow, FlowEdge, FlowStep, StepRef};
use flowcheck_exec::executor::{ExecutorConfig, HttpError, NoOpEventSink};
use flowcheck_exec::history::ReplayError;
use flowcheck_exec::{FlowService, ServiceError};
use flowcheck_store::{DiffKind, InMemoryStore, RunStatus, StateStore};
use serde_json::json;

async fn setup() -> (Arc<MockHttpClient>, Arc<InMemoryStore>, FlowService) {
    let http = Arc::new(
        MockHttpClient::new()
            .route("POST", "/login", 200, r#"{"token":"t-1"}"#)
            .route("GET", "/me", 200, r#"{"name":"alice","tags":["a","b"]}"#),
    );
    let store = Arc::new(InMemoryStore::new());
    store
        .save_flow(&Flow {
            flow_id: "auth".to_string(),
            name: Some("login and profile".to_string()),
            description: None,
            failure_policy: None,
            steps: vec![
                FlowStep::new("login", "POST", "/login")
                    .body(json!({"user": "{{ username }}"}))
                    .capture("token", "body.token"),
                FlowStep::new("me", "GET", "/me")
                    .header("Authorization", "Bearer {{ token }}")
                    .assert("status == 200"),
            ],
            edges: vec![FlowEdge::new("login", "me")],
        })
        .await
        .unwrap();
    store
        .save_environment(
            &Environment::new("staging", "http://api.test").with_variable("username", "alice"),
        )
        .await
        .unwrap();

    let service = FlowService::new(
        ExecutorConfig::default(),
        store.clone(),
        http.clone(),
        Arc::new(NoOpEventSink),
    );
    (http, store, service)
}

#[tokio::test]
async fn run_flow_saves_the_run_with_an_ordinal() {
    let (_http, store, service) = setup().await;

    let first = service.run_flow("auth", "staging", None).await.unwrap();
    let second = service
        .run_flow("auth", "staging", Some(FailurePolicy::Continue))
        .await
        .unwrap();

    assert_eq!(first.status, RunStatus::Passed);
    assert_eq!(first.ordinal, Some(1));
    assert_eq!(second.ordinal, Some(2));
    assert_eq!(second.failure_policy, FailurePolicy::Continue);
    assert_eq!(store.run_count().await, 2);

    let runs = store.list_runs("auth", 10).await.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].run_id, second.run_id);
}

#[tokio::test]
async fn missing_definitions_are_reported() {
    let (_http, _store, service) = setup().await;

    let err = service.run_flow("nope", "staging", None).await.unwrap_err();
    assert!(matches!(err, ServiceError::FlowNotFound(id) if id == "nope"));

    let err = service.run_flow("auth", "prod", None).await.unwrap_err();
    assert!(matches!(err, ServiceError::EnvironmentNotFound(id) if id == "prod"));
}

#[tokio::test]
async fn replay_against_unchanged_backend_reports_no_changes() {
    let (http, _store, service) = setup().await;
    service.run_flow("auth", "staging", None).await.unwrap();

    let diff = service.replay_step(&StepRef::new("auth", "me")).await.unwrap();
    assert!(!diff.has_changes());
    assert_eq!(diff.count(DiffKind::Added), 0);
    assert_eq!(diff.count(DiffKind::Removed), 0);
    assert_eq!(diff.count(DiffKind::Changed), 0);
    assert!(diff.fields.iter().any(|f| f.path == "status"));

    // Replayed verbatim, including the header interpolated during the run.
    let replayed = http.requests().into_iter().filter(|r| r.url.path() == "/me").last().unwrap();
    assert_eq!(
        replayed.headers.get("Authorization").map(String::as_str),
        Some("Bearer t-1")
    );
}

#[tokio::test]
async fn replay_reports_backend_changes() {
    let (http, store, service) = setup().await;
    let run = service.run_flow("auth", "staging", None).await.unwrap();

    http.set_route("GET", "/me", 200, r#"{"name":"bob","tags":["a"],"admin":true}"#);
    let outcome = service
        .replay_step_and_save(&StepRef::new("auth", "me"))
        .await
        .unwrap();

    assert_eq!(outcome.baseline.run_id, run.run_id);
    let diff = &outcome.diff;
    assert!(diff.has_changes());
    let changed: Vec<_> = diff.changes().map(|f| (f.path.as_str(), f.kind)).collect();
    assert!(changed.contains(&("body.name", DiffKind::Changed)));
    assert!(changed.contains(&("body.admin", DiffKind::Added)));
    assert!(changed.contains(&("body.tags", DiffKind::Changed)));

    let saved = store.diffs().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].diff_id, diff.diff_id);
}

#[tokio::test]
async fn replay_enforces_the_step_timeout() {
    let (http, store, service) = setup().await;
    let mut flow = store.load_flow("auth").await.unwrap().unwrap();
    flow.steps[1].timeout_ms = Some(50);
    store.save_flow(&flow).await.unwrap();
    service.run_flow("auth", "staging", None).await.unwrap();

    http.set_route_delayed("GET", "/me", 200, "{}", Duration::from_secs(5));
    let err = service
        .replay_step(&StepRef::new("auth", "me"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Replay(ReplayError::Http(HttpError::Timeout))
    ));
}

#[tokio::test]
async fn replay_without_history_fails() {
    let (_http, _store, service) = setup().await;
    let err = service
        .replay_step(&StepRef::new("auth", "me"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Replay(ReplayError::NoHistory(_))));
}

#[tokio::test]
async fn replay_uses_the_latest_attempted_result() {
    let (http, _store, service) = setup().await;
    service.run_flow("auth", "staging", None).await.unwrap();

    // Second run: login fails its capture, so `me` is still sent but with an
    // unexpanded token.
    http.set_route("POST", "/login", 200, "{}");
    let latest = service.run_flow("auth", "staging", None).await.unwrap();
    assert_eq!(latest.status, RunStatus::Passed);

    service.replay_step(&StepRef::new("auth", "me")).await.unwrap();
    let replayed = http.requests().into_iter().filter(|r| r.url.path() == "/me").last().unwrap();
    assert_eq!(
        replayed.headers.get("Authorization").map(String::as_str),
        Some("Bearer {{ token }}")
    );
}
