//! HTTP tests against a mock Pages backend

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use deploy_pages::app::options::{
    Credentials, DeployOptions, DeploymentTarget, Endpoints, PollConfig,
};
use deploy_pages::app::run::run;
use deploy_pages::deploy::PollOutcome;
use deploy_pages::errors::DeployError;
use deploy_pages::http::client::HttpClient;
use deploy_pages::http::pages::{PagesApi, PagesClient};
use deploy_pages::report::RecordingReporter;
use secrecy::SecretString;
use serde_json::{json, Value};
use tokio::net::TcpListener;

const REPOSITORY: &str = "actions/is-awesome";
const BUILD_VERSION: &str = "valid-build-version";

/// Request seen by the mock backend
#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    query: Option<String>,
    authorization: Option<String>,
    headers: HeaderMap,
    body: String,
}

type Reply = (u16, Value);

/// Scripted Pages backend
struct MockPages {
    base: String,
    manifest: Mutex<Reply>,
    create: Mutex<Reply>,
    statuses: Mutex<VecDeque<Reply>>,
    cancel: Mutex<Reply>,
    requests: Mutex<Vec<Recorded>>,
}

impl MockPages {
    fn new(base: String) -> Self {
        let status_url = format!(
            "{}/repos/{}/pages/deployments/{}",
            base, REPOSITORY, BUILD_VERSION
        );
        Self {
            manifest: Mutex::new((
                200,
                json!({
                    "count": 2,
                    "value": [
                        { "name": "another-artifact", "url": "https://another-artifact.com" },
                        { "name": "github-pages", "url": "https://fake-artifact.com?x=1", "size": "1024" }
                    ]
                }),
            )),
            create: Mutex::new((
                200,
                json!({
                    "status_url": status_url,
                    "page_url": "https://actions.github.io/is-awesome",
                    "preview_url": null
                }),
            )),
            statuses: Mutex::new(VecDeque::new()),
            cancel: Mutex::new((200, json!({}))),
            requests: Mutex::new(Vec::new()),
            base,
        }
    }

    fn requests_to(&self, suffix: &str) -> Vec<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path.ends_with(suffix))
            .cloned()
            .collect()
    }

    fn record(&self, method: Method, uri: &Uri, headers: &HeaderMap, body: String) {
        self.requests.lock().unwrap().push(Recorded {
            method,
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            headers: headers.clone(),
            body,
        });
    }
}

fn respond((status, body): Reply) -> (StatusCode, Json<Value>) {
    (StatusCode::from_u16(status).unwrap(), Json(body))
}

async fn artifacts_handler(
    State(mock): State<Arc<MockPages>>,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    mock.record(Method::GET, &uri, &headers, String::new());
    respond(mock.manifest.lock().unwrap().clone())
}

async fn create_handler(
    State(mock): State<Arc<MockPages>>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    mock.record(Method::POST, &uri, &headers, body);
    respond(mock.create.lock().unwrap().clone())
}

async fn status_handler(
    State(mock): State<Arc<MockPages>>,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    mock.record(Method::GET, &uri, &headers, String::new());
    let reply = mock
        .statuses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| (200, json!({ "status": "deployment_in_progress" })));
    respond(reply)
}

async fn cancel_handler(
    State(mock): State<Arc<MockPages>>,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    mock.record(Method::POST, &uri, &headers, String::new());
    respond(mock.cancel.lock().unwrap().clone())
}

/// Start the mock backend on an ephemeral port
async fn start_mock() -> Arc<MockPages> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let mock = Arc::new(MockPages::new(base));

    let app = Router::new()
        .route(
            "/_apis/pipelines/workflows/{run_id}/artifacts",
            get(artifacts_handler),
        )
        .route(
            "/repos/{owner}/{repo}/pages/deployments",
            post(create_handler),
        )
        .route(
            "/repos/{owner}/{repo}/pages/deployments/{id}",
            get(status_handler),
        )
        .route(
            "/repos/{owner}/{repo}/pages/deployments/{id}/cancel",
            post(cancel_handler),
        )
        .with_state(mock.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    mock
}

fn options(mock: &MockPages, poll: PollConfig) -> DeployOptions {
    DeployOptions {
        target: DeploymentTarget {
            build_version: BUILD_VERSION.to_string(),
            repository: REPOSITORY.to_string(),
            run_id: "123".to_string(),
            server_url: "https://github.com".to_string(),
            preview: false,
        },
        poll,
        endpoints: Endpoints {
            api_url: mock.base.clone(),
            runtime_url: format!("{}/", mock.base),
        },
        credentials: Credentials {
            token: SecretString::from("gha-token".to_string()),
            runtime_token: SecretString::from("runtime-token".to_string()),
            oidc_token: Some(SecretString::from("oidc-token".to_string())),
        },
        output_file: None,
    }
}

fn fast_poll() -> PollConfig {
    PollConfig {
        reporting_interval: Duration::from_millis(10),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_run_against_mock_backend() {
    let mock = start_mock().await;
    mock.statuses
        .lock()
        .unwrap()
        .push_back((200, json!({ "status": "succeed" })));
    let reporter = Arc::new(RecordingReporter::new());

    let outcome = run(options(&mock, fast_poll()), reporter.clone())
        .await
        .unwrap();
    assert_eq!(outcome, PollOutcome::Succeeded("succeed".to_string()));

    // Artifact manifest
    let manifest = mock.requests_to("/artifacts");
    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest[0].path, "/_apis/pipelines/workflows/123/artifacts");
    assert_eq!(manifest[0].query.as_deref(), Some("api-version=6.0-preview"));
    assert_eq!(
        manifest[0].authorization.as_deref(),
        Some("Bearer runtime-token")
    );

    // Deployment creation
    let create = mock.requests_to("/pages/deployments");
    assert_eq!(create.len(), 1);
    assert_eq!(create[0].path, "/repos/actions/is-awesome/pages/deployments");
    assert_eq!(create[0].authorization.as_deref(), Some("Bearer gha-token"));
    assert_eq!(
        create[0]
            .headers
            .get("x-github-api-version")
            .and_then(|v| v.to_str().ok()),
        Some("2022-11-28")
    );
    let body: Value = serde_json::from_str(&create[0].body).unwrap();
    let keys: Vec<&str> = body
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["artifact_url", "oidc_token", "pages_build_version"]);
    assert_eq!(
        body["artifact_url"],
        "https://fake-artifact.com?x=1&%24expand=SignedContent"
    );
    assert_eq!(body["pages_build_version"], BUILD_VERSION);
    assert_eq!(body["oidc_token"], "oidc-token");

    // Status probe
    let status = mock.requests_to(&format!("/pages/deployments/{}", BUILD_VERSION));
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].method, Method::GET);

    assert!(mock.requests_to("/cancel").is_empty());
    assert_eq!(
        reporter.output("page_url").as_deref(),
        Some("https://actions.github.io/is-awesome")
    );
    assert_eq!(reporter.output("status").as_deref(), Some("succeed"));
}

#[tokio::test]
async fn test_manifest_failure_is_classified() {
    let mock = start_mock().await;
    *mock.manifest.lock().unwrap() = (400, json!({}));
    let reporter = Arc::new(RecordingReporter::new());

    let err = run(options(&mock, fast_poll()), reporter.clone())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Failed to create deployment (status: 400) with build version valid-build-version. Responded with: Bad Request"
    );
    assert_eq!(reporter.failures(), vec![err.to_string()]);
    assert!(mock.requests_to("/pages/deployments").is_empty());
}

#[tokio::test]
async fn test_create_rejection_uses_server_message() {
    let mock = start_mock().await;
    *mock.create.lock().unwrap() = (400, json!({ "message": "Artifact could not be deployed" }));
    let reporter = Arc::new(RecordingReporter::new());

    let err = run(options(&mock, fast_poll()), reporter.clone())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(err
        .to_string()
        .ends_with("Responded with: Artifact could not be deployed"));
    assert!(mock.requests_to("/cancel").is_empty());
}

#[tokio::test]
async fn test_pages_not_enabled() {
    let mock = start_mock().await;
    *mock.create.lock().unwrap() = (404, json!({ "message": "Not Found" }));
    let reporter = Arc::new(RecordingReporter::new());

    let err = run(options(&mock, fast_poll()), reporter.clone())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Failed to create deployment (status: 404) with build version valid-build-version. Ensure GitHub Pages has been enabled: https://github.com/actions/is-awesome/settings/pages"
    );
}

#[tokio::test]
async fn test_timeout_cancels_deployment() {
    let mock = start_mock().await;
    let reporter = Arc::new(RecordingReporter::new());
    let poll = PollConfig {
        timeout: Some(Duration::from_millis(100)),
        ..fast_poll()
    };

    let outcome = run(options(&mock, poll), reporter.clone()).await.unwrap();

    assert_eq!(outcome, PollOutcome::TimedOut);
    let cancel = mock.requests_to("/cancel");
    assert_eq!(cancel.len(), 1);
    assert_eq!(
        cancel[0].path,
        "/repos/actions/is-awesome/pages/deployments/valid-build-version/cancel"
    );
    assert_eq!(cancel[0].authorization.as_deref(), Some("Bearer gha-token"));
    assert_eq!(reporter.failures(), vec!["Timeout reached, aborting!"]);
    assert_eq!(
        reporter.last_info().as_deref(),
        Some("Canceled deployment with ID valid-build-version")
    );
}

#[tokio::test]
async fn test_failed_probes_abort_with_status_code() {
    let mock = start_mock().await;
    *mock.cancel.lock().unwrap() = (500, json!({ "message": "cancel exploded" }));
    mock.statuses
        .lock()
        .unwrap()
        .push_back((500, json!({ "message": "boom" })));
    let reporter = Arc::new(RecordingReporter::new());
    let poll = PollConfig {
        error_count: 0,
        ..fast_poll()
    };

    let outcome = run(options(&mock, poll), reporter.clone()).await.unwrap();

    assert_eq!(
        outcome,
        PollOutcome::TooManyErrors("Failed with status code: 500".to_string())
    );
    assert_eq!(reporter.failures(), vec!["Failed with status code: 500"]);
    // The failed cancel is logged, not reported as a second failure
    let errors = reporter.errors();
    assert!(errors.contains(&"Too many errors, aborting!".to_string()));
    assert!(errors
        .iter()
        .any(|e| e.starts_with("Canceling Pages deployment failed")));
    assert_eq!(mock.requests_to("/cancel").len(), 1);
}

#[tokio::test]
async fn test_pages_client_urls() {
    let mock = start_mock().await;
    let client = PagesClient::new(
        HttpClient::with_timeout(Duration::from_secs(5)).unwrap(),
        Endpoints {
            api_url: format!("{}/", mock.base),
            runtime_url: mock.base.clone(),
        },
        REPOSITORY.to_string(),
        SecretString::from("gha-token".to_string()),
        SecretString::from("runtime-token".to_string()),
    );

    assert_eq!(
        client.deployments_url(),
        format!("{}/repos/actions/is-awesome/pages/deployments", mock.base)
    );

    let manifest = client.list_artifacts("123").await.unwrap();
    assert_eq!(manifest.value.len(), 2);
    assert_eq!(manifest.value[1].size, Some(1024));

    *mock.manifest.lock().unwrap() = (500, json!({ "message": "unavailable" }));
    let err = client.list_artifacts("123").await.unwrap_err();
    assert!(matches!(
        err,
        DeployError::Status { status: 500, ref message } if message == "unavailable"
    ));
}
