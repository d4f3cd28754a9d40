// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end tests against a live HTTP listener.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use supergraph_registry::{
    build_router, AppState, GatewayConfig, Invocation, ProcessOutput, ProcessRunner, RunError,
};
use tempfile::TempDir;

enum Behaviour {
    Exit { code: i32, stdout: &'static str, stderr: &'static str },
    CannotLaunch,
    TimesOut,
}

/// Stand-in for the composition tool; records the `.graphql` files present
/// in its working directory on each run.
struct StubRover {
    behaviour: Behaviour,
    seen: Arc<Mutex<Vec<Vec<String>>>>,
}

fn graphql_files(dir: Option<&Path>) -> Vec<String> {
    let Some(Ok(entries)) = dir.map(std::fs::read_dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".graphql"))
        .collect();
    names.sort();
    names
}

#[async_trait]
impl ProcessRunner for StubRover {
    async fn run(
        &self,
        invocation: &Invocation,
        _timeout: Option<Duration>,
    ) -> Result<ProcessOutput, RunError> {
        self.seen
            .lock()
            .unwrap()
            .push(graphql_files(invocation.working_dir.as_deref()));
        match self.behaviour {
            Behaviour::Exit { code, stdout, stderr } => Ok(ProcessOutput {
                exit_code: code,
                stdout: stdout.as_bytes().to_vec(),
                stderr: stderr.as_bytes().to_vec(),
            }),
            Behaviour::CannotLaunch => Err(RunError::Launch {
                program: invocation.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            }),
            Behaviour::TimesOut => Err(RunError::TimedOut(Duration::from_secs(1))),
        }
    }
}

struct TestServer {
    base: String,
    root: PathBuf,
    seen: Arc<Mutex<Vec<Vec<String>>>>,
    _dir: TempDir,
}

impl TestServer {
    async fn start(behaviour: Behaviour) -> Self {
        Self::start_with(behaviour, |_| {}).await
    }

    /// Start after `prepare` has run against the (not yet created) registry root.
    async fn start_with(behaviour: Behaviour, prepare: impl FnOnce(&Path)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("dist");
        prepare(&root);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let config = GatewayConfig {
            registry_root: root.clone(),
            rover_binary: root.join("rover"),
            rover_config: root.join("rover-config.yaml"),
            output_path: root.join("schema.graphql"),
            ..Default::default()
        };

        let state = Arc::new(AppState::from_config(
            &config,
            Arc::new(StubRover {
                behaviour,
                seen: Arc::clone(&seen),
            }),
        ));
        let app = build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            root,
            seen,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn post_json(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = reqwest::Client::new()
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn post_empty(&self, path: &str) -> (u16, Value) {
        let resp = reqwest::Client::new().post(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn ok_rover() -> Behaviour {
    Behaviour::Exit {
        code: 0,
        stdout: "ok",
        stderr: "",
    }
}

#[tokio::test]
async fn register_then_compose() {
    let server = TestServer::start(ok_rover()).await;

    let (status, body) = server
        .post_json(
            "/add-sub-schema",
            json!({ "schema": "type Query { a: String }", "module": "svc1" }),
        )
        .await;
    assert_eq!(status, 200);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Schema saved to "));
    assert!(message.ends_with("svc1.graphql"));
    assert_eq!(read(&server.root.join("svc1.graphql")), "type Query { a: String }");

    let (status, body) = server.post_empty("/run-rover").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "stdout": "ok", "stderr": "", "returncode": 0 }));

    let seen = server.seen.lock().unwrap().clone();
    assert_eq!(seen, vec![vec!["svc1.graphql".to_string()]]);
}

#[tokio::test]
async fn missing_module_uses_default() {
    let server = TestServer::start(ok_rover()).await;

    let (status, body) = server
        .post_json("/add-sub-schema", json!({ "schema": "type Query { ui: String }" }))
        .await;
    assert_eq!(status, 200);

    let expected = server.root.join("webui.graphql");
    assert_eq!(
        body["message"],
        json!(format!("Schema saved to {}", expected.display()))
    );
    assert_eq!(read(&expected), "type Query { ui: String }");
}

#[tokio::test]
async fn reregistering_overwrites() {
    let server = TestServer::start(ok_rover()).await;

    for schema in ["type Query { a: String }", "type Query { b: Int }"] {
        let (status, _) = server
            .post_json("/add-sub-schema", json!({ "schema": schema, "module": "users" }))
            .await;
        assert_eq!(status, 200);
    }

    assert_eq!(read(&server.root.join("users.graphql")), "type Query { b: Int }");
    let resp = reqwest::get(server.url("/subgraphs")).await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "subgraphs": ["users"] }));
}

#[tokio::test]
async fn empty_schema_is_bad_request() {
    let server = TestServer::start(ok_rover()).await;

    for body in [json!({ "schema": "", "module": "svc1" }), json!({ "module": "svc1" })] {
        let (status, resp) = server.post_json("/add-sub-schema", body).await;
        assert_eq!(status, 400);
        assert_eq!(resp, json!({ "error": "Schema string is required" }));
    }
    assert!(!server.root.exists());
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let server = TestServer::start(ok_rover()).await;

    let resp = reqwest::Client::new()
        .post(server.url("/add-sub-schema"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn traversal_module_is_storage_failure() {
    let server = TestServer::start(ok_rover()).await;

    let (status, body) = server
        .post_json(
            "/add-sub-schema",
            json!({ "schema": "type Query { a: String }", "module": "../../etc/evil" }),
        )
        .await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("invalid module name"));
}

#[tokio::test]
async fn unwritable_root_is_server_error() {
    let server = TestServer::start_with(ok_rover(), |root| {
        std::fs::write(root, "not a directory").unwrap();
    })
    .await;

    let (status, body) = server
        .post_json(
            "/add-sub-schema",
            json!({ "schema": "type Query { a: String }", "module": "svc1" }),
        )
        .await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("failed to write"));
    assert!(server.root.is_file());
    assert!(graphql_files(server.root.parent()).is_empty());
}

#[tokio::test]
async fn compose_with_no_subgraphs_still_reports() {
    let server = TestServer::start(Behaviour::Exit {
        code: 1,
        stdout: "",
        stderr: "error: no subgraphs",
    })
    .await;

    let (status, body) = server.post_empty("/run-rover").await;
    assert_eq!(status, 200);
    assert_eq!(body["returncode"], json!(1));
    assert_eq!(body["stderr"], json!("error: no subgraphs"));
}

#[tokio::test]
async fn launch_failure_is_server_error() {
    let server = TestServer::start(Behaviour::CannotLaunch).await;

    let (status, body) = server.post_empty("/run-rover").await;
    assert_eq!(status, 500);
    assert!(body.get("returncode").is_none());
    assert!(body["error"].as_str().unwrap().contains("failed to launch"));
}

#[tokio::test]
async fn timeout_is_gateway_timeout() {
    let server = TestServer::start(Behaviour::TimesOut).await;

    let (status, body) = server.post_empty("/run-rover").await;
    assert_eq!(status, 504);
    assert!(body["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn concurrent_registrations_to_distinct_modules() {
    let server = Arc::new(TestServer::start(ok_rover()).await);

    let tasks: Vec<_> = ["alpha", "beta"]
        .into_iter()
        .map(|module| {
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                let schema = format!("type Query {{ {module}: String }}");
                server
                    .post_json("/add-sub-schema", json!({ "schema": schema, "module": module }))
                    .await
            })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap().0, 200);
    }

    assert_eq!(read(&server.root.join("alpha.graphql")), "type Query { alpha: String }");
    assert_eq!(read(&server.root.join("beta.graphql")), "type Query { beta: String }");
}

#[tokio::test]
async fn health_and_info() {
    let server = TestServer::start(ok_rover()).await;

    let body: Value = reqwest::get(server.url("/health")).await.unwrap().json().await.unwrap();
    assert_eq!(body, json!({ "status": "ok" }));

    let info: Value = reqwest::get(server.url("/api/v1/info"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["name"], json!("supergraph-registry"));
}
