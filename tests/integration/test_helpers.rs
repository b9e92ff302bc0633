//! Shared fixtures for wiremock-backed integration tests.
//!
//! One [`MockServer`] stands in for the control plane; file-transfer
//! tests add a second one for the object store and VPC tests a third for
//! the in-sandbox agent.

use std::sync::Arc;
use std::time::Duration;

use agentbay::{AgentBay, Config, CreateSessionParams, Session};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Credential used by every test client.
pub const TEST_API_KEY: &str = "akm-test-key";

/// Route SDK logs to the test output when `RUST_LOG` is set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A success envelope wrapping `data`.
pub fn ok_envelope(request_id: &str, data: Value) -> Value {
    json!({
        "success": true,
        "code": "",
        "message": "",
        "requestId": request_id,
        "httpStatusCode": 200,
        "data": data,
    })
}

/// A failure envelope with no data.
pub fn err_envelope(code: &str, message: &str, request_id: &str) -> Value {
    json!({
        "success": false,
        "code": code,
        "message": message,
        "requestId": request_id,
        "httpStatusCode": 400,
    })
}

/// Double-encode status `rows` the way `GetContextInfo` returns them.
pub fn context_status_data(rows: &Value) -> Value {
    let outer = json!([
        {"type": "log", "data": "sync worker heartbeat"},
        {"type": "data", "data": rows.to_string()},
    ]);
    json!({ "contextStatus": outer.to_string() })
}

/// Client pointed at the mock control plane.
pub fn agent_bay_for(server: &MockServer) -> AgentBay {
    let config = Config::new(TEST_API_KEY, server.uri(), Duration::from_secs(5))
        .expect("test config");
    AgentBay::with_config(config).expect("client")
}

/// Mount a `GetContext` mock resolving every name to `context_id`.
pub async fn mock_auto_context(server: &MockServer, context_id: &str) {
    Mock::given(method("POST"))
        .and(path("/GetContext"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(
            "rid-ctx",
            json!({"contextId": context_id, "name": "auto", "state": "available"}),
        )))
        .mount(server)
        .await;
}

/// Mount a `GetContext` mock that always fails, so sessions come up with
/// no auto mounts.
pub async fn mock_context_unavailable(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/GetContext"))
        .respond_with(ResponseTemplate::new(200).set_body_json(err_envelope(
            "InternalError",
            "context store unavailable",
            "rid-ctx-err",
        )))
        .mount(server)
        .await;
}

/// Mount a `GetContextInfo` mock reporting no tasks.
pub async fn mock_empty_context_info(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/GetContextInfo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_envelope("rid-info", json!({"contextStatus": ""}))),
        )
        .mount(server)
        .await;
}

/// Mount a `CreateSession` mock returning `session_id`.
pub async fn mock_create_session(server: &MockServer, session_id: &str) {
    Mock::given(method("POST"))
        .and(path("/CreateSession"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(
            "rid-create",
            json!({
                "sessionId": session_id,
                "resourceUrl": "https://console.example.com/session",
                "appInstanceId": "app-instance-1",
            }),
        )))
        .mount(server)
        .await;
}

/// A session with no mounts and no file-transfer context: the context
/// store is down, so create proceeds bare and the sync gate is skipped.
pub async fn create_plain_session(server: &MockServer) -> (AgentBay, Arc<Session>) {
    init_tracing();
    mock_context_unavailable(server).await;
    mock_create_session(server, "s-plain").await;

    let agent_bay = agent_bay_for(server);
    let created = agent_bay.create(CreateSessionParams::default()).await;
    assert!(created.success, "create failed: {}", created.error_message);
    let session = created.session.expect("session");
    (agent_bay, session)
}

/// A session whose auto file-transfer context resolved to `context_id`.
pub async fn create_session_with_auto_context(
    server: &MockServer,
    context_id: &str,
) -> (AgentBay, Arc<Session>) {
    init_tracing();
    mock_auto_context(server, context_id).await;
    mock_create_session(server, "s-auto").await;
    mock_empty_context_info(server).await;

    let agent_bay = agent_bay_for(server);
    let created = agent_bay.create(CreateSessionParams::default()).await;
    assert!(created.success, "create failed: {}", created.error_message);
    let session = created.session.expect("session");
    (agent_bay, session)
}

/// A VPC session whose agent lives on `agent` and whose routing table
/// maps the given `(tool, server)` pairs.
pub async fn create_vpc_session(
    control: &MockServer,
    agent: &MockServer,
    tools: &[(&str, &str)],
) -> (AgentBay, Arc<Session>) {
    init_tracing();
    mock_context_unavailable(control).await;

    let agent_port = agent.address().port();
    Mock::given(method("POST"))
        .and(path("/CreateSession"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(
            "rid-create-vpc",
            json!({
                "sessionId": "s-vpc",
                "resourceUrl": "https://console.example.com/session",
                "appInstanceId": "app-instance-1",
                "networkInterfaceIp": "127.0.0.1",
                "httpPort": agent_port,
                "token": "vpc-scoped-token",
                "vpcResource": true,
            }),
        )))
        .mount(control)
        .await;

    let entries: Vec<Value> = tools
        .iter()
        .map(|(tool, server)| json!({"name": tool, "server": server}))
        .collect();
    Mock::given(method("POST"))
        .and(path("/ListMcpTools"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_envelope("rid-tools", Value::Array(entries))),
        )
        .mount(control)
        .await;

    let agent_bay = agent_bay_for(control);
    let created = agent_bay
        .create(CreateSessionParams {
            vpc_mode: true,
            ..CreateSessionParams::default()
        })
        .await;
    assert!(created.success, "create failed: {}", created.error_message);
    let session = created.session.expect("session");
    assert!(session.is_vpc());
    (agent_bay, session)
}
