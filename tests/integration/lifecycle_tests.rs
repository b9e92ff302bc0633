//! Pause/resume polling, recovery, labels, and links.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::test_helpers::{
    agent_bay_for, create_plain_session, err_envelope, mock_auto_context, ok_envelope,
};

fn session_data(session_id: &str, status: &str) -> serde_json::Value {
    json!({
        "sessionId": session_id,
        "resourceId": "res-1",
        "appInstanceId": "app-1",
        "resourceUrl": "https://console.example.com/session",
        "status": status,
    })
}

#[tokio::test]
async fn pause_polls_until_paused() {
    let server = MockServer::start().await;
    let (_agent_bay, session) = create_plain_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/PauseSessionAsync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope("rid-pause", json!({}))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/GetSession"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(
            "rid-get-1",
            session_data("s-plain", "pausing"),
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/GetSession"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(
            "rid-get-2",
            session_data("s-plain", "PAUSED"),
        )))
        .mount(&server)
        .await;

    let result = session
        .pause(Duration::from_secs(2), Duration::from_millis(25))
        .await;

    assert!(result.success, "{}", result.error_message);
    assert_eq!(result.request_id, "rid-pause");
}

#[tokio::test]
async fn pause_times_out_when_state_never_settles() {
    let server = MockServer::start().await;
    let (_agent_bay, session) = create_plain_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/PauseSessionAsync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope("rid-pause", json!({}))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/GetSession"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(
            "rid-get",
            session_data("s-plain", "running"),
        )))
        .mount(&server)
        .await;

    let result = session
        .pause(Duration::from_millis(120), Duration::from_millis(25))
        .await;

    assert!(!result.success);
    assert!(result.error_message.contains("timeout"));
}

#[tokio::test]
async fn resume_polls_until_running() {
    let server = MockServer::start().await;
    let (_agent_bay, session) = create_plain_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/ResumeSessionAsync"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(ok_envelope("rid-resume", json!({}))),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/GetSession"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(
            "rid-get",
            session_data("s-plain", "running"),
        )))
        .mount(&server)
        .await;

    let result = session
        .resume(Duration::from_secs(2), Duration::from_millis(25))
        .await;

    assert!(result.success, "{}", result.error_message);
    assert_eq!(result.request_id, "rid-resume");
}

#[tokio::test]
async fn get_recovers_a_session_with_fresh_transfer_context() {
    let server = MockServer::start().await;
    mock_auto_context(&server, "ctx-recovered").await;
    Mock::given(method("POST"))
        .and(path("/GetSession"))
        .and(body_partial_json(json!({"sessionId": "s-9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(
            "rid-get",
            session_data("s-9", "running"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let agent_bay = agent_bay_for(&server);
    let recovered = agent_bay.get("s-9").await;

    assert!(recovered.success, "{}", recovered.error_message);
    assert_eq!(recovered.request_id, "rid-get");
    let session = recovered.session.expect("session");
    assert_eq!(session.id(), "s-9");
    assert_eq!(
        session.file_transfer_context_id().await.as_deref(),
        Some("ctx-recovered")
    );
    assert!(agent_bay.find("s-9").await.is_some());
}

#[tokio::test]
async fn get_distinguishes_not_found_from_io_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/GetSession"))
        .respond_with(ResponseTemplate::new(200).set_body_json(err_envelope(
            "InvalidSessionId.NotFound",
            "session s-gone has expired",
            "rid-404",
        )))
        .mount(&server)
        .await;

    let agent_bay = agent_bay_for(&server);
    let result = agent_bay.get("s-gone").await;

    assert!(!result.success);
    assert_eq!(result.request_id, "rid-404");
    assert!(
        result.error_message.starts_with("not found:"),
        "soft not-found marker, got: {}",
        result.error_message
    );
}

#[tokio::test]
async fn labels_round_trip() {
    let server = MockServer::start().await;
    let (_agent_bay, session) = create_plain_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/SetLabel"))
        .and(body_string_contains("team"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope("rid-set", json!({}))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/GetLabel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(
            "rid-get-label",
            json!({"labels": "{\"team\":\"qa\"}"}),
        )))
        .mount(&server)
        .await;

    let labels = HashMap::from([("team".to_owned(), "qa".to_owned())]);
    let set = session.set_labels(&labels).await;
    assert!(set.success, "{}", set.error_message);
    assert_eq!(set.request_id, "rid-set");

    let fetched = session.get_labels().await;
    assert!(fetched.success, "{}", fetched.error_message);
    assert_eq!(fetched.labels.get("team").map(String::as_str), Some("qa"));
}

#[tokio::test]
async fn get_link_validates_port_range_locally() {
    let server = MockServer::start().await;
    let (_agent_bay, session) = create_plain_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/GetLink"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope("rid", json!({}))))
        .expect(0)
        .mount(&server)
        .await;

    let result = session.get_link(None, Some(8080)).await;

    assert!(!result.success);
    assert!(result.error_message.contains("30100"));
}

#[tokio::test]
async fn get_link_returns_forwarding_url() {
    let server = MockServer::start().await;
    let (_agent_bay, session) = create_plain_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/GetLink"))
        .and(body_partial_json(json!({"port": 30150, "protocolType": "https"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(
            "rid-link",
            json!({"url": "https://gateway.example.com/fwd/abc"}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let result = session.get_link(Some("https"), Some(30150)).await;

    assert!(result.success, "{}", result.error_message);
    assert_eq!(result.url, "https://gateway.example.com/fwd/abc");
    assert_eq!(result.request_id, "rid-link");
}
