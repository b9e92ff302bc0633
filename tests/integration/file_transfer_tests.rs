//! File transfer through presigned URLs plus context sync.

use std::sync::{Arc, Mutex};

use agentbay::{DownloadOptions, UploadOptions};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::test_helpers::{
    context_status_data, create_plain_session, create_session_with_auto_context, ok_envelope,
};

async fn mock_terminal_rows(server: &MockServer, context_id: &str, sandbox_path: &str, task: &str) {
    let rows = context_status_data(&json!([{
        "contextId": context_id,
        "path": sandbox_path,
        "taskType": task,
        "status": "success",
    }]));
    Mock::given(method("POST"))
        .and(path("/GetContextInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope("rid-info", rows)))
        .mount(server)
        .await;
}

async fn mock_upload_url(server: &MockServer, object_url: &str) {
    Mock::given(method("POST"))
        .and(path("/GetFileUploadUrl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(
            "rid-url",
            json!({"url": object_url, "expireTime": 4_102_444_800_i64}),
        )))
        .mount(server)
        .await;
}

async fn mock_sync_accepted(server: &MockServer, mode: &str) {
    Mock::given(method("POST"))
        .and(path("/SyncContext"))
        .and(body_partial_json(json!({"mode": mode})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope("rid-sync", json!({}))))
        .mount(server)
        .await;
}

// S3: 100 bytes up, presigned PUT 200 + ETag, sandbox pull terminal on
// the first poll.
#[tokio::test]
async fn upload_happy_path() {
    let server = MockServer::start().await;
    let object = MockServer::start().await;
    let sandbox_path = "/temp/file-transfer/a.txt";

    // Mounted first so it outranks the helper's empty-status mock for
    // both the create gate and the completion wait.
    mock_terminal_rows(&server, "ctx-ft", sandbox_path, "download").await;
    let (_agent_bay, session) = create_session_with_auto_context(&server, "ctx-ft").await;

    mock_upload_url(&server, &format!("{}/oss/a.txt", object.uri())).await;
    mock_sync_accepted(&server, "download").await;
    Mock::given(method("POST"))
        .and(path("/GetAndLoadInternalContext"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope("rid", json!([]))))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/oss/a.txt"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("ETag", "\"abc\""),
        )
        .expect(1)
        .mount(&object)
        .await;

    let temp = tempfile::tempdir().expect("tempdir");
    let local = temp.path().join("a.txt");
    std::fs::write(&local, vec![b'x'; 100]).expect("write");

    let result = session
        .file_transfer()
        .upload(&local, sandbox_path, UploadOptions::default())
        .await;

    assert!(result.success, "{}", result.error_message);
    assert_eq!(result.bytes_sent, 100);
    assert_eq!(result.http_status, 200);
    assert_eq!(result.etag, "abc");
    assert_eq!(result.request_id_upload_url, "rid-url");
    assert_eq!(result.request_id_sync, "rid-sync");
    assert_eq!(result.path, sandbox_path);
}

#[tokio::test]
async fn upload_missing_local_file_fails_without_io() {
    let server = MockServer::start().await;
    let (_agent_bay, session) = create_session_with_auto_context(&server, "ctx-ft").await;

    Mock::given(method("POST"))
        .and(path("/GetFileUploadUrl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope("rid", json!({}))))
        .expect(0)
        .mount(&server)
        .await;

    let result = session
        .file_transfer()
        .upload("/nonexistent/input.bin", "/temp/file-transfer/x", UploadOptions::default())
        .await;

    assert!(!result.success);
    assert!(result.error_message.contains("cannot read"));
    assert_eq!(result.http_status, 0);
}

#[tokio::test]
async fn upload_surfaces_presigned_put_status() {
    let server = MockServer::start().await;
    let object = MockServer::start().await;
    let sandbox_path = "/temp/file-transfer/denied.txt";

    mock_terminal_rows(&server, "ctx-ft", sandbox_path, "download").await;
    let (_agent_bay, session) = create_session_with_auto_context(&server, "ctx-ft").await;
    mock_upload_url(&server, &format!("{}/oss/denied", object.uri())).await;
    Mock::given(method("PUT"))
        .and(path("/oss/denied"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&object)
        .await;
    Mock::given(method("POST"))
        .and(path("/SyncContext"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope("rid", json!({}))))
        .expect(0)
        .mount(&server)
        .await;

    let temp = tempfile::tempdir().expect("tempdir");
    let local = temp.path().join("denied.txt");
    std::fs::write(&local, b"data").expect("write");

    let result = session
        .file_transfer()
        .upload(&local, sandbox_path, UploadOptions::default())
        .await;

    assert!(!result.success);
    assert_eq!(result.http_status, 403);
    assert!(result.error_message.contains("403"));
    assert_eq!(result.request_id_upload_url, "rid-url", "minting id retained");
}

// The lazy path resolves the file-transfer context exactly once per
// session, however many transfers follow.
#[tokio::test]
async fn lazy_context_is_loaded_once() {
    let server = MockServer::start().await;
    let object = MockServer::start().await;
    let sandbox_path = "/temp/file-transfer/b.txt";

    let (_agent_bay, session) = create_plain_session(&server).await;
    assert!(session.file_transfer_context_id().await.is_none());

    Mock::given(method("POST"))
        .and(path("/GetAndLoadInternalContext"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(
            "rid-internal",
            json!([{"contextId": "ctx-lazy", "contextPath": "/temp/file-transfer"}]),
        )))
        .expect(1)
        .mount(&server)
        .await;
    mock_terminal_rows(&server, "ctx-lazy", sandbox_path, "download").await;
    mock_upload_url(&server, &format!("{}/oss/b.txt", object.uri())).await;
    mock_sync_accepted(&server, "download").await;
    Mock::given(method("PUT"))
        .and(path("/oss/b.txt"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&object)
        .await;

    let temp = tempfile::tempdir().expect("tempdir");
    let local = temp.path().join("b.txt");
    std::fs::write(&local, b"payload").expect("write");

    let engine = session.file_transfer();
    let first = engine.upload(&local, sandbox_path, UploadOptions::default()).await;
    assert!(first.success, "{}", first.error_message);
    let second = engine.upload(&local, sandbox_path, UploadOptions::default()).await;
    assert!(second.success, "{}", second.error_message);

    assert_eq!(
        session.file_transfer_context_id().await.as_deref(),
        Some("ctx-lazy")
    );
    // The expect(1) on GetAndLoadInternalContext verifies on drop.
}

#[tokio::test]
async fn download_streams_to_nested_path_with_progress() {
    let server = MockServer::start().await;
    let object = MockServer::start().await;
    let sandbox_path = "/temp/file-transfer/report.bin";

    mock_terminal_rows(&server, "ctx-ft", sandbox_path, "upload").await;
    let (_agent_bay, session) = create_session_with_auto_context(&server, "ctx-ft").await;
    mock_sync_accepted(&server, "upload").await;
    Mock::given(method("POST"))
        .and(path("/GetFileDownloadUrl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(
            "rid-dl-url",
            json!({"url": format!("{}/oss/report", object.uri())}),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oss/report"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"0123456789".to_vec()))
        .expect(1)
        .mount(&object)
        .await;

    let temp = tempfile::tempdir().expect("tempdir");
    let local = temp.path().join("sub").join("dir").join("report.bin");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_cb = Arc::clone(&seen);

    let result = session
        .file_transfer()
        .download(
            sandbox_path,
            &local,
            DownloadOptions {
                progress: Some(Box::new(move |received| {
                    seen_in_cb.lock().expect("lock").push(received);
                })),
                ..DownloadOptions::default()
            },
        )
        .await;

    assert!(result.success, "{}", result.error_message);
    assert_eq!(result.bytes_received, 10);
    assert_eq!(result.http_status, 200);
    assert_eq!(result.request_id_download_url, "rid-dl-url");
    assert_eq!(result.request_id_sync, "rid-sync");
    assert_eq!(std::fs::read(&local).expect("read"), b"0123456789");
    let seen = seen.lock().expect("lock");
    assert_eq!(seen.last().copied(), Some(10));
}

// S4: presigned GET 404s after the push settled. The local file must
// not be created.
#[tokio::test]
async fn download_404_on_presigned_get() {
    let server = MockServer::start().await;
    let object = MockServer::start().await;
    let sandbox_path = "/temp/file-transfer/missing.bin";

    mock_terminal_rows(&server, "ctx-ft", sandbox_path, "upload").await;
    let (_agent_bay, session) = create_session_with_auto_context(&server, "ctx-ft").await;
    mock_sync_accepted(&server, "upload").await;
    Mock::given(method("POST"))
        .and(path("/GetFileDownloadUrl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(
            "rid-dl-url",
            json!({"url": format!("{}/oss/missing", object.uri())}),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oss/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&object)
        .await;

    let temp = tempfile::tempdir().expect("tempdir");
    let local = temp.path().join("missing.bin");

    let result = session
        .file_transfer()
        .download(sandbox_path, &local, DownloadOptions::default())
        .await;

    assert!(!result.success);
    assert_eq!(result.http_status, 404);
    assert_eq!(result.error_message, "Download failed with HTTP 404");
    assert!(!local.exists(), "no partial file on a failed presign");
}

// Overwrite guard: an existing destination with overwrite disabled
// fails before any RPC or presigned HTTP.
#[tokio::test]
async fn download_overwrite_guard_blocks_all_io() {
    let server = MockServer::start().await;
    let (_agent_bay, session) = create_session_with_auto_context(&server, "ctx-ft").await;

    Mock::given(method("POST"))
        .and(path("/SyncContext"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope("rid", json!({}))))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/GetFileDownloadUrl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope("rid", json!({}))))
        .expect(0)
        .mount(&server)
        .await;

    let temp = tempfile::tempdir().expect("tempdir");
    let local = temp.path().join("existing.bin");
    std::fs::write(&local, b"old content").expect("write");

    let result = session
        .file_transfer()
        .download(
            "/temp/file-transfer/existing.bin",
            &local,
            DownloadOptions {
                overwrite: false,
                ..DownloadOptions::default()
            },
        )
        .await;

    assert!(!result.success);
    assert!(result.error_message.contains("already exists"));
    assert_eq!(
        std::fs::read(&local).expect("read"),
        b"old content",
        "destination untouched"
    );
}
