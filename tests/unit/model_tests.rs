use agentbay::models::context::{
    BwList, ContextMount, DeletePolicy, SyncPolicy, UploadMode, UploadPolicy, WhiteList,
};
use agentbay::models::session::SessionState;
use agentbay::models::tool::{CodeExecutionOutput, ToolResult};

#[test]
fn sync_policy_serializes_to_wire_shape() {
    let policy = SyncPolicy {
        upload_policy: Some(UploadPolicy {
            auto_upload: true,
            upload_mode: UploadMode::Archive,
        }),
        delete_policy: Some(DeletePolicy {
            purge_on_unmount: true,
        }),
        bw_list: Some(BwList {
            white_lists: vec![WhiteList {
                path: "data".into(),
                exclude_paths: vec!["data/tmp".into()],
            }],
        }),
        ..SyncPolicy::default()
    };

    let json = serde_json::to_value(&policy).expect("serialize");
    assert_eq!(json["uploadPolicy"]["autoUpload"], true);
    assert_eq!(json["uploadPolicy"]["uploadMode"], "archive");
    assert_eq!(json["deletePolicy"]["purgeOnUnmount"], true);
    assert_eq!(json["bwList"]["whiteLists"][0]["path"], "data");
    assert!(
        json.get("downloadPolicy").is_none(),
        "unset knobs stay absent"
    );
}

#[test]
fn mount_auto_upload_detection() {
    let plain = ContextMount::new("ctx-1", "/data");
    assert!(!plain.wants_auto_upload());

    let flushing = ContextMount::new("ctx-1", "/data")
        .with_policy(SyncPolicy::with_auto_upload(true));
    assert!(flushing.wants_auto_upload());

    let disabled = ContextMount::new("ctx-1", "/data")
        .with_policy(SyncPolicy::with_auto_upload(false));
    assert!(!disabled.wants_auto_upload());
}

#[test]
fn session_state_tokens() {
    assert_eq!(SessionState::parse("TERMINATED"), SessionState::Terminated);
    assert_eq!(SessionState::parse("resuming"), SessionState::Resuming);
    assert_eq!(SessionState::parse("weird"), SessionState::Unknown);
}

#[test]
fn tool_result_failure_constructor() {
    let result = ToolResult::failure("boom");
    assert!(!result.success);
    assert_eq!(result.error_message, "boom");
    assert!(result.request_id.is_empty());
    assert!(result.data.is_empty());
}

#[test]
fn code_output_rich_results() {
    let raw = r#"{
        "result": [
            {"text/plain": "3", "image/png": "aGk="},
            {"text/html": "<p>done</p>"}
        ],
        "stdout": ["a", "b"],
        "stderr": ["warn"],
        "executionError": "NameError: x",
        "executionTime": 1.5
    }"#;
    let output: CodeExecutionOutput = serde_json::from_str(raw).expect("parse");
    assert_eq!(output.results.len(), 2);
    assert_eq!(output.results[0].text(), Some("3"));
    assert_eq!(output.results[1].text(), None);
    assert_eq!(output.stderr, vec!["warn"]);
    assert_eq!(output.execution_error.as_deref(), Some("NameError: x"));
}
