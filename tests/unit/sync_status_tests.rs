use agentbay::models::sync::{
    is_success_status, is_terminal_status, ContextStatusItem, SyncMode,
};

#[test]
fn every_documented_terminal_token_is_terminal() {
    for token in [
        "success",
        "successful",
        "ok",
        "finished",
        "done",
        "completed",
        "complete",
        "failed",
    ] {
        assert!(is_terminal_status(token), "{token}");
        assert!(
            is_terminal_status(&token.to_uppercase()),
            "case-folded {token}"
        );
    }
}

#[test]
fn failed_is_terminal_but_not_success_equivalent() {
    assert!(is_terminal_status("failed"));
    assert!(!is_success_status("Failed"));
}

#[test]
fn in_flight_tokens_are_not_terminal() {
    for token in ["pending", "inProgress", "queued", ""] {
        assert!(!is_terminal_status(token), "{token}");
    }
}

#[test]
fn status_item_deserializes_camel_case() {
    let raw = r#"{
        "contextId": "ctx-9",
        "path": "/temp/file-transfer/a.txt",
        "taskType": "download",
        "status": "Finished",
        "startTime": 1700000000,
        "finishTime": 1700000002,
        "errorMessage": null
    }"#;
    let item: ContextStatusItem = serde_json::from_str(raw).expect("parse");
    assert_eq!(item.context_id, "ctx-9");
    assert!(SyncMode::Download.matches(&item.task_type));
    assert!(item.is_terminal());
    assert!(item.is_success());
    assert_eq!(item.finish_time, Some(1_700_000_002));
}

#[test]
fn missing_fields_default_to_in_flight() {
    let item: ContextStatusItem = serde_json::from_str("{}").expect("parse");
    assert!(!item.is_terminal());
}

#[test]
fn mode_tokens_round_trip() {
    assert_eq!(SyncMode::Upload.as_str(), "upload");
    assert_eq!(SyncMode::Download.as_str(), "download");
    let parsed: SyncMode = serde_json::from_str("\"upload\"").expect("parse");
    assert_eq!(parsed, SyncMode::Upload);
}
