//! Cursor-walk pagination for session listing.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::test_helpers::{agent_bay_for, ok_envelope};

fn page(ids: &[&str], next_token: &str) -> serde_json::Value {
    json!({
        "data": ids.iter().map(|id| json!({"sessionId": id})).collect::<Vec<_>>(),
        "nextToken": next_token,
        "maxResults": 2,
        "totalCount": 5,
    })
}

// Page 3 walks the cursor forward with exactly three RPCs and returns
// the third page's rows.
#[tokio::test]
async fn page_three_issues_three_rpcs() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ListSession"))
        .and(body_partial_json(json!({"nextToken": "t1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_envelope("rid-p2", page(&["s-3", "s-4"], "t2"))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ListSession"))
        .and(body_partial_json(json!({"nextToken": "t2"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(ok_envelope("rid-p3", page(&["s-5"], ""))),
        )
        .expect(1)
        .mount(&server)
        .await;
    // First request carries no cursor; mounted last so the token
    // matchers above win when a token is present.
    Mock::given(method("POST"))
        .and(path("/ListSession"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_envelope("rid-p1", page(&["s-1", "s-2"], "t1"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let agent_bay = agent_bay_for(&server);
    let listed = agent_bay.list(None, Some(3), Some(2)).await;

    assert!(listed.success, "{}", listed.error_message);
    assert_eq!(listed.session_ids, vec!["s-5"]);
    assert_eq!(listed.request_id, "rid-p3");
    assert_eq!(listed.total_count, Some(5));
}

#[tokio::test]
async fn page_past_the_end_fails_distinctly() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ListSession"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_envelope("rid-only", page(&["s-1"], ""))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let agent_bay = agent_bay_for(&server);
    let listed = agent_bay.list(None, Some(2), Some(10)).await;

    assert!(!listed.success);
    assert!(listed.error_message.contains("out of range"));
    assert!(listed.session_ids.is_empty());
}

#[tokio::test]
async fn labels_filter_is_json_encoded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ListSession"))
        .and(body_partial_json(json!({"labels": "{\"team\":\"qa\"}"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_envelope("rid-lbl", page(&["s-9"], ""))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let agent_bay = agent_bay_for(&server);
    let labels = std::collections::HashMap::from([("team".to_owned(), "qa".to_owned())]);
    let listed = agent_bay.list(Some(&labels), None, None).await;

    assert!(listed.success, "{}", listed.error_message);
    assert_eq!(listed.session_ids, vec!["s-9"]);
}
