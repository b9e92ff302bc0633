use agentbay::redact::{redact, redact_with_secret, REDACTED};

#[test]
fn api_key_query_param_is_masked() {
    let message =
        "GET http://10.1.2.3:8080/callTool?server=srvA&tool=shell&args=%7B%7D&apiKey=akm-secret-1 timed out";
    let out = redact(message);
    assert!(!out.contains("akm-secret-1"));
    assert!(out.contains(&format!("apiKey={REDACTED}")));
    assert!(out.contains("tool=shell"), "unrelated params survive");
}

#[test]
fn bearer_header_is_masked() {
    let out = redact("request failed; header was 'Authorization: Bearer sk.123-abc'");
    assert!(!out.contains("sk.123-abc"));
    assert!(out.contains(&format!("Bearer {REDACTED}")));
}

#[test]
fn raw_secret_is_masked_anywhere() {
    let out = redact_with_secret("presigned url https://oss/x?sig=akm-raw failed", "akm-raw");
    assert!(!out.contains("akm-raw"));
}

#[test]
fn both_forms_in_one_message() {
    let out = redact_with_secret(
        "Bearer topsecret rejected; retried with apiKey=topsecret",
        "topsecret",
    );
    assert!(!out.contains("topsecret"));
}

#[test]
fn clean_messages_pass_through() {
    assert_eq!(redact("nothing sensitive here"), "nothing sensitive here");
}
