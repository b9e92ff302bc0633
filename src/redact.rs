//! Credential redaction for error messages and log output.
//!
//! The bearer credential travels in `Authorization` headers on control-plane
//! calls and as an `apiKey` query parameter on VPC agent calls, so either
//! form can leak into transport error strings. Everything user-visible is
//! passed through here first.

use std::sync::OnceLock;

use regex::Regex;

/// Replacement marker for redacted credential material.
pub const REDACTED: &str = "***";

#[allow(clippy::expect_used)]
fn api_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(api[_-]?key=)[^&\s'\x22]+").expect("static pattern compiles")
    })
}

#[allow(clippy::expect_used)]
fn bearer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(bearer\s+)[A-Za-z0-9._~+/=\-]+").expect("static pattern compiles")
    })
}

/// Mask `apiKey=` query parameters and `Bearer` header values in `input`.
#[must_use]
pub fn redact(input: &str) -> String {
    let masked = api_key_pattern().replace_all(input, format!("${{1}}{REDACTED}"));
    bearer_pattern()
        .replace_all(&masked, format!("${{1}}{REDACTED}"))
        .into_owned()
}

/// [`redact`], plus masking of the raw `secret` wherever it appears.
///
/// Catches credentials embedded in URLs or payload excerpts that the
/// pattern-based pass cannot recognize.
#[must_use]
pub fn redact_with_secret(input: &str, secret: &str) -> String {
    let masked = redact(input);
    if secret.is_empty() {
        masked
    } else {
        masked.replace(secret, REDACTED)
    }
}
