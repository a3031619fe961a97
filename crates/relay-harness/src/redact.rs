//! Best-effort masking of secrets in shell commands before they are shown.
//!
//! Only two shapes are recognised: `UPPER_CASE_NAME=value` assignments and
//! `Authorization: Bearer <token>` headers. Anything else passes through;
//! missed secrets are a known limitation, not an error.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// Replacement for redacted values.
pub const MASK: &str = "***";

static ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b([A-Z_][A-Z0-9_]*)=("[^"]*"|'[^']*'|[^\s;&|]+)"#)
        .expect("assignment pattern is valid")
});

static BEARER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(authorization:\s*bearer\s+)[^\s'"]+"#).expect("bearer pattern is valid")
});

/// Masks assignment values and bearer tokens in `text`.
pub fn redact_secrets(text: &str) -> Cow<'_, str> {
    let masked = ASSIGNMENT.replace_all(text, format!("${{1}}={MASK}").as_str());
    if !BEARER.is_match(&masked) {
        return masked;
    }
    Cow::Owned(
        BEARER
            .replace_all(&masked, format!("${{1}}{MASK}").as_str())
            .into_owned(),
    )
}
