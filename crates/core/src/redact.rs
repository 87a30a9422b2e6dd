//! Sensitive-data redaction applied before a value is written to a journal
//! entry, checkpoint, or any other audit-adjacent sink.
//!
//! Grounded in the original system's `tests/test_pii_filter.py`: redacts
//! email addresses, phone numbers, and API-key-shaped substrings. This is
//! the sanitisation *step*, not the audit log service itself — the audit
//! log's storage and query surface remains an external collaborator.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid regex")
});

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b").expect("valid regex")
});

// API-key-shaped: a long run of alphanumerics (>=20 chars), optionally with
// a recognizable provider prefix such as `sk-`.
static API_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(sk-[A-Za-z0-9]{16,}|[A-Za-z0-9_-]{32,})\b").expect("valid regex")
});

/// Redact email addresses, phone numbers, and API-key-shaped substrings from
/// `text`, replacing each match with a type-tagged placeholder.
#[must_use]
pub fn redact(text: &str) -> String {
    let redacted = EMAIL.replace_all(text, "[REDACTED_EMAIL]");
    let redacted = PHONE.replace_all(&redacted, "[REDACTED_PHONE]");
    let redacted = API_KEY.replace_all(&redacted, "[REDACTED_KEY]");
    redacted.into_owned()
}

/// Recursively redact every string leaf of a JSON value, preserving shape.
#[must_use]
pub fn redact_json(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => serde_json::Value::String(redact(s)),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(redact_json).collect())
        }
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_json(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Recursively redact only the string leaves stored under a key named in
/// `fields`, leaving every other value (ids, timestamps, booleans, numbers)
/// untouched. Used where blanket leaf redaction would corrupt structured
/// fields such as a UUID.
#[must_use]
pub fn redact_json_fields(value: &serde_json::Value, fields: &[&str]) -> serde_json::Value {
    match value {
        serde_json::Value::Array(items) => serde_json::Value::Array(
            items.iter().map(|v| redact_json_fields(v, fields)).collect(),
        ),
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let redacted = if fields.contains(&k.as_str()) {
                        match v {
                            serde_json::Value::String(s) => serde_json::Value::String(redact(s)),
                            other => redact_json_fields(other, fields),
                        }
                    } else {
                        redact_json_fields(v, fields)
                    };
                    (k.clone(), redacted)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_email() {
        let out = redact("contact me at jane.doe@example.com please");
        assert!(out.contains("[REDACTED_EMAIL]"));
        assert!(!out.contains("jane.doe@example.com"));
    }

    #[test]
    fn redacts_phone() {
        let out = redact("call 555-123-4567 now");
        assert!(out.contains("[REDACTED_PHONE]"));
    }

    #[test]
    fn redacts_api_key_shaped_token() {
        let out = redact("key=sk-abcdefghijklmnopqrstuvwxyz1234");
        assert!(out.contains("[REDACTED_KEY]"));
    }

    #[test]
    fn leaves_ordinary_text_untouched() {
        let out = redact("the quick brown fox");
        assert_eq!(out, "the quick brown fox");
    }

    #[test]
    fn redact_json_preserves_shape() {
        let value = serde_json::json!({
            "email": "a@b.com",
            "nested": ["safe", "x@y.com"],
            "count": 3,
        });
        let redacted = redact_json(&value);
        assert_eq!(redacted["email"], serde_json::json!("[REDACTED_EMAIL]"));
        assert_eq!(redacted["count"], serde_json::json!(3));
        assert_eq!(redacted["nested"][0], serde_json::json!("safe"));
    }

    #[test]
    fn redact_json_fields_only_touches_named_keys() {
        let value = serde_json::json!({
            "node_id": "550e8400-e29b-41d4-a716-446655440000",
            "error": "contact jane.doe@example.com",
        });
        let redacted = redact_json_fields(&value, &["error", "reason"]);
        assert_eq!(
            redacted["node_id"],
            serde_json::json!("550e8400-e29b-41d4-a716-446655440000")
        );
        assert_eq!(redacted["error"], serde_json::json!("[REDACTED_EMAIL]"));
    }
}
