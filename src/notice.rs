//! Purpose: Define a stable, structured schema for non-fatal stderr notices.
//! Exports: `Notice`, `notice_json`, `notice_time_now`.
//! Role: Reports per-item batch failures and skipped inputs without aborting the command.
//! Invariants: Notices never alter stdout payloads.
//! Invariants: JSON schema is additive-only.
use serde_json::{Map, Value, json};
use std::time::{SystemTime, UNIX_EPOCH};
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: String,
    pub time: String,
    pub cmd: String,
    /// Display name of the affected item, or empty for command-level notices.
    pub item: String,
    pub message: String,
    pub details: Map<String, Value>,
}

pub fn notice_json(notice: &Notice) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(notice.kind));
    inner.insert("time".to_string(), json!(notice.time));
    inner.insert("cmd".to_string(), json!(notice.cmd));
    if !notice.item.is_empty() {
        inner.insert("item".to_string(), json!(notice.item));
    }
    inner.insert("message".to_string(), json!(notice.message));
    inner.insert("details".to_string(), Value::Object(notice.details.clone()));

    let mut outer = Map::new();
    outer.insert("notice".to_string(), Value::Object(inner));
    Value::Object(outer)
}

/// RFC 3339 timestamp for notice records.
pub fn notice_time_now() -> Option<String> {
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

#[cfg(test)]
mod tests {
    use super::{Notice, notice_json, notice_time_now};
    use serde_json::{Map, Value};

    #[test]
    fn notice_json_has_required_fields() {
        let mut details = Map::new();
        details.insert("index".to_string(), Value::from(1));

        let notice = Notice {
            kind: "upload_failed".to_string(),
            time: "2026-02-01T00:00:00Z".to_string(),
            cmd: "file upload".to_string(),
            item: "b.txt".to_string(),
            message: "quota exceeded".to_string(),
            details,
        };

        let value = notice_json(&notice);
        let obj = value
            .get("notice")
            .and_then(|v| v.as_object())
            .expect("notice object");

        assert_eq!(
            obj.get("kind").and_then(|v| v.as_str()),
            Some("upload_failed")
        );
        assert_eq!(obj.get("cmd").and_then(|v| v.as_str()), Some("file upload"));
        assert_eq!(obj.get("item").and_then(|v| v.as_str()), Some("b.txt"));
        assert_eq!(
            obj.get("message").and_then(|v| v.as_str()),
            Some("quota exceeded")
        );
        assert!(obj.get("details").and_then(|v| v.as_object()).is_some());
    }

    #[test]
    fn empty_item_is_omitted() {
        let notice = Notice {
            kind: "summary".to_string(),
            time: "t".to_string(),
            cmd: "file upload".to_string(),
            item: String::new(),
            message: "done".to_string(),
            details: Map::new(),
        };
        let value = notice_json(&notice);
        assert!(value["notice"].get("item").is_none());
    }

    #[test]
    fn notice_time_is_rfc3339() {
        let now = notice_time_now().expect("time");
        assert!(now.contains('T'));
        assert!(time::OffsetDateTime::parse(
            &now,
            &time::format_description::well_known::Rfc3339
        )
        .is_ok());
    }
}
