//! Purpose: Request and response shapes for the S.EE HTTP API.
//! Exports: request structs, response payloads, `Envelope`, `Ack`.
//! Role: Serde boundary between the client and the JSON wire format.
//! Invariants: Optional request fields are omitted from the JSON body when unset.
//! Invariants: Unknown response fields are kept so JSON output stays lossless.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default short domain used by link and text commands.
pub const DEFAULT_DOMAIN: &str = "s.ee";

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub(crate) fn is_success(&self) -> bool {
        matches!(self.code, None | Some(0) | Some(200))
    }
}

/// Acknowledgement returned by update and delete endpoints.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Ack {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct DomainList {
    #[serde(default)]
    pub domains: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct TagList {
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct CreateShortUrlRequest {
    pub target_url: String,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tag_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_redirect_url: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct UpdateShortUrlRequest {
    pub domain: String,
    pub slug: String,
    pub target_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SlugRef {
    pub domain: String,
    pub slug: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct CreateTextRequest {
    pub content: String,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tag_ids: Vec<i64>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct UpdateTextRequest {
    pub domain: String,
    pub slug: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A created short link or paste.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ShortLink {
    #[serde(default)]
    pub short_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slug: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct UploadedFile {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub delete: String,
    #[serde(default)]
    pub page: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
