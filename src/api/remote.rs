//! Purpose: Blocking HTTP client for the S.EE content sharing API.
//! Exports: `SeeClient`, `ClientConfig`, `DEFAULT_BASE_URL`, `DEFAULT_TIMEOUT`.
//! Role: Remote collaborator for links, pastes, uploads, and listings; one synchronous call per operation.
//! Invariants: Every request carries the API key in `Authorization` and asks for JSON.
//! Invariants: Non-2xx statuses and non-success envelope codes map to structured errors.
//! Invariants: Upload payloads are sent verbatim; the client never inspects content.
#![allow(clippy::result_large_err)]

use super::message::{
    Ack, CreateShortUrlRequest, CreateTextRequest, DomainList, Envelope, ShortLink, SlugRef, Tag,
    TagList, UpdateShortUrlRequest, UpdateTextRequest, UploadedFile,
};
use crate::core::error::{Error, ErrorKind};
use multipart::client::lazy::Multipart;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

type ApiResult<T> = Result<T, Error>;

pub const DEFAULT_BASE_URL: &str = "https://s.ee/api/v1/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Clone)]
pub struct SeeClient {
    inner: Arc<SeeClientInner>,
}

struct SeeClientInner {
    base_url: Url,
    api_key: String,
    agent: ureq::Agent,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

impl SeeClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("missing API key: use --api-key or set SEE_API_KEY"));
        }
        let base_url = normalize_base_url(&config.base_url)?;
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Ok(Self {
            inner: Arc::new(SeeClientInner {
                base_url,
                api_key: config.api_key,
                agent,
            }),
        })
    }

    pub fn domains(&self) -> ApiResult<Vec<String>> {
        let list: DomainList = self.get_data(&["domains"])?;
        Ok(list.domains)
    }

    pub fn tags(&self) -> ApiResult<Vec<Tag>> {
        let list: TagList = self.get_data(&["tags"])?;
        Ok(list.tags)
    }

    pub fn create_short_url(&self, request: &CreateShortUrlRequest) -> ApiResult<ShortLink> {
        let url = build_url(&self.inner.base_url, &["shorten"])?;
        let envelope: Envelope<ShortLink> = self.request_json("POST", &url, Some(request))?;
        require_data(envelope)
    }

    pub fn update_short_url(&self, request: &UpdateShortUrlRequest) -> ApiResult<Ack> {
        let url = build_url(&self.inner.base_url, &["shorten"])?;
        self.request_ack("PUT", &url, request)
    }

    pub fn delete_short_url(&self, request: &SlugRef) -> ApiResult<Ack> {
        let url = build_url(&self.inner.base_url, &["shorten"])?;
        self.request_ack("DELETE", &url, request)
    }

    pub fn create_text(&self, request: &CreateTextRequest) -> ApiResult<ShortLink> {
        let url = build_url(&self.inner.base_url, &["text"])?;
        let envelope: Envelope<ShortLink> = self.request_json("POST", &url, Some(request))?;
        require_data(envelope)
    }

    pub fn update_text(&self, request: &UpdateTextRequest) -> ApiResult<Ack> {
        let url = build_url(&self.inner.base_url, &["text"])?;
        self.request_ack("PUT", &url, request)
    }

    pub fn delete_text(&self, request: &SlugRef) -> ApiResult<Ack> {
        let url = build_url(&self.inner.base_url, &["text"])?;
        self.request_ack("DELETE", &url, request)
    }

    /// Upload one file as `multipart/form-data` under the given display name.
    pub fn upload_file(&self, filename: &str, bytes: &[u8]) -> ApiResult<UploadedFile> {
        let url = build_url(&self.inner.base_url, &["file", "upload"])?;
        let form = encode_file_form(filename, bytes)?;
        tracing::debug!(method = "POST", url = %url, bytes = bytes.len(), "upload request");
        let response = self
            .request("POST", &url)
            .set("Content-Type", &form.content_type)
            .send_bytes(&form.body);
        let envelope: Envelope<UploadedFile> = handle_response(response)?;
        require_data(envelope)
    }

    pub fn delete_file(&self, delete_key: &str) -> ApiResult<Ack> {
        if delete_key.trim().is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("delete key must not be empty"));
        }
        let url = build_url(&self.inner.base_url, &["file", "delete", delete_key])?;
        self.request_ack::<()>("GET", &url, &())
    }

    pub fn file_domains(&self) -> ApiResult<Vec<String>> {
        let list: DomainList = self.get_data(&["file", "domains"])?;
        Ok(list.domains)
    }

    fn get_data<R: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<R> {
        let url = build_url(&self.inner.base_url, segments)?;
        let envelope: Envelope<R> = self.request_json::<(), _>("GET", &url, None)?;
        require_data(envelope)
    }

    fn request_ack<T: Serialize>(&self, method: &str, url: &Url, body: &T) -> ApiResult<Ack> {
        let body = if method == "GET" { None } else { Some(body) };
        let envelope: Envelope<serde_json::Value> = self.request_json(method, url, body)?;
        Ok(Ack {
            code: envelope.code.unwrap_or(200),
            message: envelope.message.unwrap_or_default(),
            data: envelope.data.unwrap_or(serde_json::Value::Null),
        })
    }

    fn request_json<T, R>(&self, method: &str, url: &Url, body: Option<&T>) -> ApiResult<Envelope<R>>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        tracing::debug!(method, url = %url, "api request");
        let request = self.request(method, url);
        let response = match body {
            None => request.call(),
            Some(body) => {
                let payload = serde_json::to_string(body).map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to encode request json")
                        .with_source(err)
                })?;
                request
                    .set("Content-Type", "application/json")
                    .send_string(&payload)
            }
        };
        handle_response(response)
    }

    fn request(&self, method: &str, url: &Url) -> ureq::Request {
        self.inner
            .agent
            .request(method, url.as_str())
            .set("Authorization", &self.inner.api_key)
            .set("Accept", "application/json")
    }
}

fn handle_response<R: DeserializeOwned>(
    response: Result<ureq::Response, ureq::Error>,
) -> ApiResult<Envelope<R>> {
    match response {
        Ok(resp) => {
            let status = resp.status();
            let envelope: Envelope<R> = read_json_response(resp)?;
            if !envelope.is_success() {
                return Err(envelope_error(
                    status,
                    envelope.code.unwrap_or_default(),
                    envelope.message,
                ));
            }
            Ok(envelope)
        }
        Err(ureq::Error::Status(code, resp)) => Err(parse_error_response(code, resp)),
        Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
            .with_message("request failed")
            .with_source(err)),
    }
}

// A 2xx response can still carry a failure code in its envelope.
fn envelope_error(status: u16, code: i64, message: Option<String>) -> Error {
    let kind = u16::try_from(code)
        .map(error_kind_from_status)
        .unwrap_or(ErrorKind::Remote);
    let message = message.unwrap_or_else(|| format!("request failed with code {code}"));
    Error::new(kind).with_message(message).with_status(status)
}

struct UploadForm {
    content_type: String,
    body: Vec<u8>,
}

/// Encode `bytes` as the `file` part of a `multipart/form-data` body.
fn encode_file_form(filename: &str, bytes: &[u8]) -> ApiResult<UploadForm> {
    let encode_err = |err: std::io::Error| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode upload form")
            .with_source(err)
    };
    let mut form = Multipart::new();
    form.add_stream("file", Cursor::new(bytes), Some(filename), None);
    let mut prepared = form.prepare().map_err(|err| encode_err(err.error))?;
    let content_type = format!("multipart/form-data; boundary={}", prepared.boundary());
    let mut body = Vec::with_capacity(bytes.len() + 256);
    prepared.read_to_end(&mut body).map_err(encode_err)?;
    Ok(UploadForm { content_type, body })
}

fn require_data<R>(envelope: Envelope<R>) -> ApiResult<R> {
    envelope.data.ok_or_else(|| {
        Error::new(ErrorKind::Internal).with_message("response is missing the data field")
    })
}

pub(crate) fn normalize_base_url(raw: &str) -> ApiResult<Url> {
    let mut url = Url::parse(raw.trim()).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid API base url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(
            Error::new(ErrorKind::Usage).with_message("API base url must use http or https scheme")
        );
    }
    if url.cannot_be_a_base() {
        return Err(Error::new(ErrorKind::Usage).with_message("API base url cannot be a base"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Append path segments to the base url, percent-encoding each one.
pub(crate) fn build_url(base_url: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| Error::new(ErrorKind::Usage).with_message("API base url cannot be a base"))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

fn read_json_response<R>(response: ureq::Response) -> ApiResult<R>
where
    R: DeserializeOwned,
{
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("invalid response json")
            .with_source(err)
    })
}

fn parse_error_response(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    let kind = error_kind_from_status(status);
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| {
            parsed.message.map(|message| match parsed.code {
                Some(code) if i64::from(status) != code => format!("{message} (code {code})"),
                _ => message,
            })
        })
        .unwrap_or_else(|| format!("remote error status {status}"));
    Error::new(kind).with_message(message).with_status(status)
}

fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::Permission,
        404 => ErrorKind::NotFound,
        _ => ErrorKind::Remote,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ClientConfig, SeeClient, build_url, encode_file_form, envelope_error,
        error_kind_from_status, normalize_base_url,
    };
    use crate::core::error::ErrorKind;

    #[test]
    fn normalize_base_url_keeps_api_prefix() {
        let url = normalize_base_url("https://s.ee/api/v1").expect("url");
        assert_eq!(url.as_str(), "https://s.ee/api/v1/");

        let url = normalize_base_url("http://localhost:8080").expect("url");
        assert_eq!(url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn normalize_base_url_rejects_other_schemes() {
        let err = normalize_base_url("ftp://s.ee/").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let err = normalize_base_url("not a url").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn build_url_appends_and_escapes_segments() {
        let base = normalize_base_url("https://s.ee/api/v1/").expect("url");
        let url = build_url(&base, &["file", "delete", "a b/c"]).expect("url");
        assert_eq!(url.as_str(), "https://s.ee/api/v1/file/delete/a%20b%2Fc");

        let root = normalize_base_url("http://localhost:9000").expect("url");
        let url = build_url(&root, &["tags"]).expect("url");
        assert_eq!(url.as_str(), "http://localhost:9000/tags");
    }

    #[test]
    fn status_codes_map_to_kinds() {
        assert_eq!(error_kind_from_status(401), ErrorKind::Permission);
        assert_eq!(error_kind_from_status(403), ErrorKind::Permission);
        assert_eq!(error_kind_from_status(404), ErrorKind::NotFound);
        assert_eq!(error_kind_from_status(422), ErrorKind::Remote);
        assert_eq!(error_kind_from_status(502), ErrorKind::Remote);
    }

    #[test]
    fn client_requires_api_key() {
        let err = SeeClient::new(ClientConfig::new("  ")).err().expect("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn blank_delete_key_is_rejected_locally() {
        let mut config = ClientConfig::new("key");
        config.base_url = "http://127.0.0.1:9/".to_string();
        let client = SeeClient::new(config).expect("client");
        let err = client.delete_file(" ").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn envelope_codes_map_like_statuses() {
        let err = envelope_error(200, 401, Some("invalid api key".to_string()));
        assert_eq!(err.kind(), ErrorKind::Permission);
        assert_eq!(err.status(), Some(200));
        assert_eq!(err.message(), Some("invalid api key"));

        assert_eq!(envelope_error(200, 403, None).kind(), ErrorKind::Permission);
        assert_eq!(envelope_error(200, 404, None).kind(), ErrorKind::NotFound);

        let err = envelope_error(200, 500, None);
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(err.message(), Some("request failed with code 500"));
        assert_eq!(envelope_error(200, -1, None).kind(), ErrorKind::Remote);
    }

    #[test]
    fn upload_form_carries_filename_and_raw_bytes() {
        let payload = [0x00u8, 0xFF, 0x0D, 0x0A, 0x2D, 0x2D];
        let form = encode_file_form("blob.bin", &payload).expect("form");
        let boundary = form
            .content_type
            .strip_prefix("multipart/form-data; boundary=")
            .expect("boundary");

        let text = String::from_utf8_lossy(&form.body);
        assert!(text.contains(boundary));
        assert!(text.contains("name=\"file\""));
        assert!(text.contains("filename=\"blob.bin\""));
        assert!(
            form.body
                .windows(payload.len())
                .any(|window| window == &payload[..])
        );
    }
}
