//! Purpose: Content-based media-type sniffing and the text-only gate for paste content.
//! Exports: `MediaSniffer`, `DefaultSniffer`, `Verdict`, `sniff`, `ensure_text_content`,
//! `decode_text`, `ensure_not_blank`, `is_allowed_text_media_type`, `media_type_essence`.
//! Role: Content Validator for text-class destinations; file uploads never pass through here.
//! Invariants: Sniffing only looks at bytes (never names or declared types) and never mutates them.
//! Invariants: Accepted types are `text/*` plus a fixed allow-list of textual application types.
//! Invariants: Accepted content decodes by its sniffed charset; UTF-8 input is passed through unchanged.
use bstr::ByteSlice;

use super::error::{Error, ErrorKind};

/// Bytes inspected when classifying content.
pub const SNIFF_LIMIT: usize = 3072;

const ALLOWED_APPLICATION_TYPES: &[&str] = &[
    "application/json",
    "application/xml",
    "application/javascript",
    "application/x-sh",
    "application/x-httpd-php",
    "application/x-yaml",
];

/// Detects a media type from raw bytes.
pub trait MediaSniffer {
    fn detect(&self, bytes: &[u8]) -> String;
}

impl<F> MediaSniffer for F
where
    F: Fn(&[u8]) -> String,
{
    fn detect(&self, bytes: &[u8]) -> String {
        self(bytes)
    }
}

/// Text heuristic for clean UTF-8, magic-number detection via `infer` for everything else.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultSniffer;

impl MediaSniffer for DefaultSniffer {
    fn detect(&self, bytes: &[u8]) -> String {
        let sample = sniff_window(bytes);
        // Several signatures are short ASCII words ("BM", "ID3", "%PDF") that open ordinary prose.
        if utf16_bom(sample).is_some() || is_clean_utf8(sample) {
            return detect_textual(bytes).to_string();
        }
        if let Some(kind) = infer::get(bytes) {
            return kind.mime_type().to_string();
        }
        detect_textual(bytes).to_string()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Verdict {
    pub accepted: bool,
    /// Essence only, e.g. `text/plain`.
    pub media_type: String,
    /// Lowercased `charset` parameter of the detected type, when present.
    pub charset: Option<String>,
}

fn sniff_window(bytes: &[u8]) -> &[u8] {
    &bytes[..bytes.len().min(SNIFF_LIMIT)]
}

fn utf16_bom(sample: &[u8]) -> Option<&'static str> {
    if sample.starts_with(&[0xFF, 0xFE]) {
        return Some("utf-16le");
    }
    if sample.starts_with(&[0xFE, 0xFF]) {
        return Some("utf-16be");
    }
    None
}

fn is_clean_utf8(sample: &[u8]) -> bool {
    !sample.iter().any(|byte| is_binary_control(*byte)) && is_utf8_prefix(sample)
}

fn detect_textual(bytes: &[u8]) -> &'static str {
    let sample = sniff_window(bytes);
    match utf16_bom(sample) {
        Some("utf-16le") => return "text/plain; charset=utf-16le",
        Some(_) => return "text/plain; charset=utf-16be",
        None => {}
    }
    if sample.iter().any(|byte| is_binary_control(*byte)) {
        return "application/octet-stream";
    }
    if !is_utf8_prefix(sample) {
        return "text/plain; charset=iso-8859-1";
    }

    let head = sample.trim_start_with(|ch| ch.is_whitespace() || ch == '\u{feff}');
    if head.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }
    if starts_with_ignore_case(head, b"<!doctype html") || starts_with_ignore_case(head, b"<html")
    {
        return "text/html; charset=utf-8";
    }
    if head.starts_with(b"<?php") {
        return "text/x-php";
    }
    if head.starts_with(b"#!") {
        let line = head.lines().next().unwrap_or_default();
        if line.contains_str("python") {
            return "text/x-python";
        }
        if line.contains_str("node") {
            return "application/javascript";
        }
        if line.contains_str("sh") {
            return "text/x-shellscript";
        }
    }
    if (head.starts_with(b"{") || head.starts_with(b"["))
        && serde_json::from_slice::<serde_json::Value>(bytes).is_ok()
    {
        return "application/json";
    }
    "text/plain; charset=utf-8"
}

// NUL and C0 controls other than tab, newline, form feed, carriage return and escape.
fn is_binary_control(byte: u8) -> bool {
    matches!(byte, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

// A sample cut at the sniff limit may end inside a multi-byte sequence.
fn is_utf8_prefix(sample: &[u8]) -> bool {
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        Err(err) => err.error_len().is_none() && sample.len() == SNIFF_LIMIT,
    }
}

fn starts_with_ignore_case(haystack: &[u8], prefix: &[u8]) -> bool {
    haystack.len() >= prefix.len() && haystack[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Media type without parameters: `text/plain; charset=utf-8` becomes `text/plain`.
pub fn media_type_essence(media_type: &str) -> &str {
    match media_type.split_once(';') {
        Some((essence, _)) => essence.trim(),
        None => media_type.trim(),
    }
}

fn charset_param(media_type: &str) -> Option<String> {
    media_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Some(value.trim().trim_matches('"').to_ascii_lowercase())
    })
}

pub fn is_allowed_text_media_type(media_type: &str) -> bool {
    media_type.starts_with("text/") || ALLOWED_APPLICATION_TYPES.contains(&media_type)
}

pub fn sniff(bytes: &[u8], sniffer: &dyn MediaSniffer) -> Verdict {
    let detected = sniffer.detect(bytes);
    let media_type = media_type_essence(&detected).to_string();
    let charset = charset_param(&detected);
    let accepted = is_allowed_text_media_type(&media_type);
    tracing::debug!(media_type = %media_type, charset = ?charset, accepted, "sniffed content");
    Verdict {
        accepted,
        media_type,
        charset,
    }
}

/// Reject content whose sniffed type is not textual.
pub fn ensure_text_content(bytes: &[u8], sniffer: &dyn MediaSniffer) -> Result<Verdict, Error> {
    let verdict = sniff(bytes, sniffer);
    if verdict.accepted {
        return Ok(verdict);
    }
    Err(Error::new(ErrorKind::NonTextContent)
        .with_message(format!(
            "non-text content detected ({}); only text input is allowed",
            verdict.media_type
        ))
        .with_hint("Use `see file upload` for binary files.")
        .with_media_type(verdict.media_type))
}

/// Decode accepted content into a string according to the verdict's charset.
///
/// UTF-8 (or no charset) must be valid as-is; Latin-1 and BOM-marked UTF-16
/// are transcoded. Any other charset is rejected as `NonTextContent`.
pub fn decode_text(bytes: Vec<u8>, verdict: &Verdict) -> Result<String, Error> {
    let charset = verdict.charset.as_deref().unwrap_or("utf-8");
    let undecodable = |detail: &str| {
        Error::new(ErrorKind::NonTextContent)
            .with_message(format!(
                "content is not valid {charset} text ({}; {detail})",
                verdict.media_type
            ))
            .with_media_type(format!("{}; charset={charset}", verdict.media_type))
    };
    match charset {
        "utf-8" | "us-ascii" => String::from_utf8(bytes)
            .map_err(|err| undecodable("invalid byte sequence").with_source(err)),
        "iso-8859-1" | "latin1" => Ok(bytes.iter().copied().map(char::from).collect()),
        "utf-16le" => decode_utf16(&bytes, &[0xFF, 0xFE], u16::from_le_bytes)
            .ok_or_else(|| undecodable("invalid UTF-16 sequence")),
        "utf-16be" => decode_utf16(&bytes, &[0xFE, 0xFF], u16::from_be_bytes)
            .ok_or_else(|| undecodable("invalid UTF-16 sequence")),
        _ => Err(undecodable("unsupported charset")),
    }
}

fn decode_utf16(bytes: &[u8], bom: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    let body = bytes.strip_prefix(bom).unwrap_or(bytes);
    if body.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

/// Whitespace-only content sniffs as text, so it is checked separately.
pub fn ensure_not_blank(bytes: &[u8]) -> Result<(), Error> {
    if bytes.trim().is_empty() {
        return Err(Error::new(ErrorKind::EmptyContent).with_message("content is empty"));
    }
    Ok(())
}
