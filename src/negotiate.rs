//! Content negotiation and response decoding
//!
//! Three pure steps turn a finished exchange into the value exposed as
//! `response`:
//!
//! 1. [`select_preferred_type`] picks one media type out of a header value
//!    that may list several with quality weights.
//! 2. [`classify_content_type`] maps that media type to a [`ResponseKind`].
//! 3. [`decode_body`] converts the transport payload into a [`ResponseBody`].
//!
//! Decoding never fails: undecodable text falls back to Latin-1 and
//! unparsable JSON degrades to text.

use crate::backend::Payload;
use crate::{Error, Result};
use bytes::Bytes;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Media types decoded as text
const TEXT_TYPES: [&str; 5] = [
    "text/plain",
    "application/xml",
    "application/rss+xml",
    "text/html",
    "text/xml",
];

/// Text media types that are exposed as documents
const DOCUMENT_TYPES: [&str; 2] = ["text/html", "text/xml"];

const QUALITY_MARKER: &str = ";q=";

/// Caller-declared `responseType`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResponseType {
    /// `""`, treated as text
    #[default]
    Empty,
    /// `"text"`
    Text,
    /// `"json"`
    Json,
    /// `"document"`
    Document,
    /// `"arraybuffer"`
    ArrayBuffer,
    /// `"blob"`
    Blob,
}

impl ResponseType {
    /// Property value as seen by callers
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Empty => "",
            ResponseType::Text => "text",
            ResponseType::Json => "json",
            ResponseType::Document => "document",
            ResponseType::ArrayBuffer => "arraybuffer",
            ResponseType::Blob => "blob",
        }
    }

    /// Representation used when the media type is not recognized
    pub fn fallback_kind(&self) -> ResponseKind {
        match self {
            ResponseType::Empty | ResponseType::Text => ResponseKind::Text,
            ResponseType::Json => ResponseKind::Json,
            ResponseType::Document => ResponseKind::Document,
            ResponseType::ArrayBuffer => ResponseKind::ArrayBuffer,
            ResponseType::Blob => ResponseKind::Blob,
        }
    }
}

impl FromStr for ResponseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => Ok(ResponseType::Empty),
            "text" => Ok(ResponseType::Text),
            "json" => Ok(ResponseType::Json),
            "document" => Ok(ResponseType::Document),
            "arraybuffer" => Ok(ResponseType::ArrayBuffer),
            "blob" => Ok(ResponseType::Blob),
            other => Err(Error::UnsupportedResponseType(other.to_string())),
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Representation chosen for a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// Parsed JSON value
    Json,
    /// Decoded text
    Text,
    /// Decoded markup text
    Document,
    /// Raw bytes
    ArrayBuffer,
    /// Raw bytes, opaque
    Blob,
}

impl ResponseKind {
    /// Whether `responseText` is populated for this kind
    pub fn has_text(&self) -> bool {
        matches!(
            self,
            ResponseKind::Json | ResponseKind::Text | ResponseKind::Document
        )
    }
}

/// Decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Parsed JSON value
    Json(serde_json::Value),
    /// Text
    Text(String),
    /// Markup text
    Document(String),
    /// Raw bytes for `arraybuffer`
    Binary(Bytes),
    /// Raw bytes for `blob`
    Blob(Bytes),
}

impl Default for ResponseBody {
    fn default() -> Self {
        ResponseBody::Text(String::new())
    }
}

impl ResponseBody {
    /// Kind of this body
    pub fn kind(&self) -> ResponseKind {
        match self {
            ResponseBody::Json(_) => ResponseKind::Json,
            ResponseBody::Text(_) => ResponseKind::Text,
            ResponseBody::Document(_) => ResponseKind::Document,
            ResponseBody::Binary(_) => ResponseKind::ArrayBuffer,
            ResponseBody::Blob(_) => ResponseKind::Blob,
        }
    }

    /// Text content for text and document bodies
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) | ResponseBody::Document(text) => Some(text),
            _ => None,
        }
    }

    /// JSON value for JSON bodies
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Raw bytes for binary bodies
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseBody::Binary(bytes) | ResponseBody::Blob(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Result of [`decode_body`]
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBody {
    /// Native representation
    pub body: ResponseBody,
    /// Textual rendering, only for text, JSON and document kinds
    pub text: Option<String>,
}

/// Pick the most preferred entry of a comma separated media type list.
///
/// Entries without a `;q=` weight keep their relative order and always rank
/// ahead of weighted entries, which are ordered by descending quality. An
/// unweighted entry is never compared numerically against a weighted one.
pub fn select_preferred_type(header_value: &str) -> String {
    let mut unweighted = Vec::new();
    let mut weighted = Vec::new();
    for entry in header_value.split(',').map(str::trim) {
        if entry.contains(QUALITY_MARKER) {
            weighted.push(entry);
        } else {
            unweighted.push(entry);
        }
    }

    // stable sort keeps ties in header order
    weighted.sort_by(|a, b| {
        quality_of(b)
            .partial_cmp(&quality_of(a))
            .unwrap_or(Ordering::Equal)
    });

    unweighted
        .into_iter()
        .chain(weighted)
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Leading numeric part after `;q=`, 0 when it does not parse
fn quality_of(entry: &str) -> f64 {
    let Some(index) = entry.find(QUALITY_MARKER) else {
        return 0.0;
    };
    let raw = entry[index + QUALITY_MARKER.len()..].trim_start();
    let mut seen_dot = false;
    let numeric: String = raw
        .chars()
        .take_while(|c| {
            if *c == '.' && !seen_dot {
                seen_dot = true;
                true
            } else {
                c.is_ascii_digit()
            }
        })
        .collect();
    numeric.parse().unwrap_or(0.0)
}

/// Map a media type to the representation used for the body.
///
/// A missing header means text. JSON types (`application/json` and any
/// `+json` suffix) and the known textual types are recognized; anything else
/// uses the representation implied by the caller's declared `responseType`.
pub fn classify_content_type(header: Option<&str>, declared: ResponseType) -> ResponseKind {
    let essence = match header.map(media_type_essence) {
        Some(essence) if !essence.is_empty() => essence,
        _ => return ResponseKind::Text,
    };

    if essence == "application/json" || essence.ends_with("+json") {
        ResponseKind::Json
    } else if DOCUMENT_TYPES.contains(&essence.as_str()) {
        ResponseKind::Document
    } else if TEXT_TYPES.contains(&essence.as_str()) {
        ResponseKind::Text
    } else {
        declared.fallback_kind()
    }
}

/// `type/subtype` part of a media type, lower-cased
fn media_type_essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// `charset` parameter of a media type
pub fn charset_of(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

/// Decode bytes as text using the declared charset (UTF-8 by default),
/// falling back to Latin-1 when the bytes do not decode.
pub fn decode_text(raw: &[u8], charset: Option<&str>) -> String {
    let label = charset.map(|c| c.trim().to_ascii_lowercase());
    match label.as_deref() {
        Some("iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "latin-1" | "l1")
        | Some("us-ascii" | "ascii") => return latin1(raw),
        None | Some("utf-8" | "utf8") => {}
        Some(other) => {
            tracing::debug!("Unsupported charset {}, decoding as UTF-8", other);
        }
    }

    match std::str::from_utf8(raw) {
        Ok(text) => text.to_string(),
        Err(e) => {
            tracing::debug!("UTF-8 decode failed ({}), falling back to ISO-8859-1", e);
            latin1(raw)
        }
    }
}

fn latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| b as char).collect()
}

/// Parse JSON, accepting a JSONP style `callback(...)` wrapper.
pub fn parse_json(source: &str) -> std::result::Result<serde_json::Value, serde_json::Error> {
    let src = source.trim();
    match serde_json::from_str(src) {
        Ok(value) => Ok(value),
        Err(e) => match strip_padding(src) {
            Some(inner) => serde_json::from_str(inner).map_err(|_| e),
            None => Err(e),
        },
    }
}

fn strip_padding(src: &str) -> Option<&str> {
    if !src.ends_with(')') {
        return None;
    }
    let open = src.find('(')?;
    Some(&src[open + 1..src.len() - 1])
}

/// Convert a transport payload into the representation for `kind`.
pub fn decode_body(raw: Payload, kind: ResponseKind, charset: Option<&str>) -> DecodedBody {
    match kind {
        ResponseKind::Json => decode_json(raw, charset),
        ResponseKind::Text => {
            let text = payload_text(raw, charset);
            DecodedBody {
                body: ResponseBody::Text(text.clone()),
                text: Some(text),
            }
        }
        ResponseKind::Document => {
            let text = payload_text(raw, charset);
            DecodedBody {
                body: ResponseBody::Document(text.clone()),
                text: Some(text),
            }
        }
        ResponseKind::ArrayBuffer => DecodedBody {
            body: ResponseBody::Binary(payload_bytes(raw)),
            text: None,
        },
        ResponseKind::Blob => DecodedBody {
            body: ResponseBody::Blob(payload_bytes(raw)),
            text: None,
        },
    }
}

fn decode_json(raw: Payload, charset: Option<&str>) -> DecodedBody {
    let text = match raw {
        Payload::Json(value) => {
            return DecodedBody {
                text: Some(value.to_string()),
                body: ResponseBody::Json(value),
            };
        }
        other => payload_text(other, charset),
    };

    if text.trim().is_empty() {
        return DecodedBody {
            body: ResponseBody::Json(serde_json::Value::Null),
            text: Some(text),
        };
    }

    match parse_json(&text) {
        Ok(value) => DecodedBody {
            body: ResponseBody::Json(value),
            text: Some(text),
        },
        Err(e) => {
            tracing::warn!("Response declared as JSON failed to parse: {}", e);
            DecodedBody {
                body: ResponseBody::Text(text.clone()),
                text: Some(text),
            }
        }
    }
}

fn payload_text(raw: Payload, charset: Option<&str>) -> String {
    match raw {
        Payload::Bytes(bytes) => decode_text(&bytes, charset),
        Payload::Text(text) => text,
        Payload::Json(value) => value.to_string(),
    }
}

fn payload_bytes(raw: Payload) -> Bytes {
    match raw {
        Payload::Bytes(bytes) => bytes,
        Payload::Text(text) => Bytes::from(text),
        Payload::Json(value) => Bytes::from(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unweighted_entries_rank_first() {
        assert_eq!(
            select_preferred_type("text/html;q=0.9,application/json"),
            "application/json"
        );
        assert_eq!(
            select_preferred_type("text/plain, application/json;q=1.0"),
            "text/plain"
        );
    }

    #[test]
    fn test_weighted_entries_sorted_descending() {
        assert_eq!(
            select_preferred_type("text/plain;q=0.2,application/xml;q=0.8,text/html;q=0.5"),
            "application/xml;q=0.8"
        );
        // ties keep header order
        assert_eq!(
            select_preferred_type("text/xml;q=0.5,text/html;q=0.5"),
            "text/xml;q=0.5"
        );
        // unparsable quality sorts last
        assert_eq!(
            select_preferred_type("text/xml;q=abc,text/html;q=0.1"),
            "text/html;q=0.1"
        );
    }

    #[test]
    fn test_single_and_empty_values() {
        assert_eq!(
            select_preferred_type("application/json; charset=utf-8"),
            "application/json; charset=utf-8"
        );
        assert_eq!(select_preferred_type(""), "");
    }

    #[test]
    fn test_classify() {
        let declared = ResponseType::Empty;
        assert_eq!(classify_content_type(None, declared), ResponseKind::Text);
        assert_eq!(
            classify_content_type(Some("Application/JSON; charset=utf-8"), declared),
            ResponseKind::Json
        );
        assert_eq!(
            classify_content_type(Some("application/vnd.api+json"), declared),
            ResponseKind::Json
        );
        assert_eq!(
            classify_content_type(Some("text/plain"), declared),
            ResponseKind::Text
        );
        assert_eq!(
            classify_content_type(Some("application/rss+xml"), declared),
            ResponseKind::Text
        );
        assert_eq!(
            classify_content_type(Some("text/html; charset=utf-8"), declared),
            ResponseKind::Document
        );
        assert_eq!(
            classify_content_type(Some("text/xml"), declared),
            ResponseKind::Document
        );
    }

    #[test]
    fn test_classify_falls_through_to_declared_type() {
        assert_eq!(
            classify_content_type(Some("image/png"), ResponseType::ArrayBuffer),
            ResponseKind::ArrayBuffer
        );
        assert_eq!(
            classify_content_type(Some("image/png"), ResponseType::Blob),
            ResponseKind::Blob
        );
        assert_eq!(
            classify_content_type(Some("image/png"), ResponseType::Empty),
            ResponseKind::Text
        );
        // a recognized type wins over the declared one
        assert_eq!(
            classify_content_type(Some("application/json"), ResponseType::Blob),
            ResponseKind::Json
        );
    }

    #[test]
    fn test_response_type_parsing() {
        assert_eq!("".parse::<ResponseType>().unwrap(), ResponseType::Empty);
        assert_eq!(
            "arraybuffer".parse::<ResponseType>().unwrap(),
            ResponseType::ArrayBuffer
        );
        let err = "stream".parse::<ResponseType>().unwrap_err();
        assert_eq!(err.to_string(), "Response type of 'stream' not supported.");
    }

    #[test]
    fn test_charset_of() {
        assert_eq!(
            charset_of("text/html; charset=\"ISO-8859-1\""),
            Some("ISO-8859-1".to_string())
        );
        assert_eq!(charset_of("text/html;Charset=utf-8"), Some("utf-8".to_string()));
        assert_eq!(charset_of("text/html"), None);
    }

    #[test]
    fn test_decode_text_fallback() {
        assert_eq!(decode_text("héllo".as_bytes(), None), "héllo");
        // invalid UTF-8 degrades to Latin-1 instead of failing
        assert_eq!(decode_text(&[0x68, 0xE9, 0x6C], None), "hél");
        assert_eq!(decode_text(&[0xE9], Some("ISO-8859-1")), "é");
        assert_eq!(decode_text(b"plain", Some("shift_jis")), "plain");
    }

    #[test]
    fn test_decode_json_bytes() {
        let raw = Payload::Bytes(Bytes::from_static(br#"{"a":[1,2]}"#));
        let decoded = decode_body(raw, ResponseKind::Json, None);
        assert_eq!(decoded.body, ResponseBody::Json(json!({"a": [1, 2]})));
        let text = decoded.text.unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&text).unwrap(),
            json!({"a": [1, 2]})
        );
    }

    #[test]
    fn test_decode_jsonp_and_invalid_json() {
        let decoded = decode_body(
            Payload::Text("callback({\"ok\":true})".to_string()),
            ResponseKind::Json,
            None,
        );
        assert_eq!(decoded.body, ResponseBody::Json(json!({"ok": true})));

        let decoded = decode_body(
            Payload::Text("not json".to_string()),
            ResponseKind::Json,
            None,
        );
        assert_eq!(decoded.body, ResponseBody::Text("not json".to_string()));
        assert_eq!(decoded.text.as_deref(), Some("not json"));
    }

    #[test]
    fn test_decode_pre_parsed_json() {
        let value = json!({"n": 1});
        let decoded = decode_body(Payload::Json(value.clone()), ResponseKind::Json, None);
        assert_eq!(decoded.body, ResponseBody::Json(value.clone()));
        assert_eq!(decoded.text.as_deref(), Some(r#"{"n":1}"#));

        let decoded = decode_body(Payload::Json(value), ResponseKind::Text, None);
        assert_eq!(decoded.body, ResponseBody::Text(r#"{"n":1}"#.to_string()));
    }

    #[test]
    fn test_decode_binary_kinds_have_no_text() {
        let raw = Payload::Bytes(Bytes::from_static(&[0, 159, 146, 150]));
        let decoded = decode_body(raw.clone(), ResponseKind::ArrayBuffer, None);
        assert_eq!(
            decoded.body,
            ResponseBody::Binary(Bytes::from_static(&[0, 159, 146, 150]))
        );
        assert_eq!(decoded.text, None);

        let decoded = decode_body(raw, ResponseKind::Blob, None);
        assert_eq!(decoded.body.kind(), ResponseKind::Blob);
        assert!(!decoded.body.kind().has_text());
    }

    #[test]
    fn test_decode_document() {
        let raw = Payload::Bytes(Bytes::from_static(b"<p>hi</p>"));
        let decoded = decode_body(raw, ResponseKind::Document, Some("utf-8"));
        assert_eq!(decoded.body.as_text(), Some("<p>hi</p>"));
        assert_eq!(decoded.body.kind(), ResponseKind::Document);
    }
}
