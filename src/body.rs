//! Request body types

use bytes::Bytes;
use std::borrow::Cow;

/// Outbound request content
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Empty body
    Empty,

    /// Raw bytes with content type
    Bytes {
        /// The content
        content: Bytes,
        /// Content type
        content_type: String,
    },

    /// Form-encoded data
    Form {
        /// Form fields
        fields: Vec<(Cow<'static, str>, Cow<'static, str>)>,
    },

    /// Structured value serialized as JSON
    Json {
        /// JSON value
        value: serde_json::Value,
    },
}

impl Body {
    /// Create an empty body
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Create a body from bytes
    pub fn bytes(content: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self::Bytes {
            content: content.into(),
            content_type: content_type.into(),
        }
    }

    /// Create a body from text
    pub fn text(content: impl Into<String>) -> Self {
        Self::Bytes {
            content: content.into().into(),
            content_type: "text/plain;charset=UTF-8".to_string(),
        }
    }

    /// Create a form body
    pub fn form(fields: Vec<(impl Into<Cow<'static, str>>, impl Into<Cow<'static, str>>)>) -> Self {
        Self::Form {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Create a JSON body from any serializable value
    pub fn json(value: impl serde::Serialize) -> Result<Self, crate::Error> {
        Ok(Self::Json {
            value: serde_json::to_value(value)?,
        })
    }

    /// Whether the body carries no bytes
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Bytes { content, .. } => content.is_empty(),
            Body::Form { fields } => fields.is_empty(),
            Body::Json { .. } => false,
        }
    }

    /// Content type implied by the body, if any
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Body::Empty => None,
            Body::Bytes { content_type, .. } => Some(content_type),
            Body::Form { .. } => Some("application/x-www-form-urlencoded;charset=UTF-8"),
            Body::Json { .. } => Some("application/json;charset=UTF-8"),
        }
    }

    /// Serialize the body to the bytes sent on the wire
    pub fn to_bytes(&self) -> Result<Bytes, crate::Error> {
        match self {
            Body::Empty => Ok(Bytes::new()),
            Body::Bytes { content, .. } => Ok(content.clone()),
            Body::Form { fields } => Ok(Bytes::from(encode_form_fields(fields))),
            Body::Json { value } => Ok(Bytes::from(serde_json::to_vec(value)?)),
        }
    }
}

fn encode_form_fields(fields: &[(Cow<'static, str>, Cow<'static, str>)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

// Convenience From implementations
impl From<String> for Body {
    fn from(content: String) -> Self {
        Self::text(content)
    }
}

impl From<&str> for Body {
    fn from(content: &str) -> Self {
        Self::text(content)
    }
}

impl From<Vec<u8>> for Body {
    fn from(content: Vec<u8>) -> Self {
        Self::bytes(content, "application/octet-stream")
    }
}

impl From<&[u8]> for Body {
    fn from(content: &[u8]) -> Self {
        Self::bytes(content.to_vec(), "application/octet-stream")
    }
}

impl From<Bytes> for Body {
    fn from(content: Bytes) -> Self {
        Self::bytes(content, "application/octet-stream")
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Self::Json { value }
    }
}
