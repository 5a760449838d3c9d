//! Credentials supplied to `open`

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;

/// User name and password passed to [`XmlHttpRequest::open_with`].
///
/// When present they are sent as HTTP Basic authentication unless the caller
/// set an `Authorization` header explicitly.
///
/// [`XmlHttpRequest::open_with`]: crate::XmlHttpRequest::open_with
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User name
    pub username: String,
    /// Password, empty when not given
    pub password: Option<String>,
}

impl Credentials {
    /// Create credentials
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// `Authorization` header value for Basic authentication
    pub fn to_header_value(&self) -> String {
        let credentials = format!(
            "{}:{}",
            self.username,
            self.password.as_deref().unwrap_or("")
        );
        format!("Basic {}", STANDARD.encode(credentials.as_bytes()))
    }
}

// Keep passwords out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}
