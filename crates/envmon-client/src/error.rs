//! Client error types.

use std::collections::HashMap;

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// No response was received (connect failure, timeout, reset).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Query parameters could not be encoded.
    #[error("Query encoding error: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),

    /// Server rejected the request with a 4xx status.
    #[error("Client error ({status}): {body}")]
    Client {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Server failed with a 5xx status.
    #[error("Server error ({status}): {body}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The session could not be recovered; tokens have been discarded.
    #[error("Session expired, please log in again")]
    SessionExpired {
        /// Why the refresh did not happen or did not succeed, if it was attempted.
        #[source]
        cause: Option<RefreshFailure>,
    },

    /// Login was rejected by the server.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Check if the session ended and the user must log in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::SessionExpired { .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Server { .. })
    }

    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Client { status, .. } | Error::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The `detail` message the backend attaches to most error bodies.
    pub fn detail(&self) -> Option<String> {
        let body = self.body()?;
        let parsed: DetailBody = serde_json::from_str(body).ok()?;
        Some(parsed.detail)
    }

    /// Field-keyed validation errors, as returned for rejected forms.
    ///
    /// Returns an empty map when the body is not a field error document.
    pub fn field_errors(&self) -> HashMap<String, Vec<String>> {
        let Some(body) = self.body() else {
            return HashMap::new();
        };
        let Ok(serde_json::Value::Object(fields)) = serde_json::from_str(body) else {
            return HashMap::new();
        };

        fields
            .into_iter()
            .filter_map(|(field, value)| {
                let messages = match value {
                    serde_json::Value::String(s) => vec![s],
                    serde_json::Value::Array(items) => items
                        .into_iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect(),
                    _ => return None,
                };
                Some((field, messages))
            })
            .collect()
    }

    fn body(&self) -> Option<&str> {
        match self {
            Error::Client { body, .. } | Error::Server { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Why a token refresh did not produce a new access token.
///
/// Never returned directly: callers see it as the cause of
/// [`Error::SessionExpired`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshFailure {
    /// There was no refresh token to exchange.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The refresh request got no response (including transport timeout).
    #[error("refresh request failed: {0}")]
    Network(String),

    /// The refresh endpoint answered with an error status.
    #[error("refresh rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The refresh endpoint answered with an unreadable body.
    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),

    /// The refresh task ended without producing an outcome.
    #[error("refresh task aborted: {0}")]
    Aborted(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, serde::Deserialize)]
struct DetailBody {
    detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_from_body() {
        let err = Error::Client {
            status: 403,
            body: r#"{"detail":"No tiene permiso"}"#.to_string(),
        };
        assert_eq!(err.detail().as_deref(), Some("No tiene permiso"));
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn test_field_errors() {
        let err = Error::Client {
            status: 400,
            body: r#"{"username":["ya existe"],"password":"muy corta","code":7}"#.to_string(),
        };
        let fields = err.field_errors();
        assert_eq!(fields["username"], vec!["ya existe".to_string()]);
        assert_eq!(fields["password"], vec!["muy corta".to_string()]);
        assert!(!fields.contains_key("code"));
    }

    #[test]
    fn test_field_errors_on_plain_body() {
        let err = Error::Server {
            status: 502,
            body: "Bad Gateway".to_string(),
        };
        assert!(err.field_errors().is_empty());
        assert!(err.detail().is_none());
        assert!(err.is_server_error());
    }

    #[test]
    fn test_session_expired_keeps_cause() {
        use std::error::Error as _;

        let err = Error::SessionExpired {
            cause: Some(RefreshFailure::MissingRefreshToken),
        };
        assert!(err.is_session_expired());
        assert_eq!(
            err.source().map(|s| s.to_string()).as_deref(),
            Some("no refresh token available")
        );
    }
}
