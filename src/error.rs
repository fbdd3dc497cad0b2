//! Error types for Aula

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Application-level error code the portal API sends when an access token has
/// merely expired and can be exchanged using the refresh token.
pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";

/// Raised locally when a refresh is required but no refresh token is stored.
pub const NO_REFRESH_TOKEN: &str = "NO_REFRESH_TOKEN";

/// Raised locally when the transport failed before a response arrived.
pub const NETWORK_ERROR: &str = "NETWORK_ERROR";

/// Raised locally when a response body could not be decoded.
pub const INVALID_RESPONSE: &str = "INVALID_RESPONSE";

/// Raised locally when the task driving a refresh went away before finishing.
pub const REFRESH_ABANDONED: &str = "REFRESH_ABANDONED";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found. Run 'aula init' first.")]
    ConfigNotFound,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{0}")]
    Api(ApiError),

    #[error("Not logged in. Run 'aula login' first.")]
    NotAuthenticated,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Token decode error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Other(String),
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Error::Api(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl Error {
    /// Normalize any error into the `{ message, errorCode, status }` shape
    /// callers display to users.
    pub fn to_api_error(&self) -> ApiError {
        match self {
            Error::Api(err) => err.clone(),
            Error::Network(err) => ApiError {
                message: err.to_string(),
                error_code: Some(NETWORK_ERROR.to_string()),
                status: err.status().map(|s| s.as_u16()),
            },
            other => ApiError::new(other.to_string()),
        }
    }

    /// The HTTP status attached to this error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(err) => err.status,
            Error::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Broad classification of a failed API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was received
    Network,
    /// 4xx with a server-supplied message
    Client,
    /// 401 carrying `TOKEN_EXPIRED`
    AuthExpired,
    /// Any other 401
    AuthInvalid,
    /// 5xx
    Server,
}

/// Normalized API failure.
///
/// This is the shape every non-recovered error takes on its way back to the
/// caller. It is `Clone` so a single refresh failure can be handed to every
/// request waiting on that refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_code: None,
            status: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Build an error from a non-success HTTP response body.
    ///
    /// The portal answers errors with `{ success: false, message, errorCode }`;
    /// some gateways use `error` instead of `message`. Anything unparseable
    /// falls back to the canonical status reason.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ErrorBody {
            message: Option<String>,
            error: Option<String>,
            error_code: Option<String>,
            code: Option<String>,
        }

        let parsed = serde_json::from_str::<ErrorBody>(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|b| b.message.clone().or_else(|| b.error.clone()))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
        let error_code = parsed.and_then(|b| b.error_code.or(b.code));

        Self {
            message,
            error_code,
            status: Some(status.as_u16()),
        }
    }

    pub fn invalid_response(status: StatusCode, detail: impl fmt::Display) -> Self {
        Self::new(format!("Invalid API response: {}", detail))
            .with_code(INVALID_RESPONSE)
            .with_status(status.as_u16())
    }

    pub fn missing_refresh_token() -> Self {
        Self::new("No refresh token available")
            .with_code(NO_REFRESH_TOKEN)
            .with_status(401)
    }

    pub fn refresh_abandoned() -> Self {
        Self::new("Token refresh was abandoned before completing").with_code(REFRESH_ABANDONED)
    }

    pub fn is_token_expired(&self) -> bool {
        self.status == Some(401) && self.error_code.as_deref() == Some(TOKEN_EXPIRED)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    pub fn kind(&self) -> ErrorKind {
        match self.status {
            None => ErrorKind::Network,
            Some(401) if self.is_token_expired() => ErrorKind::AuthExpired,
            Some(401) => ErrorKind::AuthInvalid,
            Some(s) if s >= 500 => ErrorKind::Server,
            Some(_) => ErrorKind::Client,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.error_code) {
            (Some(status), Some(code)) => write!(f, "{} ({}, HTTP {})", self.message, code, status),
            (Some(status), None) => write!(f, "{} (HTTP {})", self.message, status),
            (None, Some(code)) => write!(f, "{} ({})", self.message, code),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_reads_message_and_code() {
        let err = ApiError::from_response(
            StatusCode::UNAUTHORIZED,
            r#"{"success":false,"message":"Token expired","errorCode":"TOKEN_EXPIRED"}"#,
        );
        assert_eq!(err.message, "Token expired");
        assert_eq!(err.status, Some(401));
        assert!(err.is_token_expired());
        assert_eq!(err.kind(), ErrorKind::AuthExpired);
    }

    #[test]
    fn test_from_response_falls_back_to_reason() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(err.message, "Bad Gateway");
        assert_eq!(err.error_code, None);
        assert_eq!(err.kind(), ErrorKind::Server);
    }

    #[test]
    fn test_other_unauthorized_is_not_expired() {
        let err = ApiError::from_response(
            StatusCode::UNAUTHORIZED,
            r#"{"message":"Invalid token","errorCode":"INVALID_TOKEN"}"#,
        );
        assert!(!err.is_token_expired());
        assert_eq!(err.kind(), ErrorKind::AuthInvalid);
    }

    #[test]
    fn test_error_field_used_when_message_missing() {
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, r#"{"error":"Title is required"}"#);
        assert_eq!(err.message, "Title is required");
        assert_eq!(err.kind(), ErrorKind::Client);
    }

    #[test]
    fn test_normalize_non_api_error() {
        let err = Error::InvalidInput("rating must be between 1 and 5".to_string());
        let api = err.to_api_error();
        assert_eq!(api.status, None);
        assert!(api.message.contains("rating must be between 1 and 5"));
    }

    #[test]
    fn test_display_includes_code_and_status() {
        let err = ApiError::new("Nope").with_code("FORBIDDEN").with_status(403);
        assert_eq!(err.to_string(), "Nope (FORBIDDEN, HTTP 403)");
    }
}
