use thiserror::Error;

use crate::types::FieldError;

/// Top-level error type for the `tailkit-api` crate.
///
/// Every failure of a request against the tailnet API lands in exactly one
/// of these variants. `tailkit-core` maps them into domain diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// No response was received (connection refused, DNS, TLS, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup error (custom CA could not be loaded).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Authentication ──────────────────────────────────────────────
    /// The API key cannot be sent as a header value.
    #[error("Invalid API key: {message}")]
    InvalidApiKey { message: String },

    /// 401 or 403 from the API.
    #[error("Authentication failed (HTTP {status}): {message}")]
    Authentication { status: u16, message: String },

    // ── Remote API ──────────────────────────────────────────────────
    /// 404 from the API.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Any other 4xx carrying the structured error envelope.
    #[error("Validation failed (HTTP {status}): {message}")]
    Validation {
        status: u16,
        message: String,
        fields: Vec<FieldError>,
    },

    /// 5xx from the API.
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Non-success status whose body could not be decoded as an envelope.
    #[error("Unexpected response (HTTP {status}): {body}")]
    Unexpected { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization of a success body failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A request body could not be encoded.
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl Error {
    /// HTTP status of the response that produced this error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Authentication { status, .. }
            | Self::Validation { status, .. }
            | Self::Server { status, .. }
            | Self::Unexpected { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::InvalidUrl(_)
            | Self::Tls(_)
            | Self::InvalidApiKey { .. }
            | Self::Deserialization { .. }
            | Self::Serialization { .. } => None,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the error is worth retrying at the caller's discretion.
    ///
    /// Nothing in this workspace retries on its own.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Server { .. } => true,
            _ => false,
        }
    }

    /// Field-level detail attached to a validation error.
    pub fn fields(&self) -> &[FieldError] {
        match self {
            Self::Validation { fields, .. } => fields,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_reports_404() {
        let err = Error::NotFound {
            message: "device not found".into(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_transient());
    }

    #[test]
    fn validation_exposes_fields() {
        let err = Error::Validation {
            status: 400,
            message: "invalid routes".into(),
            fields: vec![FieldError {
                field: "routes".into(),
                detail: "10.0.0.0/33 is not a prefix".into(),
            }],
        };
        assert_eq!(err.fields().len(), 1);
        assert_eq!(err.fields()[0].field, "routes");
        assert_eq!(
            err.to_string(),
            "Validation failed (HTTP 400): invalid routes"
        );
    }

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Server {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(err.is_transient());
        assert_eq!(err.status(), Some(503));
    }
}
