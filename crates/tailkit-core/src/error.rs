// ── Core error types ──
//
// Errors surfaced by resource clients and the reconciler. HTTP details are
// folded into domain variants here; the status and field-level detail stay
// available so a caller can render a complete diagnostic without going back
// to the API.

use tailkit_api::types::FieldError;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Authentication failed (HTTP {status}): {message}")]
    AuthenticationFailed { status: u16, message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    /// Rejected before sending (`status` is `None`) or by the API.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        message: String,
        fields: Vec<FieldError>,
        status: Option<u16>,
    },

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Malformed API response: {message}")]
    Decode { message: String, body: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Build a `ValidationFailed` for a single field.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::ValidationFailed {
            fields: vec![FieldError {
                field: field.to_owned(),
                detail: message.clone(),
            }],
            message,
            status: None,
        }
    }

    /// Translate an API error, naming the entity a 404 refers to.
    pub fn from_api(err: tailkit_api::Error, entity_type: &str, identifier: &str) -> Self {
        if err.is_not_found() {
            Self::NotFound {
                entity_type: entity_type.to_owned(),
                identifier: identifier.to_owned(),
            }
        } else {
            err.into()
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP status behind this error, if the API answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed { status, .. } | Self::Server { status, .. } => {
                Some(*status)
            }
            Self::NotFound { .. } => Some(404),
            Self::Api { status, .. } | Self::ValidationFailed { status, .. } => *status,
            Self::ConnectionFailed { .. }
            | Self::Timeout { .. }
            | Self::Decode { .. }
            | Self::Config { .. } => None,
        }
    }

    /// Field-level detail, empty unless this is a validation failure.
    pub fn fields(&self) -> &[FieldError] {
        match self {
            Self::ValidationFailed { fields, .. } => fields,
            _ => &[],
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tailkit_api::Error> for CoreError {
    fn from(err: tailkit_api::Error) -> Self {
        use tailkit_api::Error as ApiError;

        match err {
            ApiError::Transport(ref e) => {
                let url = e.url().map(ToString::to_string).unwrap_or_default();
                if e.is_timeout() {
                    CoreError::Timeout { url }
                } else {
                    CoreError::ConnectionFailed {
                        url,
                        reason: e.to_string(),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Tls(message) => CoreError::Config {
                message: format!("TLS setup failed: {message}"),
            },
            ApiError::InvalidApiKey { message } => CoreError::Config { message },
            ApiError::Authentication { status, message } => {
                CoreError::AuthenticationFailed { status, message }
            }
            ApiError::NotFound { message } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: message,
            },
            ApiError::Validation {
                status,
                message,
                fields,
            } => CoreError::ValidationFailed {
                message,
                fields,
                status: Some(status),
            },
            ApiError::Server { status, message } => CoreError::Server { status, message },
            ApiError::Unexpected { status, body } => CoreError::Api {
                message: body,
                status: Some(status),
            },
            ApiError::Deserialization { message, body } => CoreError::Decode { message, body },
            ApiError::Serialization { message } => CoreError::Api {
                message: format!("could not encode request: {message}"),
                status: None,
            },
        }
    }
}
