//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use tailkit_config::ConfigError;
use tailkit_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    /// `drift` found differences or failed refreshes.
    pub const DRIFT: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the API at {url}")]
    #[diagnostic(
        code(tailkit::connection_failed),
        help(
            "Check network access and the base URL.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to {url} timed out")]
    #[diagnostic(
        code(tailkit::timeout),
        help("Increase the timeout with --timeout or in your profile.")
    )]
    Timeout { url: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed (HTTP {status}): {message}")]
    #[diagnostic(
        code(tailkit::auth_failed),
        help(
            "Verify the API access token and that it may manage this tailnet.\n\
             Store a new one with: tailkit config set-key --profile <name>"
        )
    )]
    AuthFailed { status: u16, message: String },

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(tailkit::no_credentials),
        help(
            "Pass --api-key, set TAILSCALE_API_KEY, or run: tailkit config set-key"
        )
    )]
    NoCredentials { profile: String },

    #[error("No tailnet configured for profile '{profile}'")]
    #[diagnostic(
        code(tailkit::no_tailnet),
        help("Pass --tailnet, set TAILSCALE_TAILNET, or add `tailnet` to the profile.")
    )]
    NoTailnet { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(tailkit::not_found),
        help("Run: tailkit {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("The remote value changed since it was read (HTTP 412)")]
    #[diagnostic(
        code(tailkit::conflict),
        help("Fetch the current value and retry with its ETag.")
    )]
    Conflict,

    // ── API ──────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(tailkit::rejected))]
    Rejected {
        message: String,
        #[help]
        detail: Option<String>,
    },

    #[error("Server error (HTTP {status}): {message}")]
    #[diagnostic(code(tailkit::server), help("The request may be retried."))]
    Server { status: u16, message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(tailkit::api_error))]
    Api { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tailkit::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(tailkit::profile_not_found),
        help("Add a [profiles.{name}] table to {path}")
    )]
    ProfileNotFound { name: String, path: String },

    #[error(transparent)]
    #[diagnostic(code(tailkit::config))]
    Config(ConfigError),

    // ── Drift ────────────────────────────────────────────────────────
    #[error("{count} resource(s) drifted or could not be refreshed")]
    #[diagnostic(code(tailkit::drift))]
    Drift { count: usize },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(tailkit::json), help("Check the file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict => exit_code::CONFLICT,
            Self::Validation { .. } | Self::Rejected { .. } | Self::NoTailnet { .. } => {
                exit_code::USAGE
            }
            Self::Drift { .. } => exit_code::DRIFT,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::Timeout { url } => Self::Timeout { url },

            CoreError::AuthenticationFailed { status, message } => {
                Self::AuthFailed { status, message }
            }

            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                list_command: list_command_for(&entity_type).into(),
                resource_type: entity_type,
                identifier,
            },

            CoreError::ValidationFailed {
                status: Some(412), ..
            } => Self::Conflict,

            CoreError::ValidationFailed {
                message, fields, ..
            } => Self::Rejected {
                message,
                detail: (!fields.is_empty()).then(|| {
                    fields
                        .iter()
                        .map(|f| format!("{}: {}", f.field, f.detail))
                        .collect::<Vec<_>>()
                        .join("\n")
                }),
            },

            CoreError::Server { status, message } => Self::Server { status, message },

            CoreError::Decode { message, .. }
            | CoreError::Api { message, .. }
            | CoreError::Config { message } => Self::Api { message },
        }
    }
}

fn list_command_for(entity_type: &str) -> &'static str {
    match entity_type {
        "key" => "keys list",
        _ => "devices list",
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::NoTailnet { profile } => Self::NoTailnet { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile(name) => Self::ProfileNotFound {
                name,
                path: tailkit_config::config_path().display().to_string(),
            },
            other => Self::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use tailkit_core::types::FieldError;

    use super::*;

    #[test]
    fn precondition_failure_is_a_conflict() {
        let err = CliError::from(CoreError::ValidationFailed {
            message: "precondition failed".into(),
            fields: Vec::new(),
            status: Some(412),
        });
        assert!(matches!(err, CliError::Conflict));
        assert_eq!(err.exit_code(), exit_code::CONFLICT);
    }

    #[test]
    fn field_errors_become_help_text() {
        let err = CliError::from(CoreError::ValidationFailed {
            message: "invalid policy".into(),
            fields: vec![FieldError {
                field: "acls[0].src".into(),
                detail: "unknown group".into(),
            }],
            status: Some(400),
        });
        match err {
            CliError::Rejected { detail, .. } => {
                assert_eq!(detail.as_deref(), Some("acls[0].src: unknown group"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn missing_key_points_at_keys_list() {
        let err = CliError::from(CoreError::NotFound {
            entity_type: "key".into(),
            identifier: "k123".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        match err {
            CliError::NotFound { list_command, .. } => assert_eq!(list_command, "keys list"),
            other => panic!("expected not found, got {other:?}"),
        }
    }
}
