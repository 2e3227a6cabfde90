//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use sitesync_config::ConfigError;
use sitesync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Meraki Dashboard: {reason}")]
    #[diagnostic(
        code(sitesync::connection_failed),
        help(
            "Check network access to the Dashboard API.\n\
             Behind a TLS-intercepting proxy, set ca_cert in your profile."
        )
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(sitesync::auth_failed),
        help("Verify the API key has access to the organization.")
    )]
    AuthFailed { message: String },

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(sitesync::no_credentials),
        help(
            "Set MERAKI_API_KEY, pass --api-key, or store the key in the system keyring\n\
             under service 'sitesync', entry '{profile}/api-key'."
        )
    )]
    NoCredentials { profile: String },

    #[error("No organization id configured for profile '{profile}'")]
    #[diagnostic(
        code(sitesync::no_organization),
        help("Set MERAKI_ORG_ID, pass --org-id, or add org_id to the profile.")
    )]
    NoOrganization { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(sitesync::not_found),
        help("Site names must match the Dashboard network name exactly.")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Dashboard API error: {message}")]
    #[diagnostic(code(sitesync::api_error))]
    ApiError {
        message: String,
        status: Option<u16>,
    },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sitesync::validation))]
    Validation { field: String, reason: String },

    #[error("Nothing to do")]
    #[diagnostic(
        code(sitesync::no_operation),
        help("Pass --add (-a), --update (-u), or both.")
    )]
    NoOperation,

    #[error("{message}")]
    #[diagnostic(
        code(sitesync::input),
        help("Input files are resolved against --input-dir (or input_dir in the config).")
    )]
    Input { message: String },

    // ── Run results ──────────────────────────────────────────────────
    #[error("{failed} of {total} sites had failures")]
    #[diagnostic(
        code(sitesync::partial_failure),
        help("See the log output above; run with -v for details.")
    )]
    SitesFailed { failed: usize, total: usize },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(code(sitesync::config))]
    Config { message: String },

    #[error("Internal error: {0}")]
    #[diagnostic(code(sitesync::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Cannot render output: {0}")]
    #[diagnostic(code(sitesync::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NoOperation | Self::NoOrganization { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed { reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::SiteNotFound { name } => CliError::NotFound {
                resource_type: "site".into(),
                identifier: name,
            },

            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::NoOperation => CliError::NoOperation,

            err @ (CoreError::Io { .. } | CoreError::Parse { .. }) => CliError::Input {
                message: err.to_string(),
            },

            err @ CoreError::RateLimited { .. } => CliError::ApiError {
                message: err.to_string(),
                status: Some(429),
            },

            CoreError::Api { message, status } => CliError::ApiError { message, status },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::NoOrganization { profile } => CliError::NoOrganization { profile },
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_the_error_class() {
        let cases = [
            (
                CliError::from(CoreError::ConnectionFailed {
                    reason: "dns".into(),
                }),
                exit_code::CONNECTION,
            ),
            (
                CliError::from(CoreError::AuthenticationFailed {
                    message: "bad key".into(),
                }),
                exit_code::AUTH,
            ),
            (
                CliError::from(CoreError::SiteNotFound {
                    name: "branch-01".into(),
                }),
                exit_code::NOT_FOUND,
            ),
            (CliError::from(CoreError::validation("bad")), exit_code::USAGE),
            (CliError::from(CoreError::NoOperation), exit_code::USAGE),
            (
                CliError::from(ConfigError::NoCredentials {
                    profile: "default".into(),
                }),
                exit_code::AUTH,
            ),
            (
                CliError::SitesFailed {
                    failed: 1,
                    total: 3,
                },
                exit_code::GENERAL,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(err.exit_code(), code, "{err}");
        }
    }
}
