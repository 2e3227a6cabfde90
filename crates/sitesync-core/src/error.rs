// ── Core error types ──
//
// Errors surfaced by the engine. Callers never see HTTP status handling
// or JSON envelopes; `From<sitesync_api::Error>` folds the client's
// failures into connection, authentication and API variants.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Nothing to do: enable adding missing VLANs, updating existing ones, or both")]
    NoOperation,

    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    // ── Lookup errors ────────────────────────────────────────────────
    #[error("Site not found in the organization: {name}")]
    SiteNotFound { name: String },

    // ── Dashboard errors ─────────────────────────────────────────────
    #[error("Cannot reach the Dashboard: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Rate limited by the Dashboard; retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Dashboard rejected the request: {message}")]
    Api { message: String, status: Option<u16> },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// The Dashboard answered that the feature is switched off for the
    /// network (e.g. "VLANs are not enabled for this network").
    pub fn is_not_enabled(&self) -> bool {
        matches!(self, Self::Api { message, .. } if message.contains("not enabled"))
    }
}

// ── Conversion from client errors ────────────────────────────────────

impl From<sitesync_api::Error> for CoreError {
    fn from(err: sitesync_api::Error) -> Self {
        use sitesync_api::Error as ApiError;

        match err {
            ApiError::InvalidApiKey => Self::AuthenticationFailed {
                message: "Invalid API key".into(),
            },
            ApiError::Forbidden { message } => Self::AuthenticationFailed { message },
            ApiError::Transport(e) => {
                if let Some(status) = e.status() {
                    Self::Api {
                        message: e.to_string(),
                        status: Some(status.as_u16()),
                    }
                } else {
                    Self::ConnectionFailed {
                        reason: e.to_string(),
                    }
                }
            }
            ApiError::InvalidUrl(e) => Self::ConnectionFailed {
                reason: format!("invalid Dashboard URL: {e}"),
            },
            ApiError::Tls(reason) => Self::ConnectionFailed { reason },
            ApiError::Api { message, status } => Self::Api {
                message,
                status: Some(status),
            },
            ApiError::RateLimited { retry_after_secs } => Self::RateLimited { retry_after_secs },
            ApiError::Deserialization { message, body: _ } => {
                Self::Internal(format!("unexpected Dashboard response: {message}"))
            }
            ApiError::InvalidRequest(message) => Self::Validation { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_enabled_survives_conversion() {
        let err: CoreError = sitesync_api::Error::Api {
            message: "VLANs are not enabled for this network".into(),
            status: 400,
        }
        .into();
        assert!(err.is_not_enabled());
    }

    #[test]
    fn invalid_request_becomes_validation() {
        let err: CoreError = sitesync_api::Error::InvalidRequest("bad".into()).into();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn unauthorized_becomes_auth_failure() {
        let err: CoreError = sitesync_api::Error::InvalidApiKey.into();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }
}
