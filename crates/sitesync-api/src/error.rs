use thiserror::Error;

/// Top-level error type for the `sitesync-api` crate.
///
/// Covers every failure mode of the Dashboard boundary: authentication,
/// transport, structured API rejections, and payload validation.
/// `sitesync-core` maps these into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// API key rejected by the Dashboard (HTTP 401).
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Key is valid but lacks access to the resource (HTTP 403).
    #[error("Access denied: {message}")]
    Forbidden { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Dashboard API ───────────────────────────────────────────────
    /// Structured error from the Dashboard, parsed from `{"errors": [...]}`.
    #[error("Dashboard API error (HTTP {status}): {message}")]
    Api { message: String, status: u16 },

    /// Rate limited by the Dashboard. Includes retry-after in seconds.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A request payload failed local validation before it was sent.
    #[error("Invalid request payload: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Returns `true` if the Dashboard reported that the feature the call
    /// targets is switched off for this network, e.g.
    /// "VLANs are not enabled for this network".
    pub fn is_not_enabled(&self) -> bool {
        match self {
            Self::Api { message, .. } => message.contains("not enabled"),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the failure happened below the HTTP layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Tls(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_enabled_is_detected_from_message() {
        let err = Error::Api {
            message: "VLANs are not enabled for this network".into(),
            status: 400,
        };
        assert!(err.is_not_enabled());
        assert!(!err.is_not_found());
    }

    #[test]
    fn other_api_errors_are_not_feature_gaps() {
        let err = Error::Api {
            message: "Subnet overlaps with VLAN 20".into(),
            status: 400,
        };
        assert!(!err.is_not_enabled());
        assert!(!Error::InvalidApiKey.is_not_enabled());
    }

    #[test]
    fn api_404_is_not_found() {
        let err = Error::Api {
            message: "Not found".into(),
            status: 404,
        };
        assert!(err.is_not_found());
    }
}
