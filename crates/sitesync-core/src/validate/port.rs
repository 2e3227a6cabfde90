// Port row field checks.

use sitesync_api::PortType;

use crate::error::CoreError;

/// `access` or `trunk`, exact match.
pub fn parse_role(site: &str, port: &str, raw: &str) -> Result<PortType, CoreError> {
    match raw.trim() {
        "access" => Ok(PortType::Access),
        "trunk" => Ok(PortType::Trunk),
        other => Err(CoreError::validation(format!(
            "incorrect port type for port {port} at {site}: '{other}' (expected access or trunk)"
        ))),
    }
}

/// `y` or `n`, any case. Returns whether the port is secured.
pub fn parse_security(site: &str, port: &str, raw: &str) -> Result<bool, CoreError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" => Ok(true),
        "n" => Ok(false),
        _ => Err(CoreError::validation(format!(
            "incorrect port security for port {port} at {site}: '{raw}' (expected y or n)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_case_sensitive() {
        assert!(matches!(parse_role("s", "1", "access"), Ok(PortType::Access)));
        assert!(matches!(parse_role("s", "1", "trunk"), Ok(PortType::Trunk)));
        assert!(parse_role("s", "1", "Access").is_err());
        assert!(parse_role("s", "1", "hybrid").is_err());
    }

    #[test]
    fn security_ignores_case() {
        assert!(matches!(parse_security("s", "1", "Y"), Ok(true)));
        assert!(matches!(parse_security("s", "1", "n"), Ok(false)));
        assert!(parse_security("s", "1", "yes").is_err());
        assert!(parse_security("s", "1", "").is_err());
    }
}
