// Declared prefix parsing and network equality.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use ipnetwork::{IpNetwork, Ipv4Network, ipv4_mask_to_prefix};

use crate::error::CoreError;

/// An address with a prefix length, as written in a subnet file.
///
/// Both `10.0.0.1/24` and `10.0.0.1/255.255.255.0` are accepted. The
/// host bits are kept: `address()` is what was written, `network()` is
/// the masked form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclaredPrefix(IpNetwork);

impl DeclaredPrefix {
    /// Parse `raw` for `site`; the error names both.
    pub fn parse(site: &str, raw: &str) -> Result<Self, CoreError> {
        parse_interface(raw.trim()).map(Self).ok_or_else(|| {
            CoreError::validation(format!(
                "{raw} is not a valid IP address prefix for site {site}"
            ))
        })
    }

    pub fn address(&self) -> IpAddr {
        self.0.ip()
    }

    pub fn network(&self) -> IpAddr {
        self.0.network()
    }

    pub fn prefix_len(&self) -> u8 {
        self.0.prefix()
    }

    /// Same network address and prefix length.
    pub fn same_network_as(&self, other: &Self) -> bool {
        self.network() == other.network() && self.prefix_len() == other.prefix_len()
    }
}

impl fmt::Display for DeclaredPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0.ip(), self.0.prefix())
    }
}

fn parse_interface(raw: &str) -> Option<IpNetwork> {
    let (addr, len) = raw.split_once('/')?;
    let addr: IpAddr = addr.parse().ok()?;
    match (addr, len.parse::<Ipv4Addr>()) {
        (IpAddr::V4(v4), Ok(mask)) => {
            let prefix = ipv4_mask_to_prefix(mask).ok()?;
            Ipv4Network::new(v4, prefix).ok().map(IpNetwork::V4)
        }
        (_, Err(_)) => IpNetwork::new(addr, len.parse().ok()?).ok(),
        (IpAddr::V6(_), Ok(_)) => None,
    }
}

/// Whether two subnet strings describe the same network. Falls back to
/// exact string comparison when either side does not parse.
pub fn same_network(a: &str, b: &str) -> bool {
    match (parse_interface(a.trim()), parse_interface(b.trim())) {
        (Some(x), Some(y)) => x.network() == y.network() && x.prefix() == y.prefix(),
        _ => a.trim() == b.trim(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_cidr_and_netmask_forms() {
        let cidr = DeclaredPrefix::parse("s", "10.0.0.0/24").unwrap();
        let mask = DeclaredPrefix::parse("s", "10.0.0.0/255.255.255.0").unwrap();
        assert!(cidr.same_network_as(&mask));
        assert_eq!(cidr.prefix_len(), 24);
    }

    #[test]
    fn keeps_host_bits() {
        let p = DeclaredPrefix::parse("s", "10.1.2.1/24").unwrap();
        assert_eq!(p.address().to_string(), "10.1.2.1");
        assert_eq!(p.network().to_string(), "10.1.2.0");
        assert_eq!(p.to_string(), "10.1.2.1/24");
    }

    #[test]
    fn accepts_v6() {
        assert!(DeclaredPrefix::parse("s", "2001:db8::/64").is_ok());
    }

    #[test]
    fn rejects_bad_prefixes_naming_site() {
        for raw in ["10.0.0.0", "10.0.0/24", "10.0.0.0/33", "banana/24", "10.0.0.0/255.0.255.0"] {
            let err = DeclaredPrefix::parse("branch-01", raw).unwrap_err();
            let text = err.to_string();
            assert!(text.contains("branch-01") && text.contains(raw), "{text}");
        }
    }

    #[test]
    fn network_equality_ignores_spelling() {
        assert!(same_network("10.0.0.0/24", "10.0.0.0/255.255.255.0"));
        assert!(same_network("10.0.0.1/24", "10.0.0.0/24"));
        assert!(!same_network("10.0.0.0/24", "10.0.0.0/25"));
        assert!(!same_network("10.0.0.0/24", "10.0.1.0/24"));
        assert!(same_network("weird", "weird"));
    }
}
