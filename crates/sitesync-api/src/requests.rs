// ── Typed request structs for mutating calls ──
//
// Each Dashboard write takes exactly one of these. They carry only the
// fields the endpoint accepts and are checked with `validate()` before
// the client serializes them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::{VpnHub, VpnSubnet};

const VLAN_ID_RANGE: std::ops::RangeInclusive<u16> = 1..=4094;

fn check_vlan_id(id: u16) -> Result<(), Error> {
    if VLAN_ID_RANGE.contains(&id) {
        Ok(())
    } else {
        Err(Error::InvalidRequest(format!(
            "VLAN id {id} is outside 1-4094"
        )))
    }
}

// ── VLAN ───────────────────────────────────────────────────────────

/// IPv6 toggle carried on VLAN payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv6Settings {
    pub enabled: bool,
}

/// `POST /networks/{networkId}/appliance/vlans`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVlanRequest {
    pub id: u16,
    pub name: String,
    pub subnet: String,
    pub appliance_ip: String,
    pub ipv6: Ipv6Settings,
    /// Catalog VPN mode; omitted when the catalog leaves it unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpn_mode: Option<bool>,
}

impl CreateVlanRequest {
    pub fn validate(&self) -> Result<(), Error> {
        check_vlan_id(self.id)?;
        if self.name.trim().is_empty() {
            return Err(Error::InvalidRequest("VLAN name must not be empty".into()));
        }
        if !self.subnet.contains('/') {
            return Err(Error::InvalidRequest(format!(
                "subnet '{}' is not in address/prefix form",
                self.subnet
            )));
        }
        if self.appliance_ip.is_empty() {
            return Err(Error::InvalidRequest("appliance IP must not be empty".into()));
        }
        Ok(())
    }
}

/// Fixed IP reservation keyed by client MAC in `fixedIpAssignments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedIpAssignment {
    pub ip: String,
    pub name: String,
}

/// Excluded address range in `reservedIpRanges`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedIpRange {
    pub start: String,
    pub end: String,
    pub comment: String,
}

/// A custom DHCP option served on the VLAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DhcpOption {
    pub code: String,
    #[serde(rename = "type")]
    pub option_type: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandatoryDhcp {
    pub enabled: bool,
}

/// DHCP server settings as written by operators in a per-VLAN `dhcp.json`.
///
/// Keys without a typed field land in `extra` and are sent as written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DhcpSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp_handling: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp_relay_server_ips: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp_lease_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp_boot_options_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp_boot_next_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp_boot_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_nameservers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp_options: Option<Vec<DhcpOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mandatory_dhcp: Option<MandatoryDhcp>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

const DHCP_HANDLING_MODES: [&str; 3] = [
    "Run a DHCP server",
    "Relay DHCP to another server",
    "Do not respond to DHCP requests",
];

/// `PUT /networks/{networkId}/appliance/vlans/{vlanId}`
///
/// Every field is optional; only the ones set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVlanRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appliance_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<Ipv6Settings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpn_mode: Option<bool>,
    #[serde(flatten)]
    pub dhcp: DhcpSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_ip_assignments: Option<BTreeMap<String, FixedIpAssignment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_ip_ranges: Option<Vec<ReservedIpRange>>,
}

impl UpdateVlanRequest {
    /// Name-only change. Carries no addressing fields so stale network
    /// settings are never re-applied.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.is_empty() {
            return Err(Error::InvalidRequest("VLAN update carries no fields".into()));
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::InvalidRequest("VLAN name must not be empty".into()));
            }
        }
        if let Some(subnet) = &self.subnet {
            if !subnet.contains('/') {
                return Err(Error::InvalidRequest(format!(
                    "subnet '{subnet}' is not in address/prefix form"
                )));
            }
        }
        if let Some(mode) = &self.dhcp.dhcp_handling {
            if !DHCP_HANDLING_MODES.contains(&mode.as_str()) {
                return Err(Error::InvalidRequest(format!(
                    "unknown dhcpHandling '{mode}'"
                )));
            }
        }
        if let Some(fixed) = &self.fixed_ip_assignments {
            if let Some((mac, _)) = fixed.iter().find(|(_, a)| a.ip.is_empty()) {
                return Err(Error::InvalidRequest(format!(
                    "fixed assignment for {mac} has no IP"
                )));
            }
        }
        if let Some(ranges) = &self.reserved_ip_ranges {
            if ranges.iter().any(|r| r.start.is_empty() || r.end.is_empty()) {
                return Err(Error::InvalidRequest(
                    "reserved range needs both a first and last IP".into(),
                ));
            }
        }
        Ok(())
    }
}

// ── Site-to-site VPN ───────────────────────────────────────────────

/// `PUT /networks/{networkId}/appliance/vpn/siteToSiteVpn`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVpnRequest {
    pub mode: String,
    pub hubs: Vec<VpnHub>,
    pub subnets: Vec<VpnSubnet>,
}

impl UpdateVpnRequest {
    pub fn validate(&self) -> Result<(), Error> {
        if !matches!(self.mode.as_str(), "hub" | "spoke" | "none") {
            return Err(Error::InvalidRequest(format!(
                "unknown VPN mode '{}'",
                self.mode
            )));
        }
        if self.hubs.iter().any(|h| h.hub_id.is_empty()) {
            return Err(Error::InvalidRequest("VPN hub without an id".into()));
        }
        if self.subnets.iter().any(|s| s.local_subnet.is_empty()) {
            return Err(Error::InvalidRequest("VPN subnet entry without a subnet".into()));
        }
        Ok(())
    }
}

// ── Appliance port ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    Access,
    Trunk,
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => f.write_str("access"),
            Self::Trunk => f.write_str("trunk"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessPolicy {
    Open,
    HybridRadius,
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::HybridRadius => f.write_str("hybrid-radius"),
        }
    }
}

/// `PUT /networks/{networkId}/appliance/ports/{portId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePortRequest {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub port_type: PortType,
    pub vlan: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_policy: Option<AccessPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_vlans: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_untagged_traffic: Option<bool>,
}

impl UpdatePortRequest {
    /// Enabled access port on `vlan` under `policy`.
    pub fn access(vlan: u16, policy: AccessPolicy) -> Self {
        Self {
            enabled: true,
            port_type: PortType::Access,
            vlan,
            access_policy: Some(policy),
            allowed_vlans: None,
            drop_untagged_traffic: None,
        }
    }

    /// Enabled trunk carrying all VLANs with `vlan` as native.
    pub fn trunk(vlan: u16) -> Self {
        Self {
            enabled: true,
            port_type: PortType::Trunk,
            vlan,
            access_policy: None,
            allowed_vlans: Some("all".into()),
            drop_untagged_traffic: Some(false),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        check_vlan_id(self.vlan)?;
        match self.port_type {
            PortType::Access if self.access_policy.is_none() => Err(Error::InvalidRequest(
                "access port requires an access policy".into(),
            )),
            PortType::Trunk if self.allowed_vlans.is_none() => Err(Error::InvalidRequest(
                "trunk port requires allowed VLANs".into(),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn rename_serializes_name_only() {
        let req = UpdateVlanRequest::rename("Corp Data");
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({"name": "Corp Data"}));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(UpdateVlanRequest::default().validate().is_err());
    }

    #[test]
    fn dhcp_settings_flatten_into_update() {
        let settings: DhcpSettings = serde_json::from_value(json!({
            "dhcpHandling": "Run a DHCP server",
            "dhcpLeaseTime": "1 day",
            "dnsNameservers": "upstream_dns"
        }))
        .unwrap();
        let req = UpdateVlanRequest {
            dhcp: settings,
            ..UpdateVlanRequest::default()
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "dhcpHandling": "Run a DHCP server",
                "dhcpLeaseTime": "1 day",
                "dnsNameservers": "upstream_dns"
            })
        );
    }

    #[test]
    fn dhcp_settings_pass_untyped_keys_through() {
        let settings: DhcpSettings = serde_json::from_value(json!({
            "dhcpHandling": "Run a DHCP server",
            "vpnNatSubnet": "192.168.1.0/24"
        }))
        .unwrap();
        assert_eq!(settings.dhcp_handling.as_deref(), Some("Run a DHCP server"));
        assert_eq!(settings.extra["vpnNatSubnet"], "192.168.1.0/24");

        let req = UpdateVlanRequest {
            dhcp: settings,
            ..UpdateVlanRequest::default()
        };
        assert!(req.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "dhcpHandling": "Run a DHCP server",
                "vpnNatSubnet": "192.168.1.0/24"
            })
        );
    }

    #[test]
    fn vpn_mode_is_sent_only_when_declared() {
        let req = UpdateVlanRequest {
            subnet: Some("10.0.0.0/24".into()),
            vpn_mode: Some(false),
            ..UpdateVlanRequest::default()
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"subnet": "10.0.0.0/24", "vpnMode": false})
        );
    }

    #[test]
    fn unknown_dhcp_handling_fails_validation() {
        let req = UpdateVlanRequest {
            dhcp: DhcpSettings {
                dhcp_handling: Some("Sometimes".into()),
                ..DhcpSettings::default()
            },
            ..UpdateVlanRequest::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_request_wire_shape() {
        let req = CreateVlanRequest {
            id: 10,
            name: "Data".into(),
            subnet: "10.0.0.0/24".into(),
            appliance_ip: "10.0.0.0".into(),
            ipv6: Ipv6Settings { enabled: true },
            vpn_mode: Some(true),
        };
        assert!(req.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "id": 10,
                "name": "Data",
                "subnet": "10.0.0.0/24",
                "applianceIp": "10.0.0.0",
                "ipv6": {"enabled": true},
                "vpnMode": true
            })
        );
    }

    #[test]
    fn create_request_rejects_out_of_range_id() {
        let req = CreateVlanRequest {
            id: 4095,
            name: "Data".into(),
            subnet: "10.0.0.0/24".into(),
            appliance_ip: "10.0.0.0".into(),
            ipv6: Ipv6Settings { enabled: true },
            vpn_mode: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn access_port_wire_shape() {
        let req = UpdatePortRequest::access(10, AccessPolicy::HybridRadius);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "enabled": true,
                "type": "access",
                "vlan": 10,
                "accessPolicy": "hybrid-radius"
            })
        );
    }

    #[test]
    fn trunk_port_wire_shape() {
        let req = UpdatePortRequest::trunk(1);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "enabled": true,
                "type": "trunk",
                "vlan": 1,
                "allowedVlans": "all",
                "dropUntaggedTraffic": false
            })
        );
    }

    #[test]
    fn vpn_mode_must_be_known() {
        let mut req = UpdateVpnRequest {
            mode: "spoke".into(),
            hubs: vec![],
            subnets: vec![],
        };
        assert!(req.validate().is_ok());
        req.mode = "mesh".into();
        assert!(req.validate().is_err());
    }
}
