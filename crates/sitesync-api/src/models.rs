// Dashboard API response types
//
// Models for the Dashboard v1 JSON API. Fields the reconciler reads are
// modeled explicitly; everything else lands in `extra` so that a fetched
// object serializes back out whole when it is written to a backup ledger.

use serde::{Deserialize, Deserializer, Serialize};

// ── Organization / Network ───────────────────────────────────────────

/// Organization from `GET /organizations/{organizationId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Network from `GET /organizations/{organizationId}/networks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub product_types: Vec<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Appliance VLAN ───────────────────────────────────────────────────

/// Appliance VLAN from `GET /networks/{networkId}/appliance/vlans[/{vlanId}]`.
///
/// The Dashboard has returned the VLAN id both as a number and as a numeric
/// string across API revisions; both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplianceVlan {
    #[serde(deserialize_with = "deserialize_vlan_id")]
    pub id: u16,
    pub name: String,
    #[serde(default)]
    pub subnet: Option<String>,
    #[serde(default)]
    pub appliance_ip: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn deserialize_vlan_id<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => u16::try_from(n).map_err(serde::de::Error::custom),
        RawId::Text(s) => s.trim().parse::<u16>().map_err(serde::de::Error::custom),
    }
}

// ── Site-to-site VPN ─────────────────────────────────────────────────

/// Site-to-site VPN settings from `GET /networks/{networkId}/appliance/vpn/siteToSiteVpn`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteToSiteVpn {
    /// `"hub"`, `"spoke"`, or `"none"`.
    pub mode: String,
    #[serde(default)]
    pub hubs: Vec<VpnHub>,
    #[serde(default)]
    pub subnets: Vec<VpnSubnet>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpnHub {
    pub hub_id: String,
    #[serde(default)]
    pub use_default_route: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One local subnet advertised (or not) into the VPN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpnSubnet {
    pub local_subnet: String,
    #[serde(default)]
    pub use_vpn: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Appliance port ───────────────────────────────────────────────────

/// Appliance port from `GET /networks/{networkId}/appliance/ports/{portId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliancePort {
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, rename = "type")]
    pub port_type: Option<String>,
    #[serde(default)]
    pub vlan: Option<u16>,
    #[serde(default)]
    pub allowed_vlans: Option<String>,
    #[serde(default)]
    pub access_policy: Option<String>,
    #[serde(default)]
    pub drop_untagged_traffic: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Error envelope ───────────────────────────────────────────────────

/// Error body returned by the Dashboard on 4xx/5xx: `{"errors": ["..."]}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}
