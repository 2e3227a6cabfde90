// In-memory `DashboardApi` for tests.
//
// Holds one organization's networks, VLANs, VPN settings and ports,
// records every call in order, and can be told to fail specific
// operations. Writes behave like the Dashboard does for the fields the
// reconciler touches: creating a VLAN on a network with VPN settings adds
// an unadvertised subnet entry, and a prefix change rewrites that entry.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::dashboard::DashboardApi;
use crate::error::Error;
use crate::models::{
    AppliancePort, ApplianceVlan, Network, Organization, SiteToSiteVpn, VpnSubnet,
};
use crate::requests::{CreateVlanRequest, UpdatePortRequest, UpdateVlanRequest, UpdateVpnRequest};

/// Dashboard operation, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    GetOrganization,
    ListNetworks,
    ListVlans,
    GetVlan,
    CreateVlan,
    UpdateVlan,
    GetVpn,
    UpdateVpn,
    GetPort,
    UpdatePort,
}

/// One recorded call, with the payload for writes.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetOrganization { org: String },
    ListNetworks { org: String },
    ListVlans { network: String },
    GetVlan { network: String, vlan: u16 },
    CreateVlan { network: String, req: CreateVlanRequest },
    UpdateVlan { network: String, vlan: u16, req: UpdateVlanRequest },
    GetVpn { network: String },
    UpdateVpn { network: String, req: UpdateVpnRequest },
    GetPort { network: String, port: u32 },
    UpdatePort { network: String, port: u32, req: UpdatePortRequest },
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Self::GetOrganization { .. } => Op::GetOrganization,
            Self::ListNetworks { .. } => Op::ListNetworks,
            Self::ListVlans { .. } => Op::ListVlans,
            Self::GetVlan { .. } => Op::GetVlan,
            Self::CreateVlan { .. } => Op::CreateVlan,
            Self::UpdateVlan { .. } => Op::UpdateVlan,
            Self::GetVpn { .. } => Op::GetVpn,
            Self::UpdateVpn { .. } => Op::UpdateVpn,
            Self::GetPort { .. } => Op::GetPort,
            Self::UpdatePort { .. } => Op::UpdatePort,
        }
    }

    /// Whether the call changes Dashboard state.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::CreateVlan { .. }
                | Self::UpdateVlan { .. }
                | Self::UpdateVpn { .. }
                | Self::UpdatePort { .. }
        )
    }

    fn network(&self) -> &str {
        match self {
            Self::GetOrganization { org } | Self::ListNetworks { org } => org,
            Self::ListVlans { network }
            | Self::GetVlan { network, .. }
            | Self::CreateVlan { network, .. }
            | Self::UpdateVlan { network, .. }
            | Self::GetVpn { network }
            | Self::UpdateVpn { network, .. }
            | Self::GetPort { network, .. }
            | Self::UpdatePort { network, .. } => network,
        }
    }
}

struct Failure {
    op: Op,
    network: Option<String>,
    message: String,
}

#[derive(Default)]
struct State {
    organization: Option<Organization>,
    networks: Vec<Network>,
    vlans: HashMap<String, BTreeMap<u16, ApplianceVlan>>,
    vlans_disabled: HashSet<String>,
    vpn: HashMap<String, SiteToSiteVpn>,
    ports: HashMap<(String, u32), AppliancePort>,
    failures: Vec<Failure>,
    calls: Vec<Call>,
}

/// Mock Dashboard for unit and integration tests.
#[derive(Clone, Default)]
pub struct MockDashboard {
    state: Arc<Mutex<State>>,
}

fn api_error(status: u16, message: impl Into<String>) -> Error {
    Error::Api {
        message: message.into(),
        status,
    }
}

impl MockDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Seeding ──────────────────────────────────────────────────────

    pub fn with_organization(self, id: &str, name: &str) -> Self {
        self.lock().organization = Some(Organization {
            id: id.into(),
            name: name.into(),
            extra: serde_json::Map::new(),
        });
        self
    }

    pub fn with_network(self, id: &str, name: &str) -> Self {
        {
            let mut state = self.lock();
            let organization_id = state.organization.as_ref().map(|o| o.id.clone());
            state.networks.push(Network {
                id: id.into(),
                name: name.into(),
                organization_id,
                product_types: vec!["appliance".into()],
                time_zone: None,
                extra: serde_json::Map::new(),
            });
            state.vlans.entry(id.into()).or_default();
        }
        self
    }

    pub fn with_vlan(self, network: &str, id: u16, name: &str, subnet: &str) -> Self {
        let appliance_ip = subnet.split('/').next().unwrap_or_default().to_owned();
        self.lock().vlans.entry(network.into()).or_default().insert(
            id,
            ApplianceVlan {
                id,
                name: name.into(),
                subnet: Some(subnet.into()),
                appliance_ip: Some(appliance_ip),
                extra: serde_json::Map::new(),
            },
        );
        self
    }

    pub fn with_vpn(self, network: &str, vpn: SiteToSiteVpn) -> Self {
        self.lock().vpn.insert(network.into(), vpn);
        self
    }

    pub fn with_port(self, network: &str, port: AppliancePort) -> Self {
        let number = port.number.unwrap_or_default();
        self.lock().ports.insert((network.into(), number), port);
        self
    }

    /// Seed ports `1..=count` as enabled access ports on VLAN 1.
    pub fn with_ports(self, network: &str, count: u32) -> Self {
        {
            let mut state = self.lock();
            for number in 1..=count {
                state.ports.insert(
                    (network.into(), number),
                    AppliancePort {
                        number: Some(number),
                        enabled: true,
                        port_type: Some("access".into()),
                        vlan: Some(1),
                        allowed_vlans: None,
                        access_policy: Some("open".into()),
                        drop_untagged_traffic: None,
                        extra: serde_json::Map::new(),
                    },
                );
            }
        }
        self
    }

    /// VLAN calls on this network fail the way the Dashboard does when
    /// the appliance is in single-LAN mode.
    pub fn disable_vlans(self, network: &str) -> Self {
        self.lock().vlans_disabled.insert(network.into());
        self
    }

    // ── Failure injection ────────────────────────────────────────────

    /// Every call of `op` fails with HTTP 400 and `message`.
    pub fn fail(&self, op: Op, message: &str) {
        self.lock().failures.push(Failure {
            op,
            network: None,
            message: message.into(),
        });
    }

    /// Calls of `op` against `network` fail with HTTP 400 and `message`.
    pub fn fail_for(&self, op: Op, network: &str, message: &str) {
        self.lock().failures.push(Failure {
            op,
            network: Some(network.into()),
            message: message.into(),
        });
    }

    // ── Inspection ───────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.is_write())
            .cloned()
            .collect()
    }

    pub fn vlans(&self, network: &str) -> Vec<ApplianceVlan> {
        self.lock()
            .vlans
            .get(network)
            .map(|v| v.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn vpn(&self, network: &str) -> Option<SiteToSiteVpn> {
        self.lock().vpn.get(network).cloned()
    }

    pub fn port(&self, network: &str, number: u32) -> Option<AppliancePort> {
        self.lock().ports.get(&(network.to_owned(), number)).cloned()
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Record `call` and return the injected failure, if any.
    fn enter(state: &mut State, call: Call) -> Result<(), Error> {
        let op = call.op();
        let injected = state
            .failures
            .iter()
            .find(|f| f.op == op && f.network.as_deref().is_none_or(|n| n == call.network()))
            .map(|f| api_error(400, f.message.clone()));
        state.calls.push(call);
        injected.map_or(Ok(()), Err)
    }

    fn check_vlans_enabled(state: &State, network: &str) -> Result<(), Error> {
        if state.vlans_disabled.contains(network) {
            return Err(api_error(400, "VLANs are not enabled for this network"));
        }
        if !state.vlans.contains_key(network) {
            return Err(api_error(404, "Network not found"));
        }
        Ok(())
    }
}

fn apply_update(vlan: &mut ApplianceVlan, req: &UpdateVlanRequest) -> Result<(), Error> {
    if let Some(name) = &req.name {
        vlan.name.clone_from(name);
    }
    if let Some(subnet) = &req.subnet {
        vlan.subnet = Some(subnet.clone());
    }
    if let Some(ip) = &req.appliance_ip {
        vlan.appliance_ip = Some(ip.clone());
    }
    let serde_json::Value::Object(fields) =
        serde_json::to_value(req).map_err(|e| Error::InvalidRequest(e.to_string()))?
    else {
        return Ok(());
    };
    for (key, value) in fields {
        if !matches!(key.as_str(), "name" | "subnet" | "applianceIp") {
            vlan.extra.insert(key, value);
        }
    }
    Ok(())
}

#[async_trait]
impl DashboardApi for MockDashboard {
    async fn get_organization(&self, org_id: &str) -> Result<Organization, Error> {
        let mut state = self.lock();
        Self::enter(&mut state, Call::GetOrganization { org: org_id.into() })?;
        state
            .organization
            .clone()
            .filter(|o| o.id == org_id)
            .ok_or_else(|| api_error(404, "Organization not found"))
    }

    async fn list_networks(&self, org_id: &str) -> Result<Vec<Network>, Error> {
        let mut state = self.lock();
        Self::enter(&mut state, Call::ListNetworks { org: org_id.into() })?;
        if state.organization.as_ref().is_none_or(|o| o.id != org_id) {
            return Err(api_error(404, "Organization not found"));
        }
        Ok(state.networks.clone())
    }

    async fn list_vlans(&self, network_id: &str) -> Result<Vec<ApplianceVlan>, Error> {
        let mut state = self.lock();
        Self::enter(
            &mut state,
            Call::ListVlans {
                network: network_id.into(),
            },
        )?;
        Self::check_vlans_enabled(&state, network_id)?;
        Ok(state
            .vlans
            .get(network_id)
            .map(|v| v.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_vlan(&self, network_id: &str, vlan_id: u16) -> Result<ApplianceVlan, Error> {
        let mut state = self.lock();
        Self::enter(
            &mut state,
            Call::GetVlan {
                network: network_id.into(),
                vlan: vlan_id,
            },
        )?;
        Self::check_vlans_enabled(&state, network_id)?;
        state
            .vlans
            .get(network_id)
            .and_then(|v| v.get(&vlan_id))
            .cloned()
            .ok_or_else(|| api_error(404, format!("VLAN {vlan_id} not found")))
    }

    async fn create_vlan(
        &self,
        network_id: &str,
        req: &CreateVlanRequest,
    ) -> Result<ApplianceVlan, Error> {
        req.validate()?;
        let mut state = self.lock();
        Self::enter(
            &mut state,
            Call::CreateVlan {
                network: network_id.into(),
                req: req.clone(),
            },
        )?;
        Self::check_vlans_enabled(&state, network_id)?;

        let vlans = state.vlans.entry(network_id.into()).or_default();
        if vlans.contains_key(&req.id) {
            return Err(api_error(400, "Vlan has already been taken"));
        }
        let mut extra = serde_json::Map::new();
        extra.insert("ipv6".into(), serde_json::json!({"enabled": req.ipv6.enabled}));
        if let Some(mode) = req.vpn_mode {
            extra.insert("vpnMode".into(), mode.into());
        }
        let vlan = ApplianceVlan {
            id: req.id,
            name: req.name.clone(),
            subnet: Some(req.subnet.clone()),
            appliance_ip: Some(req.appliance_ip.clone()),
            extra,
        };
        vlans.insert(req.id, vlan.clone());

        if let Some(vpn) = state.vpn.get_mut(network_id) {
            vpn.subnets.push(VpnSubnet {
                local_subnet: req.subnet.clone(),
                use_vpn: false,
                extra: serde_json::Map::new(),
            });
        }
        Ok(vlan)
    }

    async fn update_vlan(
        &self,
        network_id: &str,
        vlan_id: u16,
        req: &UpdateVlanRequest,
    ) -> Result<ApplianceVlan, Error> {
        req.validate()?;
        let mut state = self.lock();
        Self::enter(
            &mut state,
            Call::UpdateVlan {
                network: network_id.into(),
                vlan: vlan_id,
                req: req.clone(),
            },
        )?;
        Self::check_vlans_enabled(&state, network_id)?;

        let vlan = state
            .vlans
            .get_mut(network_id)
            .and_then(|v| v.get_mut(&vlan_id))
            .ok_or_else(|| api_error(404, format!("VLAN {vlan_id} not found")))?;
        let old_subnet = vlan.subnet.clone();
        apply_update(vlan, req)?;
        let updated = vlan.clone();

        if let (Some(old), Some(new)) = (old_subnet, req.subnet.as_ref()) {
            if let Some(vpn) = state.vpn.get_mut(network_id) {
                for entry in vpn.subnets.iter_mut().filter(|s| s.local_subnet == old) {
                    entry.local_subnet.clone_from(new);
                }
            }
        }
        Ok(updated)
    }

    async fn get_site_to_site_vpn(&self, network_id: &str) -> Result<SiteToSiteVpn, Error> {
        let mut state = self.lock();
        Self::enter(
            &mut state,
            Call::GetVpn {
                network: network_id.into(),
            },
        )?;
        state
            .vpn
            .get(network_id)
            .cloned()
            .ok_or_else(|| api_error(404, "Site-to-site VPN settings not found"))
    }

    async fn update_site_to_site_vpn(
        &self,
        network_id: &str,
        req: &UpdateVpnRequest,
    ) -> Result<SiteToSiteVpn, Error> {
        req.validate()?;
        let mut state = self.lock();
        Self::enter(
            &mut state,
            Call::UpdateVpn {
                network: network_id.into(),
                req: req.clone(),
            },
        )?;
        let vpn = state.vpn.entry(network_id.into()).or_insert_with(|| SiteToSiteVpn {
            mode: "none".into(),
            hubs: Vec::new(),
            subnets: Vec::new(),
            extra: serde_json::Map::new(),
        });
        vpn.mode.clone_from(&req.mode);
        vpn.hubs.clone_from(&req.hubs);
        vpn.subnets.clone_from(&req.subnets);
        Ok(vpn.clone())
    }

    async fn get_port(&self, network_id: &str, port: u32) -> Result<AppliancePort, Error> {
        let mut state = self.lock();
        Self::enter(
            &mut state,
            Call::GetPort {
                network: network_id.into(),
                port,
            },
        )?;
        state
            .ports
            .get(&(network_id.to_owned(), port))
            .cloned()
            .ok_or_else(|| api_error(404, format!("Port {port} not found")))
    }

    async fn update_port(
        &self,
        network_id: &str,
        port: u32,
        req: &UpdatePortRequest,
    ) -> Result<AppliancePort, Error> {
        req.validate()?;
        let mut state = self.lock();
        Self::enter(
            &mut state,
            Call::UpdatePort {
                network: network_id.into(),
                port,
                req: req.clone(),
            },
        )?;
        let current = state
            .ports
            .get_mut(&(network_id.to_owned(), port))
            .ok_or_else(|| api_error(404, format!("Port {port} not found")))?;
        current.enabled = req.enabled;
        current.port_type = Some(req.port_type.to_string());
        current.vlan = Some(req.vlan);
        current.access_policy = req.access_policy.map(|p| p.to_string());
        current.allowed_vlans.clone_from(&req.allowed_vlans);
        current.drop_untagged_traffic = req.drop_untagged_traffic;
        Ok(current.clone())
    }
}
