// Dashboard operations as a trait, so the reconciler can run against
// either the HTTP client or the in-memory mock.

use async_trait::async_trait;

use crate::client::DashboardClient;
use crate::error::Error;
use crate::models::{AppliancePort, ApplianceVlan, Network, Organization, SiteToSiteVpn};
use crate::requests::{CreateVlanRequest, UpdatePortRequest, UpdateVlanRequest, UpdateVpnRequest};

/// Every Dashboard call the tool makes.
///
/// All methods are `Send` so implementors work on a multi-threaded runtime.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    // Organization
    async fn get_organization(&self, org_id: &str) -> Result<Organization, Error>;
    async fn list_networks(&self, org_id: &str) -> Result<Vec<Network>, Error>;

    // VLANs
    async fn list_vlans(&self, network_id: &str) -> Result<Vec<ApplianceVlan>, Error>;
    async fn get_vlan(&self, network_id: &str, vlan_id: u16) -> Result<ApplianceVlan, Error>;
    async fn create_vlan(
        &self,
        network_id: &str,
        req: &CreateVlanRequest,
    ) -> Result<ApplianceVlan, Error>;
    async fn update_vlan(
        &self,
        network_id: &str,
        vlan_id: u16,
        req: &UpdateVlanRequest,
    ) -> Result<ApplianceVlan, Error>;

    // Site-to-site VPN
    async fn get_site_to_site_vpn(&self, network_id: &str) -> Result<SiteToSiteVpn, Error>;
    async fn update_site_to_site_vpn(
        &self,
        network_id: &str,
        req: &UpdateVpnRequest,
    ) -> Result<SiteToSiteVpn, Error>;

    // Ports
    async fn get_port(&self, network_id: &str, port: u32) -> Result<AppliancePort, Error>;
    async fn update_port(
        &self,
        network_id: &str,
        port: u32,
        req: &UpdatePortRequest,
    ) -> Result<AppliancePort, Error>;
}

#[async_trait]
impl DashboardApi for DashboardClient {
    async fn get_organization(&self, org_id: &str) -> Result<Organization, Error> {
        Self::get_organization(self, org_id).await
    }

    async fn list_networks(&self, org_id: &str) -> Result<Vec<Network>, Error> {
        Self::list_networks(self, org_id).await
    }

    async fn list_vlans(&self, network_id: &str) -> Result<Vec<ApplianceVlan>, Error> {
        Self::list_vlans(self, network_id).await
    }

    async fn get_vlan(&self, network_id: &str, vlan_id: u16) -> Result<ApplianceVlan, Error> {
        Self::get_vlan(self, network_id, vlan_id).await
    }

    async fn create_vlan(
        &self,
        network_id: &str,
        req: &CreateVlanRequest,
    ) -> Result<ApplianceVlan, Error> {
        Self::create_vlan(self, network_id, req).await
    }

    async fn update_vlan(
        &self,
        network_id: &str,
        vlan_id: u16,
        req: &UpdateVlanRequest,
    ) -> Result<ApplianceVlan, Error> {
        Self::update_vlan(self, network_id, vlan_id, req).await
    }

    async fn get_site_to_site_vpn(&self, network_id: &str) -> Result<SiteToSiteVpn, Error> {
        Self::get_site_to_site_vpn(self, network_id).await
    }

    async fn update_site_to_site_vpn(
        &self,
        network_id: &str,
        req: &UpdateVpnRequest,
    ) -> Result<SiteToSiteVpn, Error> {
        Self::update_site_to_site_vpn(self, network_id, req).await
    }

    async fn get_port(&self, network_id: &str, port: u32) -> Result<AppliancePort, Error> {
        Self::get_port(self, network_id, port).await
    }

    async fn update_port(
        &self,
        network_id: &str,
        port: u32,
        req: &UpdatePortRequest,
    ) -> Result<AppliancePort, Error> {
        Self::update_port(self, network_id, port, req).await
    }
}
