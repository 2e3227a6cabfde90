// Site-to-site VPN endpoints

use crate::client::DashboardClient;
use crate::error::Error;
use crate::models::SiteToSiteVpn;
use crate::requests::UpdateVpnRequest;

impl DashboardClient {
    pub async fn get_site_to_site_vpn(&self, network_id: &str) -> Result<SiteToSiteVpn, Error> {
        self.get(&format!("networks/{network_id}/appliance/vpn/siteToSiteVpn"))
            .await
    }

    /// Replaces the whole VPN configuration. Callers send back the hub
    /// list they fetched; an omitted hub list would detach a spoke.
    pub async fn update_site_to_site_vpn(
        &self,
        network_id: &str,
        req: &UpdateVpnRequest,
    ) -> Result<SiteToSiteVpn, Error> {
        req.validate()?;
        self.put(
            &format!("networks/{network_id}/appliance/vpn/siteToSiteVpn"),
            req,
        )
        .await
    }
}
