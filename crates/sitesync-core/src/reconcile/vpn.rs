// Site-to-site VPN propagation.
//
// The Dashboard adds a subnet entry for every VLAN on its own; the tool
// only flips that entry's `useVpn` flag. Mode and hubs go back unchanged.

use sitesync_api::{SiteToSiteVpn, UpdateVpnRequest};
use tracing::{error, info, warn};

use super::{Outcome, Reconciler};
use crate::error::CoreError;
use crate::validate::DeclaredPrefix;

/// Request that sets `use_vpn` on the entry for `prefix`'s network.
/// `None` when the VPN settings have no such entry.
pub fn advertise_subnet(
    site: &str,
    vpn: &SiteToSiteVpn,
    prefix: &DeclaredPrefix,
    use_vpn: bool,
) -> Option<UpdateVpnRequest> {
    let mut subnets = vpn.subnets.clone();
    let entry = subnets.iter_mut().find(|s| {
        DeclaredPrefix::parse(site, &s.local_subnet).is_ok_and(|p| p.same_network_as(prefix))
    })?;
    entry.use_vpn = use_vpn;
    Some(UpdateVpnRequest {
        mode: vpn.mode.clone(),
        hubs: vpn.hubs.clone(),
        subnets,
    })
}

impl Reconciler {
    pub(super) async fn propagate_vpn(
        &self,
        site: &str,
        network_id: &str,
        prefix: &DeclaredPrefix,
        use_vpn: bool,
    ) -> Outcome {
        let current = match self
            .fetch_and_snapshot(site, "site_to_site_vpn", self.api.get_site_to_site_vpn(network_id))
            .await
        {
            Ok(current) => current,
            Err(e) => {
                error!(site, error = %e, "cannot read site-to-site VPN settings");
                return Outcome::failed(CoreError::from(e));
            }
        };

        let Some(req) = advertise_subnet(site, &current, prefix, use_vpn) else {
            warn!(site, subnet = %prefix, "subnet not found in site-to-site VPN settings");
            return Outcome::skipped(format!("{prefix} is not in the VPN subnet list"));
        };

        match self.api.update_site_to_site_vpn(network_id, &req).await {
            Ok(_) => {
                info!(site, subnet = %prefix, use_vpn, "site-to-site VPN updated");
                Outcome::Applied
            }
            Err(e) => {
                error!(site, subnet = %prefix, error = %e, "failed to update site-to-site VPN");
                Outcome::failed(CoreError::from(e))
            }
        }
    }
}
