// DHCP provisioning for a VLAN that was just created or re-addressed.

use tracing::{error, info, warn};

use super::{Outcome, Reconciler};
use crate::declared::DhcpDocuments;
use crate::error::CoreError;

impl Reconciler {
    /// Push the DHCP documents under `<site>/<vlan name>/` to the VLAN.
    pub(super) async fn provision_dhcp(
        &self,
        site: &str,
        network_id: &str,
        vlan_name: &str,
        vlan_id: u16,
    ) -> Outcome {
        let dir = self.layout.vlan_dir(site, vlan_name);
        let documents = match DhcpDocuments::load(&dir) {
            Ok(Some(documents)) => documents,
            Ok(None) => {
                warn!(
                    site,
                    vlan = vlan_id,
                    dir = %dir.display(),
                    "{} not found; DHCP settings not applied",
                    DhcpDocuments::SETTINGS_FILE
                );
                return Outcome::skipped(format!(
                    "{} not found in {}",
                    DhcpDocuments::SETTINGS_FILE,
                    dir.display()
                ));
            }
            Err(e) => {
                error!(site, vlan = vlan_id, error = %e, "invalid DHCP documents");
                return Outcome::failed(CoreError::from(e));
            }
        };

        let label = format!("vlan_{vlan_id}_dhcp");
        if let Err(e) = self
            .fetch_and_snapshot(site, &label, self.api.get_vlan(network_id, vlan_id))
            .await
        {
            error!(site, vlan = vlan_id, error = %e, "backup failed; DHCP settings not applied");
            return Outcome::failed(format!("backup failed: {e}"));
        }

        match self
            .api
            .update_vlan(network_id, vlan_id, &documents.into_request())
            .await
        {
            Ok(_) => {
                info!(site, vlan = vlan_id, "DHCP settings applied");
                Outcome::Applied
            }
            Err(e) => {
                error!(site, vlan = vlan_id, error = %e, "failed to apply DHCP settings");
                Outcome::failed(CoreError::from(e))
            }
        }
    }
}
