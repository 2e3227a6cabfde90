// VLAN execution: creates, prefix updates and renames for one site.

use tracing::{error, info, warn};

use super::plan::{ReconcileOptions, VlanAction, reconcile};
use super::{Outcome, Reconciler, SiteReport, VlanOutcome};
use crate::declared::SiteVlan;
use crate::error::CoreError;

impl Reconciler {
    /// Bring `network_id` in line with `declared`.
    ///
    /// Fails as a whole only when the options ask for nothing, the VLAN
    /// list cannot be read, or an invalid prefix is fatal under the
    /// options. Individual write failures are recorded and the run moves
    /// on to the next VLAN.
    pub async fn sync_vlans(
        &self,
        site: &str,
        network_id: &str,
        declared: &[SiteVlan],
        options: &ReconcileOptions,
    ) -> Result<SiteReport, CoreError> {
        options.ensure_actionable()?;

        let observed = self.api.list_vlans(network_id).await?;
        let plan = reconcile(site, declared, &observed, options)?;
        info!(
            site,
            create = plan.to_create.len(),
            update = plan.to_update.len(),
            rename = plan.to_rename.len(),
            unchanged = plan.unchanged.len(),
            "VLAN plan"
        );

        let mut vlans = Vec::new();
        for action in &plan.to_create {
            vlans.push(self.create(site, network_id, action, options).await);
        }
        for action in &plan.to_update {
            vlans.push(self.update_prefix(site, network_id, action, options).await);
        }
        for action in &plan.to_rename {
            vlans.push(self.rename(site, network_id, action).await);
        }
        for action in &plan.unchanged {
            vlans.push(VlanOutcome::new(action, Outcome::Unchanged));
        }
        for action in &plan.deferred {
            let reason = if options.add_missing {
                "updating existing VLANs was not requested"
            } else {
                "adding missing VLANs was not requested"
            };
            vlans.push(VlanOutcome::new(action, Outcome::skipped(reason)));
        }
        for skipped in &plan.skipped {
            vlans.push(VlanOutcome {
                name: skipped.name.clone(),
                vlan_id: skipped.id,
                classification: None,
                outcome: Outcome::skipped(skipped.reason.clone()),
                dhcp: None,
                vpn: None,
            });
        }

        Ok(SiteReport {
            site: site.to_owned(),
            network_id: network_id.to_owned(),
            vlans,
        })
    }

    async fn create(
        &self,
        site: &str,
        network_id: &str,
        action: &VlanAction,
        options: &ReconcileOptions,
    ) -> VlanOutcome {
        match self.api.create_vlan(network_id, &action.create_request()).await {
            Ok(_) => {
                info!(site, vlan = action.id, name = %action.name, subnet = %action.subnet, "VLAN added");
                self.follow_up(site, network_id, action, options, Outcome::Applied)
                    .await
            }
            Err(e) => {
                error!(site, vlan = action.id, error = %e, "failed to add VLAN");
                VlanOutcome::new(action, Outcome::failed(CoreError::from(e)))
            }
        }
    }

    async fn update_prefix(
        &self,
        site: &str,
        network_id: &str,
        action: &VlanAction,
        options: &ReconcileOptions,
    ) -> VlanOutcome {
        let label = format!("vlan_{}", action.id);
        if let Err(e) = self
            .fetch_and_snapshot(site, &label, self.api.get_vlan(network_id, action.id))
            .await
        {
            error!(site, vlan = action.id, error = %e, "backup failed; VLAN not updated");
            return VlanOutcome::new(action, Outcome::failed(format!("backup failed: {e}")));
        }

        match self
            .api
            .update_vlan(network_id, action.id, &action.prefix_update_request())
            .await
        {
            Ok(_) => {
                info!(site, vlan = action.id, subnet = %action.subnet, "VLAN prefix updated");
                self.follow_up(site, network_id, action, options, Outcome::Applied)
                    .await
            }
            Err(e) => {
                error!(site, vlan = action.id, error = %e, "failed to update VLAN");
                VlanOutcome::new(action, Outcome::failed(CoreError::from(e)))
            }
        }
    }

    async fn rename(&self, site: &str, network_id: &str, action: &VlanAction) -> VlanOutcome {
        let label = format!("vlan_{}", action.id);
        if let Err(e) = self
            .fetch_and_snapshot(site, &label, self.api.get_vlan(network_id, action.id))
            .await
        {
            error!(site, vlan = action.id, error = %e, "backup failed; VLAN not renamed");
            return VlanOutcome::new(action, Outcome::failed(format!("backup failed: {e}")));
        }

        match self
            .api
            .update_vlan(network_id, action.id, &action.rename_request())
            .await
        {
            Ok(_) => {
                info!(
                    site,
                    vlan = action.id,
                    from = action.observed_name.as_deref().unwrap_or_default(),
                    to = %action.name,
                    "VLAN renamed"
                );
                VlanOutcome::new(action, Outcome::Applied)
            }
            Err(e) => {
                error!(site, vlan = action.id, error = %e, "failed to rename VLAN");
                VlanOutcome::new(action, Outcome::failed(CoreError::from(e)))
            }
        }
    }

    /// DHCP and VPN steps for a VLAN whose subnet was just written.
    async fn follow_up(
        &self,
        site: &str,
        network_id: &str,
        action: &VlanAction,
        options: &ReconcileOptions,
        outcome: Outcome,
    ) -> VlanOutcome {
        let mut result = VlanOutcome::new(action, outcome);

        if action.dhcp_server {
            result.dhcp = Some(
                self.provision_dhcp(site, network_id, &action.name, action.id)
                    .await,
            );
        }

        if options.rename_aware {
            result.vpn = Some(match action.vpn_mode {
                Some(use_vpn) => {
                    self.propagate_vpn(site, network_id, &action.prefix, use_vpn)
                        .await
                }
                None => {
                    warn!(site, vlan = action.id, "no VPN mode in the catalog; VPN left as is");
                    Outcome::skipped("no VPN mode declared")
                }
            });
        }

        result
    }
}
