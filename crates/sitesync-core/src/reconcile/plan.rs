// Pure diff of declared against observed VLANs.
//
// Nothing here touches the network. `reconcile` turns a site's
// declarations and the VLANs the appliance reports into create, update
// and rename buckets, and `VlanAction` builds the request for each.

use std::collections::HashMap;
use std::net::IpAddr;

use serde::Serialize;
use sitesync_api::{ApplianceVlan, CreateVlanRequest, Ipv6Settings, UpdateVlanRequest};
use tracing::{debug, warn};

use crate::declared::SiteVlan;
use crate::error::CoreError;
use crate::validate::{DeclaredPrefix, same_network};

/// Where a declared VLAN stands against the appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// No VLAN with this id exists.
    Missing,
    /// The id exists on a different network.
    PrefixChanged,
    /// Same id and network, different name.
    RenameOnly,
    Unchanged,
}

/// What to do with a declared prefix that does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidPrefix {
    /// Warn and leave that VLAN out of the plan.
    Skip,
    /// Fail the whole site.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub add_missing: bool,
    pub update_existing: bool,
    /// Match by id and detect renames. When off, VLANs are matched by name
    /// and the VPN is left alone.
    pub rename_aware: bool,
    pub invalid_prefix: InvalidPrefix,
}

impl ReconcileOptions {
    pub fn new(add_missing: bool, update_existing: bool) -> Self {
        Self {
            add_missing,
            update_existing,
            rename_aware: true,
            invalid_prefix: InvalidPrefix::Skip,
        }
    }

    /// Name-matched, strict-prefix behavior of earlier releases.
    pub fn legacy(self) -> Self {
        Self {
            rename_aware: false,
            invalid_prefix: InvalidPrefix::Abort,
            ..self
        }
    }

    pub fn ensure_actionable(&self) -> Result<(), CoreError> {
        if self.add_missing || self.update_existing {
            Ok(())
        } else {
            Err(CoreError::NoOperation)
        }
    }
}

/// A classified declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanAction {
    pub name: String,
    /// The VLAN id to act on. Equals the catalog id except in legacy mode,
    /// where it is the id of the name-matched VLAN.
    pub id: u16,
    pub subnet: String,
    pub prefix: DeclaredPrefix,
    pub vpn_mode: Option<bool>,
    pub dhcp_server: bool,
    pub classification: Classification,
    /// Name on the appliance, when one was matched.
    pub observed_name: Option<String>,
}

impl VlanAction {
    fn appliance_ip(&self) -> IpAddr {
        self.prefix.address()
    }

    pub fn create_request(&self) -> CreateVlanRequest {
        CreateVlanRequest {
            id: self.id,
            name: self.name.clone(),
            subnet: self.subnet.clone(),
            appliance_ip: self.appliance_ip().to_string(),
            ipv6: Ipv6Settings { enabled: true },
            vpn_mode: self.vpn_mode,
        }
    }

    pub fn prefix_update_request(&self) -> UpdateVlanRequest {
        UpdateVlanRequest {
            name: Some(self.name.clone()),
            subnet: Some(self.subnet.clone()),
            appliance_ip: Some(self.appliance_ip().to_string()),
            ipv6: Some(Ipv6Settings { enabled: true }),
            vpn_mode: self.vpn_mode,
            ..UpdateVlanRequest::default()
        }
    }

    pub fn rename_request(&self) -> UpdateVlanRequest {
        UpdateVlanRequest::rename(self.name.clone())
    }
}

/// A declaration left out of the plan, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedVlan {
    pub name: String,
    pub id: u16,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_create: Vec<VlanAction>,
    pub to_update: Vec<VlanAction>,
    pub to_rename: Vec<VlanAction>,
    pub unchanged: Vec<VlanAction>,
    /// Classified, but the options do not allow acting on them.
    pub deferred: Vec<VlanAction>,
    pub skipped: Vec<SkippedVlan>,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_rename.is_empty()
    }
}

fn subnet_matches(declared: &str, observed: Option<&str>) -> bool {
    observed.is_some_and(|s| same_network(declared, s))
}

/// Four-way classification of one declaration against the VLAN observed
/// under the same id.
pub fn classify(declared: &SiteVlan, observed: Option<&ApplianceVlan>) -> Classification {
    match observed {
        None => Classification::Missing,
        Some(o) if !subnet_matches(&declared.prefix, o.subnet.as_deref()) => {
            Classification::PrefixChanged
        }
        Some(o) if o.name != declared.name => Classification::RenameOnly,
        Some(_) => Classification::Unchanged,
    }
}

fn classify_by_name(declared: &SiteVlan, observed: Option<&ApplianceVlan>) -> Classification {
    match observed {
        None => Classification::Missing,
        Some(o) if subnet_matches(&declared.prefix, o.subnet.as_deref()) => {
            Classification::Unchanged
        }
        Some(_) => Classification::PrefixChanged,
    }
}

/// Diff `declared` against `observed` for `site`.
///
/// Declarations with an empty prefix are not configured for the site and
/// are ignored.
pub fn reconcile(
    site: &str,
    declared: &[SiteVlan],
    observed: &[ApplianceVlan],
    options: &ReconcileOptions,
) -> Result<ReconcilePlan, CoreError> {
    options.ensure_actionable()?;

    let by_id: HashMap<u16, &ApplianceVlan> = observed.iter().map(|v| (v.id, v)).collect();
    let by_name: HashMap<&str, &ApplianceVlan> =
        observed.iter().map(|v| (v.name.as_str(), v)).collect();

    let mut plan = ReconcilePlan::default();
    for decl in declared {
        if decl.prefix.is_empty() {
            debug!(site, vlan = decl.id, name = %decl.name, "no prefix declared; not configured here");
            continue;
        }

        let prefix = match DeclaredPrefix::parse(site, &decl.prefix) {
            Ok(p) => p,
            Err(e) if options.invalid_prefix == InvalidPrefix::Abort => return Err(e),
            Err(e) => {
                warn!(site, vlan = decl.id, error = %e, "skipping VLAN with invalid prefix");
                plan.skipped.push(SkippedVlan {
                    name: decl.name.clone(),
                    id: decl.id,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let (matched, classification) = if options.rename_aware {
            let matched = by_id.get(&decl.id).copied();
            (matched, classify(decl, matched))
        } else {
            let matched = by_name.get(decl.name.as_str()).copied();
            (matched, classify_by_name(decl, matched))
        };

        let action = VlanAction {
            name: decl.name.clone(),
            id: matched.map_or(decl.id, |o| o.id),
            subnet: decl.prefix.clone(),
            prefix,
            vpn_mode: decl.vpn_mode,
            dhcp_server: decl.dhcp_server,
            classification,
            observed_name: matched.map(|o| o.name.clone()),
        };

        let bucket = match classification {
            Classification::Missing if options.add_missing => &mut plan.to_create,
            Classification::PrefixChanged if options.update_existing => &mut plan.to_update,
            Classification::RenameOnly if options.update_existing => &mut plan.to_rename,
            Classification::Unchanged => &mut plan.unchanged,
            _ => &mut plan.deferred,
        };
        bucket.push(action);
    }
    Ok(plan)
}
