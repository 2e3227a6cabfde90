// Appliance port configuration.
//
// Ports have no create or delete: every declared row becomes an update.
// The whole batch is validated before anything is sent, and one bad row
// rejects the batch.

use serde::Serialize;
use sitesync_api::{AccessPolicy, PortType, UpdatePortRequest};
use tracing::{error, info};

use super::{Outcome, Reconciler};
use crate::declared::{PortRecord, VlanCatalog};
use crate::error::CoreError;
use crate::validate::{parse_role, parse_security};

/// A validated port row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortChange {
    pub site: String,
    pub number: u32,
    pub request: UpdatePortRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortOutcome {
    pub site: String,
    pub number: u32,
    pub port_type: PortType,
    pub vlan: u16,
    pub outcome: Outcome,
}

fn required<'a>(
    field: &str,
    value: Option<&'a String>,
    site: &str,
    row: usize,
) -> Result<&'a str, CoreError> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            CoreError::validation(format!(
                "port row {row} for site '{site}' is missing required field '{field}'"
            ))
        })
}

fn validate_row(index: usize, row: &PortRecord, catalog: &VlanCatalog) -> Result<PortChange, CoreError> {
    let line = index + 1;
    let site = required("site_name", row.site_name.as_ref(), "?", line)?;
    let number = required("number", row.number.as_ref(), site, line)?;
    let role = required("type", row.port_type.as_ref(), site, line)?;
    let vlan = required("vlan", row.vlan.as_ref(), site, line)?;
    let secure = required("secure", row.secure.as_ref(), site, line)?;

    let port_type = parse_role(site, number, role)?;
    let secured = parse_security(site, number, secure)?;

    let parsed_number: u32 = number.parse().map_err(|_| {
        CoreError::validation(format!("invalid port number '{number}' at {site}"))
    })?;
    let vlan_id: u16 = vlan
        .parse()
        .ok()
        .filter(|id| catalog.contains_id(*id))
        .ok_or_else(|| {
            CoreError::validation(format!(
                "VLAN '{vlan}' for port {number} at {site} is not in the VLAN catalog"
            ))
        })?;

    let request = match port_type {
        PortType::Access => {
            let policy = if secured {
                AccessPolicy::HybridRadius
            } else {
                AccessPolicy::Open
            };
            UpdatePortRequest::access(vlan_id, policy)
        }
        PortType::Trunk => UpdatePortRequest::trunk(vlan_id),
    };

    Ok(PortChange {
        site: site.to_owned(),
        number: parsed_number,
        request,
    })
}

/// Validate every row. The first invalid row fails the batch.
pub fn validate_ports(rows: &[PortRecord], catalog: &VlanCatalog) -> Result<Vec<PortChange>, CoreError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| validate_row(i, row, catalog))
        .collect()
}

impl Reconciler {
    /// Apply the changes for `site`. Rows for other sites are ignored.
    pub async fn sync_ports(
        &self,
        site: &str,
        network_id: &str,
        changes: &[PortChange],
    ) -> Vec<PortOutcome> {
        let mut outcomes = Vec::new();
        for change in changes.iter().filter(|c| c.site == site) {
            let outcome = self.apply_port(site, network_id, change).await;
            outcomes.push(PortOutcome {
                site: site.to_owned(),
                number: change.number,
                port_type: change.request.port_type,
                vlan: change.request.vlan,
                outcome,
            });
        }
        outcomes
    }

    async fn apply_port(&self, site: &str, network_id: &str, change: &PortChange) -> Outcome {
        let label = format!("port_{}", change.number);
        if let Err(e) = self
            .fetch_and_snapshot(site, &label, self.api.get_port(network_id, change.number))
            .await
        {
            error!(site, port = change.number, error = %e, "backup failed; port not updated");
            return Outcome::failed(format!("backup failed: {e}"));
        }

        match self
            .api
            .update_port(network_id, change.number, &change.request)
            .await
        {
            Ok(_) => {
                info!(
                    site,
                    port = change.number,
                    port_type = %change.request.port_type,
                    vlan = change.request.vlan,
                    "port updated"
                );
                Outcome::Applied
            }
            Err(e) => {
                error!(site, port = change.number, error = %e, "failed to update port");
                Outcome::failed(CoreError::from(e))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn catalog() -> VlanCatalog {
        VlanCatalog::from_json(r#"{"Data": {"ID": 10}, "Voice": {"ID": 20}}"#).unwrap()
    }

    fn row(site: &str, number: &str, role: &str, vlan: &str, secure: &str) -> PortRecord {
        PortRecord {
            site_name: Some(site.into()),
            number: Some(number.into()),
            port_type: Some(role.into()),
            vlan: Some(vlan.into()),
            secure: Some(secure.into()),
        }
    }

    #[test]
    fn security_flag_selects_policy() {
        let changes = validate_ports(
            &[row("s", "3", "access", "10", "Y"), row("s", "4", "access", "20", "n")],
            &catalog(),
        )
        .unwrap();
        assert_eq!(changes[0].request.access_policy, Some(AccessPolicy::HybridRadius));
        assert_eq!(changes[1].request.access_policy, Some(AccessPolicy::Open));
    }

    #[test]
    fn trunk_carries_all_vlans() {
        let changes = validate_ports(&[row("s", "5", "trunk", "10", "n")], &catalog()).unwrap();
        assert_eq!(changes[0].request, UpdatePortRequest::trunk(10));
    }

    #[test]
    fn one_bad_row_rejects_the_batch() {
        let rows = [
            row("s", "3", "access", "10", "y"),
            row("s", "4", "hybrid", "10", "y"),
        ];
        let err = validate_ports(&rows, &catalog()).unwrap_err();
        assert!(err.to_string().contains("hybrid"));
    }

    #[test]
    fn vlan_must_be_in_catalog() {
        let err = validate_ports(&[row("s", "3", "access", "99", "y")], &catalog()).unwrap_err();
        assert!(err.to_string().contains("not in the VLAN catalog"));
    }

    #[test]
    fn missing_fields_are_named() {
        let mut incomplete = row("s", "3", "access", "10", "y");
        incomplete.secure = None;
        let err = validate_ports(&[incomplete], &catalog()).unwrap_err();
        assert!(err.to_string().contains("'secure'"));
    }
}
