// VLAN compliance report
//
// Read-only sweep over every network: which catalog VLANs are absent, and
// which exist under a different id. Nothing is written to the Dashboard
// and no backups are taken.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sitesync_api::DashboardApi;
use tracing::{debug, info, warn};

use crate::declared::VlanCatalog;
use crate::error::CoreError;
use crate::identity::NetworkMap;

/// File name of the report inside the output directory.
pub const REPORT_FILE: &str = "vlan_report.json";

/// Error recorded for networks whose appliance runs without VLANs.
pub const NOT_ENABLED: &str = "VLANs not enabled";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchedVlan {
    pub name: String,
    pub expected_id: u16,
    pub actual_id: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkReport {
    pub missing_vlans: Vec<String>,
    pub mismatched_vlans: Vec<MismatchedVlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NetworkReport {
    fn errored(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.error.is_none() && self.missing_vlans.is_empty() && self.mismatched_vlans.is_empty()
    }
}

/// Network name → findings, sorted by name.
pub type VlanReport = BTreeMap<String, NetworkReport>;

/// Compare one network's VLANs against the catalog.
pub fn compare(catalog: &VlanCatalog, observed: &HashMap<&str, u16>) -> NetworkReport {
    let mut report = NetworkReport::default();
    for (name, entry) in catalog.iter() {
        match observed.get(name) {
            None => report.missing_vlans.push(name.to_owned()),
            Some(&actual_id) if actual_id != entry.id => {
                report.mismatched_vlans.push(MismatchedVlan {
                    name: name.to_owned(),
                    expected_id: entry.id,
                    actual_id,
                });
            }
            Some(_) => {}
        }
    }
    report
}

/// Build the report for every network in `networks`.
pub async fn build_report(
    api: &dyn DashboardApi,
    networks: &NetworkMap,
    catalog: &VlanCatalog,
) -> VlanReport {
    let mut report = VlanReport::new();
    for (name, id) in networks {
        let entry = match api.list_vlans(id).await {
            Ok(vlans) => {
                let observed: HashMap<&str, u16> =
                    vlans.iter().map(|v| (v.name.as_str(), v.id)).collect();
                compare(catalog, &observed)
            }
            Err(e) if e.is_not_enabled() => {
                debug!(network = %name, "VLANs not enabled");
                NetworkReport::errored(NOT_ENABLED)
            }
            Err(e) => {
                warn!(network = %name, error = %e, "cannot list VLANs");
                NetworkReport::errored(e.to_string())
            }
        };
        report.insert(name.clone(), entry);
    }
    report
}

/// Write `report` as pretty JSON to `<dir>/vlan_report.json`.
pub fn write_report(dir: &Path, report: &VlanReport) -> Result<PathBuf, CoreError> {
    fs::create_dir_all(dir).map_err(|e| CoreError::io(dir, e))?;
    let path = dir.join(REPORT_FILE);
    let body = serde_json::to_string_pretty(report)
        .map_err(|e| CoreError::Internal(format!("cannot serialize report: {e}")))?;
    fs::write(&path, body).map_err(|e| CoreError::io(&path, e))?;
    info!(path = %path.display(), networks = report.len(), "VLAN report written");
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn missing_and_mismatched() {
        let catalog =
            VlanCatalog::from_json(r#"{"Data": {"ID": 10}, "Voice": {"ID": 20}, "Guest": {"ID": 30}}"#)
                .unwrap();
        let observed = HashMap::from([("Data", 10), ("Voice", 21)]);
        let report = compare(&catalog, &observed);
        assert_eq!(report.missing_vlans, vec!["Guest"]);
        assert_eq!(
            report.mismatched_vlans,
            vec![MismatchedVlan {
                name: "Voice".into(),
                expected_id: 20,
                actual_id: 21
            }]
        );
    }

    #[test]
    fn error_field_only_when_set() {
        let clean = serde_json::to_value(NetworkReport::default()).unwrap();
        assert_eq!(clean, json!({"missing_vlans": [], "mismatched_vlans": []}));
        let errored = serde_json::to_value(NetworkReport::errored(NOT_ENABLED)).unwrap();
        assert_eq!(
            errored,
            json!({"missing_vlans": [], "mismatched_vlans": [], "error": "VLANs not enabled"})
        );
    }
}
