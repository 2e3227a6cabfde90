// ── Reconciliation engine ──
//
// `plan` is the pure diff. The rest executes a plan against a
// `DashboardApi`: VLAN writes first, then the DHCP and VPN follow-ups for
// each VLAN that was written, and ports as a separate batch. Every update
// of an existing entity is preceded by a snapshot; a failed snapshot
// abandons that one update.

mod dhcp;
mod plan;
mod ports;
mod vlans;
mod vpn;

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use sitesync_api::DashboardApi;

use crate::backup::BackupStore;
use crate::declared::InputLayout;
use crate::error::CoreError;

pub use plan::{
    Classification, InvalidPrefix, ReconcileOptions, ReconcilePlan, SkippedVlan, VlanAction,
    classify, reconcile,
};
pub use ports::{PortChange, PortOutcome, validate_ports};
pub use vpn::advertise_subnet;

/// Result of one step against the Dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    Unchanged,
    Skipped { reason: String },
    Failed { error: String },
}

impl Outcome {
    pub(crate) fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub(crate) fn failed(error: impl ToString) -> Self {
        Self::Failed {
            error: error.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Short label for tables.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Unchanged => "unchanged",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Skipped { reason } => Some(reason),
            Self::Failed { error } => Some(error),
            Self::Applied | Self::Unchanged => None,
        }
    }
}

/// What happened to one declared VLAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VlanOutcome {
    pub name: String,
    pub vlan_id: u16,
    /// `None` when the declaration never made it into the plan.
    pub classification: Option<Classification>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpn: Option<Outcome>,
}

impl VlanOutcome {
    fn new(action: &VlanAction, outcome: Outcome) -> Self {
        Self {
            name: action.name.clone(),
            vlan_id: action.id,
            classification: Some(action.classification),
            outcome,
            dhcp: None,
            vpn: None,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.outcome.is_failure()
            || self.dhcp.as_ref().is_some_and(Outcome::is_failure)
            || self.vpn.as_ref().is_some_and(Outcome::is_failure)
    }
}

/// Everything a VLAN run did at one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteReport {
    pub site: String,
    pub network_id: String,
    pub vlans: Vec<VlanOutcome>,
}

impl SiteReport {
    pub fn has_failures(&self) -> bool {
        self.vlans.iter().any(VlanOutcome::has_failures)
    }

    pub fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.vlans.iter().filter(|v| pred(&v.outcome)).count()
    }
}

/// Executes plans against the Dashboard, snapshotting before each update.
pub struct Reconciler {
    api: Arc<dyn DashboardApi>,
    backups: BackupStore,
    layout: InputLayout,
}

impl Reconciler {
    pub fn new(api: Arc<dyn DashboardApi>, backups: BackupStore, layout: InputLayout) -> Self {
        Self {
            api,
            backups,
            layout,
        }
    }

    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    /// Read the current state, record it, and hand it back.
    async fn fetch_and_snapshot<T, F>(
        &self,
        site: &str,
        endpoint: &str,
        fetch: F,
    ) -> Result<T, CoreError>
    where
        T: Serialize,
        F: Future<Output = Result<T, sitesync_api::Error>>,
    {
        let current = fetch.await?;
        self.backups.snapshot(site, endpoint, &current)?;
        Ok(current)
    }
}
