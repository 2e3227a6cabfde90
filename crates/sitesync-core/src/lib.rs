// sitesync-core: declarative site reconciliation for Meraki appliances.
//
// Loads the operator's declared configuration, diffs it against what the
// Dashboard reports, and applies the difference, snapshotting every
// entity into a per-site backup ledger before it is overwritten.

pub mod backup;
pub mod declared;
pub mod error;
pub mod identity;
pub mod prep;
pub mod reconcile;
pub mod report;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────

pub use backup::{BackupStore, DEFAULT_RETENTION_DAYS, Ledger};
pub use declared::{
    CatalogEntry, DhcpDocuments, InputLayout, PortRecord, SiteSubnets, SiteVlan, VlanCatalog,
};
pub use error::CoreError;
pub use identity::{DEFAULT_CACHE_TTL_DAYS, NetworkMap, NetworkResolver, clear_cache};
pub use prep::{PrepSummary, prepare_site};
pub use reconcile::{
    Classification, InvalidPrefix, Outcome, PortChange, PortOutcome, ReconcileOptions,
    ReconcilePlan, Reconciler, SiteReport, VlanOutcome, validate_ports,
};
pub use report::{NetworkReport, VlanReport, build_report, write_report};
pub use validate::{DeclaredPrefix, MacAddress, MacLayout};

// Client types callers need alongside the engine.
pub use sitesync_api::{DEFAULT_BASE_URL, DashboardApi, DashboardClient, TlsMode, TransportConfig};
