//! Port sync command handler.

use tabled::Tabled;
use tracing::{info, warn};

use sitesync_core::declared::{load_ports_multi_site, load_ports_single_site};
use sitesync_core::{PortChange, PortOutcome, Reconciler, VlanCatalog, validate_ports};

use crate::cli::{GlobalOpts, PortsArgs};
use crate::error::CliError;
use crate::output;

use super::{Session, finish, network_for, selected_sites};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PortRow {
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Port")]
    number: u32,
    #[tabled(rename = "Type")]
    port_type: String,
    #[tabled(rename = "VLAN")]
    vlan: u16,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&PortOutcome> for PortRow {
    fn from(p: &PortOutcome) -> Self {
        Self {
            site: p.site.clone(),
            number: p.number,
            port_type: p.port_type.to_string(),
            vlan: p.vlan,
            result: p.outcome.label().into(),
            detail: p.outcome.detail().unwrap_or_default().into(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: &PortsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = Session::connect(global).await?;
    let settings = &session.settings;
    let layout = settings.layout();
    let catalog = VlanCatalog::load(&layout.catalog_path())?;
    let sites = selected_sites(&args.sites, settings)?;

    // Every row is validated before the first port is touched.
    let rows = if args.multi_site {
        load_ports_multi_site(&layout.resolve(&args.file))?
    } else {
        let mut rows = Vec::new();
        for site in &sites {
            rows.extend(load_ports_single_site(
                &layout.site_dir(site).join(&args.file),
                site,
            )?);
        }
        rows
    };
    let changes: Vec<PortChange> = validate_ports(&rows, &catalog)?;
    info!(rows = changes.len(), "port file validated");

    let networks = session.networks().await?;
    let reconciler = Reconciler::new(session.api.clone(), settings.backup_store(), layout);

    let mut outcomes = Vec::new();
    let mut failed = 0;
    for site in &sites {
        let Some(network_id) = network_for(site, &networks) else {
            failed += 1;
            continue;
        };
        let results = reconciler.sync_ports(site, network_id, &changes).await;
        if results.is_empty() {
            warn!(site, "no port rows for site");
        }
        if results.iter().any(|p| p.outcome.is_failure()) {
            failed += 1;
        }
        outcomes.extend(results);
    }

    let out = output::render(
        &global.output,
        outcomes.as_slice(),
        |d| d.iter().map(PortRow::from).collect(),
        |d| {
            d.iter()
                .map(|p| format!("{}\t{}\t{}", p.site, p.number, p.outcome.label()))
                .collect()
        },
    )?;
    output::print_output(&out, global.quiet);
    finish(failed, sites.len())
}
