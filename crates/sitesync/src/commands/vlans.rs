//! VLAN sync command handler.

use tabled::Tabled;
use tracing::{error, info, warn};

use sitesync_core::declared::join;
use sitesync_core::{
    Classification, CoreError, Outcome, ReconcileOptions, Reconciler, SiteReport, SiteSubnets,
    VlanCatalog, VlanOutcome,
};

use crate::cli::{GlobalOpts, VlansArgs};
use crate::error::CliError;
use crate::output;

use super::{Session, finish, network_for, selected_sites};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct VlanRow {
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "VLAN")]
    id: u16,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "DHCP")]
    dhcp: String,
    #[tabled(rename = "VPN")]
    vpn: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn change_label(classification: Option<Classification>) -> &'static str {
    match classification {
        Some(Classification::Missing) => "create",
        Some(Classification::PrefixChanged) => "prefix",
        Some(Classification::RenameOnly) => "rename",
        Some(Classification::Unchanged) => "none",
        None => "-",
    }
}

fn step_label(step: Option<&Outcome>) -> String {
    step.map_or("-", Outcome::label).into()
}

impl VlanRow {
    fn new(site: &str, v: &VlanOutcome) -> Self {
        let detail = [Some(&v.outcome), v.dhcp.as_ref(), v.vpn.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(Outcome::detail)
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            site: site.to_owned(),
            id: v.vlan_id,
            name: v.name.clone(),
            change: change_label(v.classification).into(),
            result: v.outcome.label().into(),
            dhcp: step_label(v.dhcp.as_ref()),
            vpn: step_label(v.vpn.as_ref()),
            detail,
        }
    }
}

fn rows(reports: &[SiteReport]) -> Vec<VlanRow> {
    reports
        .iter()
        .flat_map(|r| r.vlans.iter().map(|v| VlanRow::new(&r.site, v)))
        .collect()
}

fn plain(reports: &[SiteReport]) -> Vec<String> {
    reports
        .iter()
        .flat_map(|r| {
            r.vlans
                .iter()
                .map(|v| format!("{}\t{}\t{}", r.site, v.vlan_id, v.outcome.label()))
        })
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: &VlansArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut options = ReconcileOptions::new(args.add, args.update);
    if args.legacy {
        options = options.legacy();
    }
    options.ensure_actionable()?;

    let session = Session::connect(global).await?;
    let settings = &session.settings;
    let layout = settings.layout();
    let catalog = VlanCatalog::load(&layout.catalog_path())?;
    let sites = selected_sites(&args.sites, settings)?;

    let shared = match (&args.file, args.multi_site) {
        (Some(file), true) => Some(SiteSubnets::load_multi_site(&layout.resolve(file))?),
        _ => None,
    };

    let networks = session.networks().await?;
    let reconciler = Reconciler::new(session.api.clone(), settings.backup_store(), layout.clone());

    let mut reports = Vec::new();
    let mut failed = 0;
    for site in &sites {
        let Some(network_id) = network_for(site, &networks) else {
            failed += 1;
            continue;
        };

        let loaded;
        let subnets = match shared {
            Some(ref all) => all,
            None => {
                let path = args
                    .file
                    .as_ref()
                    .map_or_else(|| layout.subnets_path(site), |f| layout.site_dir(site).join(f));
                loaded = match SiteSubnets::load_single_site(&path, site) {
                    Ok(subnets) => subnets,
                    Err(e) => {
                        error!(site, error = %e, "cannot load subnet file; skipping site");
                        failed += 1;
                        continue;
                    }
                };
                &loaded
            }
        };
        let Some(record) = subnets.for_site(site) else {
            warn!(site, "site has no row in the subnet file; skipping");
            failed += 1;
            continue;
        };

        let declared = join(site, record, &catalog);
        match reconciler.sync_vlans(site, network_id, &declared, &options).await {
            Ok(report) => {
                if report.has_failures() {
                    failed += 1;
                }
                info!(
                    site,
                    applied = report.count(|o| matches!(o, Outcome::Applied)),
                    failed = report.count(Outcome::is_failure),
                    "VLAN sync finished"
                );
                reports.push(report);
            }
            Err(e @ CoreError::Validation { .. }) => {
                error!(site, error = %e, "declared VLANs rejected; site not changed");
                failed += 1;
            }
            Err(e) => {
                error!(site, error = %e, "VLAN sync aborted");
                failed += 1;
            }
        }
    }

    let out = output::render(&global.output, reports.as_slice(), rows, plain)?;
    output::print_output(&out, global.quiet);
    finish(failed, sites.len())
}
