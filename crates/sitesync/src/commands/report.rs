//! VLAN compliance report handler.

use tabled::Tabled;
use tracing::info;

use sitesync_core::{NetworkReport, VlanCatalog, VlanReport, build_report, write_report};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Network")]
    network: String,
    #[tabled(rename = "Missing")]
    missing: String,
    #[tabled(rename = "Mismatched")]
    mismatched: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl ReportRow {
    fn new(network: &str, r: &NetworkReport) -> Self {
        Self {
            network: network.to_owned(),
            missing: r.missing_vlans.join(", "),
            mismatched: r
                .mismatched_vlans
                .iter()
                .map(|m| format!("{} ({} != {})", m.name, m.actual_id, m.expected_id))
                .collect::<Vec<_>>()
                .join(", "),
            error: r.error.clone().unwrap_or_default(),
        }
    }
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let session = Session::connect(global).await?;
    let settings = &session.settings;
    let catalog = VlanCatalog::load(&settings.layout().catalog_path())?;
    let networks = session.networks().await?;

    let report = build_report(session.api.as_ref(), &networks, &catalog).await;
    let path = write_report(&settings.dirs.output, &report)?;
    let compliant = report.values().filter(|r| r.is_compliant()).count();
    info!(
        path = %path.display(),
        networks = report.len(),
        compliant,
        "VLAN report written"
    );

    // Compliant networks clutter the table; the file keeps them.
    let out = output::render(
        &global.output,
        &report,
        |r: &VlanReport| {
            r.iter()
                .filter(|(_, n)| !n.is_compliant())
                .map(|(name, n)| ReportRow::new(name, n))
                .collect()
        },
        |r: &VlanReport| {
            r.iter()
                .filter(|(_, n)| !n.is_compliant())
                .map(|(name, _)| name.clone())
                .collect()
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
