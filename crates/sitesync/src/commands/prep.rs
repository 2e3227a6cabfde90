//! New-site scaffolding handler.

use tabled::Tabled;

use sitesync_core::identity::require;
use sitesync_core::{PrepSummary, prepare_site};

use crate::cli::{GlobalOpts, PrepArgs};
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "Created")]
    path: String,
}

pub async fn handle(args: &PrepArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = Session::connect(global).await?;
    let networks = session.networks().await?;
    require(&args.site_name, &networks)?;

    let summary = prepare_site(&session.settings.layout(), &args.site_name)?;
    let out = output::render(
        &global.output,
        &summary,
        |s: &PrepSummary| {
            s.files
                .iter()
                .map(|p| FileRow {
                    path: p.display().to_string(),
                })
                .collect()
        },
        |s: &PrepSummary| s.files.iter().map(|p| p.display().to_string()).collect(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
