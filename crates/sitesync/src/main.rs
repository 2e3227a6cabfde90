mod cli;
mod commands;
mod error;
mod output;

use std::path::Path;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let guard = init_tracing(cli.global.verbose, cli.global.log_dir.as_deref());
    let result = run(&cli).await;
    // Flush buffered file logs; process::exit skips destructors.
    drop(guard);

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Console logging on stderr, plus a daily JSON log file under `log_dir`.
fn init_tracing(verbosity: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let mut file_error = None;
    let (file, guard) = match log_dir.map(|dir| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("sitesync")
            .filename_suffix("log")
            .build(dir)
    }) {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            file_error = Some(e);
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with(console)
        .with(file)
        .init();

    if let Some(e) = file_error {
        tracing::warn!(error = %e, "cannot open log directory; logging to console only");
    }
    guard
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let global = &cli.global;
    tracing::debug!(command = ?cli.command, "dispatching command");

    match &cli.command {
        Command::Vlans(args) => commands::vlans::handle(args, global).await,
        Command::Ports(args) => commands::ports::handle(args, global).await,
        Command::Report => commands::report::handle(global).await,
        Command::Prep(args) => commands::prep::handle(args, global).await,

        // Local commands never contact the Dashboard
        Command::Cache(args) => commands::cache::handle(args, global),
        Command::Config(args) => commands::config_cmd::handle(args, global),
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "sitesync", &mut std::io::stdout());
            Ok(())
        }
    }
}
