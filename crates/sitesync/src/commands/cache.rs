//! Cache subcommand handlers. No Dashboard connection needed.

use sitesync_core::clear_cache;

use crate::cli::{CacheArgs, CacheCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::load_settings;

pub fn handle(args: &CacheArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        CacheCommand::Clear => {
            let settings = load_settings(global)?;
            let dir = &settings.dirs.cache;
            let message = if clear_cache(dir)? {
                format!("Cleared network cache in {}", dir.display())
            } else {
                format!("No network cache in {}", dir.display())
            };
            output::print_output(&message, global.quiet);
            Ok(())
        }
    }
}
