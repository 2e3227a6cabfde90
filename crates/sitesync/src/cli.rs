//! Clap derive structures for the `sitesync` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sitesync -- declarative site configuration for Meraki appliances
#[derive(Debug, Parser)]
#[command(
    name = "sitesync",
    version,
    about = "Reconcile Meraki appliance VLANs, DHCP, VPN and ports with declared site files",
    long_about = "Reads the VLAN catalog and per-site subnet and port files, compares them\n\
        with what the Meraki Dashboard reports, and applies the difference.\n\
        Every object is snapshotted to a per-site backup ledger before it changes.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "SITESYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Organization profile to use
    #[arg(long, short = 'p', env = "SITESYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Dashboard organization id (overrides profile)
    #[arg(long, env = "MERAKI_ORG_ID", global = true)]
    pub org_id: Option<String>,

    /// Dashboard API key
    #[arg(long, env = "MERAKI_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Dashboard API root (overrides profile)
    #[arg(long, env = "SITESYNC_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Directory holding vlans.json, sites/ and samples/
    #[arg(long, short = 'i', global = true)]
    pub input_dir: Option<PathBuf>,

    /// Directory the VLAN report is written to
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SITESYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Also write JSON logs to a daily file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add missing VLANs and update changed ones
    Vlans(VlansArgs),

    /// Apply port roles and VLAN assignments
    Ports(PortsArgs),

    /// Report missing and mismatched VLANs across every network
    Report,

    /// Scaffold the input files for a new site
    Prep(PrepArgs),

    /// Manage the network id cache
    Cache(CacheArgs),

    /// Inspect configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Site Selection ───────────────────────────────────────────────────

/// Exactly one of a site name or a file of site names.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct SiteSelection {
    /// Site (network) name to apply changes to
    #[arg(long)]
    pub site_name: Option<String>,

    /// File with one site name per line, relative to the input directory
    #[arg(long)]
    pub site_names_file: Option<PathBuf>,
}

// ── VLANs ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VlansArgs {
    /// Subnet CSV. Required with --multi-site (relative to the input
    /// directory); otherwise relative to each site's directory and
    /// defaulting to subnets.csv
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// Add VLANs that are missing at the site
    #[arg(long = "add", short = 'a')]
    pub add: bool,

    /// Update VLANs whose prefix or name changed
    #[arg(long = "update", short = 'u')]
    pub update: bool,

    /// Match VLANs by name and leave site-to-site VPN untouched
    #[arg(long)]
    pub legacy: bool,

    /// The file holds one row per site, keyed by the first column
    #[arg(long, short = 'm', requires = "file")]
    pub multi_site: bool,

    #[command(flatten)]
    pub sites: SiteSelection,
}

// ── Ports ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PortsArgs {
    /// Port CSV, relative to each site's directory (or to the input
    /// directory with --multi-site)
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// The file carries a site_name column covering several sites
    #[arg(long, short = 'm')]
    pub multi_site: bool,

    #[command(flatten)]
    pub sites: SiteSelection,
}

// ── Prep ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PrepArgs {
    /// Site (network) name to scaffold
    #[arg(long)]
    pub site_name: String,
}

// ── Cache ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Delete the cached site name to network id map
    Clear,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the loaded configuration (API keys masked)
    Show,

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
