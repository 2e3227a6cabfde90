//! Command handlers and the shared session they run in.

pub mod cache;
pub mod config_cmd;
pub mod ports;
pub mod prep;
pub mod report;
pub mod vlans;

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, error, info};

use sitesync_config::{Overrides, Settings};
use sitesync_core::identity::lookup;
use sitesync_core::{CoreError, DashboardApi, DashboardClient, NetworkMap, NetworkResolver};

use crate::cli::{GlobalOpts, SiteSelection};
use crate::error::CliError;

// ── Settings ────────────────────────────────────────────────────────

/// Load the config file and fold the global flags over it.
pub fn load_settings(global: &GlobalOpts) -> Result<Settings, CliError> {
    let config = sitesync_config::load_config(global.config.as_deref())?;
    let overrides = Overrides {
        profile: global.profile.clone(),
        org_id: global.org_id.clone(),
        api_key: global.api_key.clone().map(SecretString::from),
        base_url: global.base_url.clone(),
        input_dir: global.input_dir.clone(),
        output_dir: global.output_dir.clone(),
        timeout: global.timeout,
    };
    Ok(sitesync_config::resolve(&config, overrides)?)
}

// ── Session ─────────────────────────────────────────────────────────

/// A verified Dashboard connection plus the settings it was built from.
pub struct Session {
    pub settings: Settings,
    pub org_id: String,
    pub api: Arc<dyn DashboardApi>,
}

impl Session {
    /// Build the client and confirm the organization is reachable.
    /// Any failure here ends the run before a site is touched.
    pub async fn connect(global: &GlobalOpts) -> Result<Self, CliError> {
        let settings = load_settings(global)?;
        let org_id = settings.require_org_id()?.to_owned();
        let client = DashboardClient::new(
            &settings.base_url,
            settings.require_api_key()?,
            &settings.transport,
        )
        .map_err(CoreError::from)?;
        let api: Arc<dyn DashboardApi> = Arc::new(client);

        let org = api
            .get_organization(&org_id)
            .await
            .map_err(CoreError::from)?;
        info!(org = %org.name, org_id, "connected to the Meraki Dashboard");

        Ok(Self {
            settings,
            org_id,
            api,
        })
    }

    pub fn resolver(&self) -> NetworkResolver {
        NetworkResolver::new(Arc::clone(&self.api), &self.settings.dirs.cache)
            .with_ttl_days(self.settings.cache_ttl_days)
    }

    pub async fn networks(&self) -> Result<NetworkMap, CliError> {
        Ok(self.resolver().resolve_all(&self.org_id).await?)
    }
}

// ── Site selection ──────────────────────────────────────────────────

/// Site names from `--site-name` or the lines of `--site-names-file`.
pub fn selected_sites(
    selection: &SiteSelection,
    settings: &Settings,
) -> Result<Vec<String>, CliError> {
    if let Some(ref name) = selection.site_name {
        return Ok(vec![name.clone()]);
    }
    let Some(ref file) = selection.site_names_file else {
        return Err(CliError::Validation {
            field: "site".into(),
            reason: "pass --site-name or --site-names-file".into(),
        });
    };
    let path = settings.layout().resolve(file);
    let sites = sitesync_core::declared::load_site_list(&path)?;
    if sites.is_empty() {
        return Err(CliError::Validation {
            field: "site-names-file".into(),
            reason: format!("{} lists no sites", path.display()),
        });
    }
    debug!(count = sites.len(), path = %path.display(), "loaded site list");
    Ok(sites)
}

/// Network id for `site`, or `None` after logging the miss.
pub fn network_for<'a>(site: &str, networks: &'a NetworkMap) -> Option<&'a str> {
    let id = lookup(site, networks);
    if id.is_none() {
        error!(site, "site not found in the organization; skipping");
    }
    id
}

/// Turn a failure count into the run's result.
pub fn finish(failed: usize, total: usize) -> Result<(), CliError> {
    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::SitesFailed { failed, total })
    }
}
