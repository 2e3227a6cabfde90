// Network identity resolver
//
// Maps site names to Dashboard network ids. The whole mapping is cached in
// one JSON file, `{"timestamp": <epoch seconds>, "data": {name: id}}`, and
// goes stale as a unit once it is older than the TTL.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sitesync_api::DashboardApi;
use tracing::{debug, error, warn};

use crate::error::CoreError;

/// Cache file name inside the cache directory.
pub const CACHE_FILE: &str = "meraki_network_cache.json";

/// Default cache lifetime.
pub const DEFAULT_CACHE_TTL_DAYS: u64 = 7;

/// Site name → network id.
pub type NetworkMap = IndexMap<String, String>;

#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    timestamp: f64,
    data: NetworkMap,
}

/// Resolves site names against the organization's network list.
pub struct NetworkResolver {
    api: Arc<dyn DashboardApi>,
    cache_path: PathBuf,
    ttl: Duration,
}

impl NetworkResolver {
    pub fn new(api: Arc<dyn DashboardApi>, cache_dir: &Path) -> Self {
        Self {
            api,
            cache_path: cache_dir.join(CACHE_FILE),
            ttl: days(DEFAULT_CACHE_TTL_DAYS),
        }
    }

    pub fn with_ttl_days(mut self, ttl_days: u64) -> Self {
        self.ttl = days(ttl_days);
        self
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Every network in `org_id`, from the cache while it is fresh.
    pub async fn resolve_all(&self, org_id: &str) -> Result<NetworkMap, CoreError> {
        if let Some(cached) = self.read_fresh_cache() {
            debug!(path = %self.cache_path.display(), "network ids served from cache");
            return Ok(cached);
        }

        let networks = self.api.list_networks(org_id).await?;
        if networks.is_empty() {
            error!(org_id, "no networks found in the organization");
        } else {
            debug!(count = networks.len(), "retrieved networks");
        }
        let map: NetworkMap = networks.into_iter().map(|n| (n.name, n.id)).collect();
        self.write_cache(&map);
        Ok(map)
    }

    /// Delete the cache file. Returns whether one existed.
    pub fn invalidate(&self) -> Result<bool, CoreError> {
        remove_cache_file(&self.cache_path)
    }

    fn read_fresh_cache(&self) -> Option<NetworkMap> {
        let raw = fs::read_to_string(&self.cache_path).ok()?;
        let doc: CacheDocument = match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %self.cache_path.display(), error = %e, "network cache is corrupted; refetching");
                return None;
            }
        };
        let now = epoch_seconds();
        (now - doc.timestamp < self.ttl.as_secs_f64()).then_some(doc.data)
    }

    fn write_cache(&self, map: &NetworkMap) {
        let doc = CacheDocument {
            timestamp: epoch_seconds(),
            data: map.clone(),
        };
        let result = self
            .cache_path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| {
                let body = serde_json::to_string(&doc).map_err(std::io::Error::other)?;
                fs::write(&self.cache_path, body)
            });
        if let Err(e) = result {
            warn!(path = %self.cache_path.display(), error = %e, "cannot write network cache");
        }
    }
}

/// Delete the cache under `cache_dir` without building a resolver.
pub fn clear_cache(cache_dir: &Path) -> Result<bool, CoreError> {
    remove_cache_file(&cache_dir.join(CACHE_FILE))
}

fn remove_cache_file(path: &Path) -> Result<bool, CoreError> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "network cache invalidated");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no network cache to invalidate");
            Ok(false)
        }
        Err(e) => Err(CoreError::io(path, e)),
    }
}

fn days(n: u64) -> Duration {
    Duration::from_secs(n * 24 * 60 * 60)
}

fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64())
}

/// Exact-name lookup. `None` means the site is not provisioned.
pub fn lookup<'a>(name: &str, networks: &'a NetworkMap) -> Option<&'a str> {
    networks.get(name).map(String::as_str)
}

/// Lookup that treats absence as an error for callers that need an id.
pub fn require<'a>(name: &str, networks: &'a NetworkMap) -> Result<&'a str, CoreError> {
    lookup(name, networks).ok_or_else(|| CoreError::SiteNotFound {
        name: name.to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_exact() {
        let mut map = NetworkMap::new();
        map.insert("branch-01".into(), "N_1".into());
        assert_eq!(lookup("branch-01", &map), Some("N_1"));
        assert_eq!(lookup("Branch-01", &map), None);
        assert!(matches!(
            require("branch-02", &map),
            Err(CoreError::SiteNotFound { .. })
        ));
    }
}
