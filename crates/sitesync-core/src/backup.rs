// Backup ledger
//
// One JSON document per site under the backup directory:
//
//   { "<site>": { "<endpoint>": { "<YYYY-MM-DD_HH-MM-SS>": <payload> } } }
//
// Every snapshot inserts under the current local time, then prunes every
// endpoint of that site down to the retention window. All ledger writes
// in the process go through one lock.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{Local, NaiveDateTime, TimeDelta};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::CoreError;

/// Timestamp key format inside a ledger.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Default retention window.
pub const DEFAULT_RETENTION_DAYS: u32 = 120;

/// endpoint label → timestamp → payload
pub type EndpointHistory = IndexMap<String, IndexMap<String, Value>>;

/// site → endpoint label → timestamp → payload
pub type Ledger = IndexMap<String, EndpointHistory>;

static LEDGER_LOCK: Mutex<()> = Mutex::new(());

/// Writes pre-mutation snapshots to per-site ledgers.
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
    retention: TimeDelta,
}

impl BackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            retention: TimeDelta::days(i64::from(DEFAULT_RETENTION_DAYS)),
        }
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention = TimeDelta::days(i64::from(days));
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ledger file for `site`. Path separators in the name are replaced so
    /// a site can never write outside the backup directory.
    pub fn ledger_path(&self, site: &str) -> PathBuf {
        let file: String = site
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        self.dir.join(format!("{file}.json"))
    }

    /// Record `payload` as the state of `endpoint` at `site` right now.
    pub fn snapshot<T: Serialize + ?Sized>(
        &self,
        site: &str,
        endpoint: &str,
        payload: &T,
    ) -> Result<(), CoreError> {
        self.snapshot_at(site, endpoint, payload, Local::now().naive_local())
    }

    /// Same as [`snapshot`](Self::snapshot) with an explicit clock.
    pub fn snapshot_at<T: Serialize + ?Sized>(
        &self,
        site: &str,
        endpoint: &str,
        payload: &T,
        now: NaiveDateTime,
    ) -> Result<(), CoreError> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| CoreError::Internal(format!("cannot serialize snapshot: {e}")))?;

        let _guard = LEDGER_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        if !self.dir.is_dir() {
            fs::create_dir_all(&self.dir).map_err(|e| CoreError::io(&self.dir, e))?;
            info!(dir = %self.dir.display(), "created backup directory");
        }

        let path = self.ledger_path(site);
        let mut ledger = read_ledger(&path)?;

        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        ledger
            .entry(site.to_owned())
            .or_default()
            .entry(endpoint.to_owned())
            .or_default()
            .insert(timestamp, payload);

        if let Some(history) = ledger.get_mut(site) {
            prune(history, now - self.retention, &path);
        }

        write_ledger(&path, &ledger)?;
        info!(site, endpoint, "configuration backed up");
        Ok(())
    }

    /// Current ledger for `site`; empty when missing or unreadable.
    pub fn load(&self, site: &str) -> Ledger {
        let path = self.ledger_path(site);
        read_ledger(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "cannot read backup ledger");
            Ledger::new()
        })
    }
}

/// Snapshot with the default retention window.
pub fn snapshot<T: Serialize + ?Sized>(
    dir: &Path,
    site: &str,
    endpoint: &str,
    payload: &T,
) -> Result<(), CoreError> {
    BackupStore::new(dir).snapshot(site, endpoint, payload)
}

/// Only unparseable content restarts the ledger. Any other read failure
/// is returned so the existing history is never overwritten.
fn read_ledger(path: &Path) -> Result<Ledger, CoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Ledger::new()),
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            warn!(path = %path.display(), error = %e, "backup ledger is not UTF-8; starting a new one");
            return Ok(Ledger::new());
        }
        Err(e) => return Err(CoreError::io(path, e)),
    };
    Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "backup ledger is corrupted; starting a new one");
        Ledger::new()
    }))
}

fn write_ledger(path: &Path, ledger: &Ledger) -> Result<(), CoreError> {
    let body = serde_json::to_string_pretty(ledger)
        .map_err(|e| CoreError::Internal(format!("cannot serialize ledger: {e}")))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).map_err(|e| CoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| CoreError::io(path, e))
}

/// Drop entries at or before `cutoff`. Keys that are not timestamps stay.
fn prune(history: &mut EndpointHistory, cutoff: NaiveDateTime, path: &Path) {
    for (endpoint, entries) in history.iter_mut() {
        entries.retain(|stamp, _| {
            match NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT) {
                Ok(taken) if taken <= cutoff => {
                    debug!(endpoint = %endpoint, stamp = %stamp, "pruning expired backup");
                    false
                }
                Ok(_) => true,
                Err(_) => {
                    warn!(
                        path = %path.display(),
                        endpoint = %endpoint,
                        stamp = %stamp,
                        "invalid timestamp in backup ledger; keeping entry"
                    );
                    true
                }
            }
        });
    }
}
