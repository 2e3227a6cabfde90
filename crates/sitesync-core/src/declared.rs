// Declared configuration
//
// Loaders for the operator-maintained input tree:
//
//   <input>/vlans.json                      VLAN catalog
//   <input>/sites.txt                       site list
//   <input>/sites/<site>/subnets.csv        single-site prefixes
//   <input>/sites/<site>/<vlan>/dhcp.json   DHCP server settings
//   <input>/sites/<site>/<vlan>/fixed.csv   fixed IP assignments
//   <input>/sites/<site>/<vlan>/reserved.csv
//
// Multi-site subnet and port files may live anywhere under <input>.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use sitesync_api::{DhcpSettings, FixedIpAssignment, ReservedIpRange, UpdateVlanRequest};
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::validate::MacAddress;

// ── Input layout ─────────────────────────────────────────────────────

/// Paths inside the input directory.
#[derive(Debug, Clone)]
pub struct InputLayout {
    root: PathBuf,
}

impl InputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a user-supplied file name relative to the input directory.
    /// Absolute paths are returned unchanged.
    pub fn resolve(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.root.join("vlans.json")
    }

    pub fn samples_dir(&self) -> PathBuf {
        self.root.join("samples")
    }

    pub fn site_list_path(&self) -> PathBuf {
        self.root.join("sites.txt")
    }

    pub fn site_dir(&self, site: &str) -> PathBuf {
        self.root.join("sites").join(site)
    }

    pub fn subnets_path(&self, site: &str) -> PathBuf {
        self.site_dir(site).join("subnets.csv")
    }

    pub fn vlan_dir(&self, site: &str, vlan_name: &str) -> PathBuf {
        self.site_dir(site).join(vlan_name)
    }
}

fn read_file(path: &Path) -> Result<String, CoreError> {
    fs::read_to_string(path).map_err(|e| CoreError::io(path, e))
}

// ── VLAN catalog ─────────────────────────────────────────────────────

/// One VLAN in the organization-wide catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "ID", deserialize_with = "lenient_vlan_id")]
    pub id: u16,
    /// Whether the VLAN's subnet joins the site-to-site VPN. `None` leaves
    /// the VPN untouched.
    #[serde(rename = "VPN Mode", default, deserialize_with = "vpn_mode")]
    pub vpn_mode: Option<bool>,
    /// As written in the catalog; see [`serves_dhcp`](Self::serves_dhcp).
    #[serde(rename = "DHCP Server", default)]
    pub dhcp_server: Option<bool>,
    #[serde(rename = "DHCP Optional", default)]
    pub dhcp_optional: bool,
}

impl CatalogEntry {
    /// Sync treats an unset `DHCP Server` as on.
    pub fn serves_dhcp(&self) -> bool {
        self.dhcp_server.unwrap_or(true)
    }
}

fn lenient_vlan_id<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    let id = match RawId::deserialize(deserializer)? {
        RawId::Number(n) => u16::try_from(n).map_err(serde::de::Error::custom)?,
        RawId::Text(s) => s.trim().parse::<u16>().map_err(serde::de::Error::custom)?,
    };
    if (1..=4094).contains(&id) {
        Ok(id)
    } else {
        Err(serde::de::Error::custom(format!("VLAN id {id} is outside 1-4094")))
    }
}

fn vpn_mode<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawMode {
        Flag(bool),
        Text(String),
    }

    match Option::<RawMode>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawMode::Flag(b)) => Ok(Some(b)),
        Some(RawMode::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "enabled" | "yes" | "y" => Ok(Some(true)),
            "false" | "disabled" | "no" | "n" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!(
                "unrecognized VPN Mode '{other}'"
            ))),
        },
    }
}

/// Catalog of VLAN names to ids and defaults, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct VlanCatalog {
    entries: IndexMap<String, CatalogEntry>,
}

impl VlanCatalog {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = read_file(path)?;
        Self::from_json(&raw).map_err(|e| match e {
            CoreError::Validation { message } => CoreError::parse(path, message),
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        let catalog: Self =
            serde_json::from_str(raw).map_err(|e| CoreError::validation(e.to_string()))?;
        let mut seen = BTreeMap::new();
        for (name, entry) in &catalog.entries {
            if let Some(first) = seen.insert(entry.id, name) {
                return Err(CoreError::validation(format!(
                    "VLAN id {} is used by both '{first}' and '{name}'",
                    entry.id
                )));
            }
        }
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains_id(&self, id: u16) -> bool {
        self.entries.values().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Site subnets ─────────────────────────────────────────────────────

/// VLAN name to raw prefix text, per site, in file order.
pub type SubnetRecord = IndexMap<String, String>;

/// Subnet records keyed by site name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteSubnets {
    sites: IndexMap<String, SubnetRecord>,
}

impl SiteSubnets {
    /// `subnets.csv` for one site: the header names the VLANs, the first
    /// data row holds their prefixes.
    pub fn load_single_site(path: &Path, site: &str) -> Result<Self, CoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| csv_error(path, e))?;
        let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
        let row = reader
            .records()
            .next()
            .transpose()
            .map_err(|e| csv_error(path, e))?
            .ok_or_else(|| {
                CoreError::validation(format!(
                    "{} is empty or has no data rows after the header",
                    path.display()
                ))
            })?;

        let record = headers
            .iter()
            .zip(row.iter())
            .map(|(name, prefix)| (name.to_owned(), prefix.to_owned()))
            .collect();
        let mut sites = IndexMap::new();
        sites.insert(site.to_owned(), record);
        Ok(Self { sites })
    }

    /// A multi-site CSV: the first column is the site name, the rest are
    /// VLAN names.
    pub fn load_multi_site(path: &Path) -> Result<Self, CoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| csv_error(path, e))?;
        let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
        if headers.len() < 2 {
            return Err(CoreError::validation(format!(
                "{} needs a site column followed by VLAN columns",
                path.display()
            )));
        }

        let mut sites = IndexMap::new();
        for row in reader.records() {
            let row = row.map_err(|e| csv_error(path, e))?;
            let Some(site) = row.get(0).filter(|s| !s.is_empty()) else {
                continue;
            };
            let record: SubnetRecord = headers
                .iter()
                .zip(row.iter())
                .skip(1)
                .map(|(name, prefix)| (name.to_owned(), prefix.to_owned()))
                .collect();
            sites.insert(site.to_owned(), record);
        }
        Ok(Self { sites })
    }

    pub fn for_site(&self, site: &str) -> Option<&SubnetRecord> {
        self.sites.get(site)
    }

    pub fn sites(&self) -> impl Iterator<Item = &str> {
        self.sites.keys().map(String::as_str)
    }
}

fn csv_error(path: &Path, err: csv::Error) -> CoreError {
    if let csv::ErrorKind::Io(e) = err.kind() {
        return CoreError::io(path, io::Error::new(e.kind(), e.to_string()));
    }
    CoreError::parse(path, err)
}

// ── Site VLAN declarations ───────────────────────────────────────────

/// One VLAN a site should carry: the subnet record joined with the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteVlan {
    pub name: String,
    pub id: u16,
    /// Trimmed prefix text; empty means the site does not use this VLAN.
    pub prefix: String,
    pub vpn_mode: Option<bool>,
    pub dhcp_server: bool,
}

/// Join a site's subnet record with the catalog. Names the catalog does
/// not know are skipped; there is no id to key them on.
pub fn join(site: &str, record: &SubnetRecord, catalog: &VlanCatalog) -> Vec<SiteVlan> {
    record
        .iter()
        .filter_map(|(name, prefix)| {
            let Some(entry) = catalog.get(name) else {
                warn!(site, vlan = %name, "VLAN is not in the catalog; skipping");
                return None;
            };
            Some(SiteVlan {
                name: name.clone(),
                id: entry.id,
                prefix: prefix.trim().to_owned(),
                vpn_mode: entry.vpn_mode,
                dhcp_server: entry.serves_dhcp(),
            })
        })
        .collect()
}

// ── Port records ─────────────────────────────────────────────────────

/// One row of a port file, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PortRecord {
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(rename = "type", default)]
    pub port_type: Option<String>,
    #[serde(default)]
    pub vlan: Option<String>,
    #[serde(default)]
    pub secure: Option<String>,
}

/// `site_name,number,type,vlan,secure`
pub fn load_ports_multi_site(path: &Path) -> Result<Vec<PortRecord>, CoreError> {
    read_port_rows(path)
}

/// `number,type,vlan,secure`; every row is attributed to `site`.
pub fn load_ports_single_site(path: &Path, site: &str) -> Result<Vec<PortRecord>, CoreError> {
    let mut rows = read_port_rows(path)?;
    for row in &mut rows {
        row.site_name = Some(site.to_owned());
    }
    Ok(rows)
}

fn read_port_rows(path: &Path) -> Result<Vec<PortRecord>, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<PortRecord>, _>>()
        .map_err(|e| csv_error(path, e))
}

// ── Site list ────────────────────────────────────────────────────────

/// One site name per non-blank line.
pub fn load_site_list(path: &Path) -> Result<Vec<String>, CoreError> {
    Ok(read_file(path)?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect())
}

// ── DHCP documents ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FixedRow {
    #[serde(rename = "MAC address")]
    mac: String,
    #[serde(rename = "LAN IP")]
    ip: String,
    #[serde(rename = "Client name", default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ReservedRow {
    #[serde(rename = "First IP")]
    start: String,
    #[serde(rename = "Last IP")]
    end: String,
    #[serde(rename = "Comment", default)]
    comment: String,
}

/// DHCP server settings for one VLAN at one site.
#[derive(Debug, Clone, PartialEq)]
pub struct DhcpDocuments {
    pub settings: DhcpSettings,
    pub fixed: Option<BTreeMap<String, FixedIpAssignment>>,
    pub reserved: Option<Vec<ReservedIpRange>>,
}

impl DhcpDocuments {
    pub const SETTINGS_FILE: &'static str = "dhcp.json";
    pub const FIXED_FILE: &'static str = "fixed.csv";
    pub const RESERVED_FILE: &'static str = "reserved.csv";

    /// Load the documents in `dir`. `Ok(None)` when the required
    /// `dhcp.json` is absent.
    pub fn load(dir: &Path) -> Result<Option<Self>, CoreError> {
        let settings_path = dir.join(Self::SETTINGS_FILE);
        if !settings_path.is_file() {
            return Ok(None);
        }
        let settings: DhcpSettings = serde_json::from_str(&read_file(&settings_path)?)
            .map_err(|e| CoreError::parse(&settings_path, e))?;
        info!(path = %settings_path.display(), "loaded DHCP settings");

        let fixed_path = dir.join(Self::FIXED_FILE);
        let fixed = if fixed_path.is_file() {
            Some(load_fixed(&fixed_path)?)
        } else {
            debug!(path = %fixed_path.display(), "no fixed IP assignments");
            None
        };

        let reserved_path = dir.join(Self::RESERVED_FILE);
        let reserved = if reserved_path.is_file() {
            Some(load_reserved(&reserved_path)?)
        } else {
            debug!(path = %reserved_path.display(), "no reserved IP ranges");
            None
        };

        Ok(Some(Self {
            settings,
            fixed,
            reserved,
        }))
    }

    /// One VLAN update carrying every DHCP setting.
    pub fn into_request(self) -> UpdateVlanRequest {
        UpdateVlanRequest {
            dhcp: self.settings,
            fixed_ip_assignments: self.fixed,
            reserved_ip_ranges: self.reserved,
            ..UpdateVlanRequest::default()
        }
    }
}

fn load_fixed(path: &Path) -> Result<BTreeMap<String, FixedIpAssignment>, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    let mut assignments = BTreeMap::new();
    for row in reader.deserialize::<FixedRow>() {
        let row = row.map_err(|e| csv_error(path, e))?;
        let mac = MacAddress::parse(&row.mac).map_err(|e| CoreError::parse(path, e))?;
        assignments.insert(
            mac.to_string(),
            FixedIpAssignment {
                ip: row.ip,
                name: row.name,
            },
        );
    }
    Ok(assignments)
}

fn load_reserved(path: &Path) -> Result<Vec<ReservedIpRange>, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    reader
        .deserialize::<ReservedRow>()
        .map(|row| {
            row.map(|r| ReservedIpRange {
                start: r.start,
                end: r.end,
                comment: r.comment,
            })
            .map_err(|e| csv_error(path, e))
        })
        .collect()
}
