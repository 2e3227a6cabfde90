// New-site scaffolding
//
// Lays out `sites/<site>/` under the input directory: the subnet file
// with one column per catalog VLAN, a port file, and a directory with
// DHCP templates for every VLAN that runs a DHCP server. Templates come
// from `<input>/samples/` when present, otherwise from the built-in set.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::declared::{DhcpDocuments, InputLayout, VlanCatalog};
use crate::error::CoreError;

/// Built-in catalog sample, also used to detect an unedited catalog.
pub const SAMPLE_CATALOG: &str = r#"{
    "Data": {"ID": 10, "VPN Mode": "true", "DHCP Server": true, "DHCP Optional": false},
    "Voice": {"ID": 20, "VPN Mode": "true", "DHCP Server": true, "DHCP Optional": true},
    "Guest": {"ID": 30, "VPN Mode": "false", "DHCP Server": true, "DHCP Optional": false},
    "Management": {"ID": 99, "VPN Mode": "true", "DHCP Server": false, "DHCP Optional": false}
}
"#;

const SAMPLE_DHCP: &str = r#"{
    "dhcpHandling": "Run a DHCP server",
    "dhcpLeaseTime": "1 day",
    "dnsNameservers": "upstream_dns"
}
"#;
const SAMPLE_FIXED: &str = "MAC address,LAN IP,Client name\n";
const SAMPLE_RESERVED: &str = "First IP,Last IP,Comment\n";
const SAMPLE_PORTS: &str = "number,type,vlan,secure\n";

/// Port file name inside a site directory.
pub const PORTS_FILE: &str = "mx_ports.csv";

const DHCP_TEMPLATES: [(&str, &str); 3] = [
    (DhcpDocuments::SETTINGS_FILE, SAMPLE_DHCP),
    (DhcpDocuments::FIXED_FILE, SAMPLE_FIXED),
    (DhcpDocuments::RESERVED_FILE, SAMPLE_RESERVED),
];

/// What `prepare_site` created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrepSummary {
    pub site_dir: PathBuf,
    pub dhcp_dirs: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
}

fn template(layout: &InputLayout, name: &str, builtin: &str) -> Result<String, CoreError> {
    let sample = layout.samples_dir().join(name);
    if sample.is_file() {
        debug!(path = %sample.display(), "using sample file");
        fs::read_to_string(&sample).map_err(|e| CoreError::io(&sample, e))
    } else {
        Ok(builtin.to_owned())
    }
}

fn write(path: &Path, body: &str, summary: &mut PrepSummary) -> Result<(), CoreError> {
    fs::write(path, body).map_err(|e| CoreError::io(path, e))?;
    info!(path = %path.display(), "created");
    summary.files.push(path.to_owned());
    Ok(())
}

/// Reject a catalog that is byte-for-byte the sample.
fn ensure_catalog_edited(layout: &InputLayout) -> Result<String, CoreError> {
    let path = layout.catalog_path();
    if !path.is_file() {
        return Err(CoreError::validation(format!(
            "VLAN catalog {} is missing; copy {} there and edit it for your organization",
            path.display(),
            layout.samples_dir().join("vlans.json").display()
        )));
    }
    let current = fs::read_to_string(&path).map_err(|e| CoreError::io(&path, e))?;
    let sample = template(layout, "vlans.json", SAMPLE_CATALOG)?;
    if current == sample {
        return Err(CoreError::validation(format!(
            "VLAN catalog {} is identical to the sample; edit it for your organization first",
            path.display()
        )));
    }
    Ok(current)
}

/// Scaffold the input tree for `site` and record it in `sites.txt`.
pub fn prepare_site(layout: &InputLayout, site: &str) -> Result<PrepSummary, CoreError> {
    let raw = ensure_catalog_edited(layout)?;
    let catalog = VlanCatalog::from_json(&raw)?;

    let mut summary = PrepSummary {
        site_dir: layout.site_dir(site),
        ..PrepSummary::default()
    };
    fs::create_dir_all(&summary.site_dir).map_err(|e| CoreError::io(&summary.site_dir, e))?;

    write(&layout.site_list_path(), &format!("{site}\n"), &mut summary)?;

    for (name, entry) in catalog.iter() {
        // Only an explicit `true` gets templates; sync's default does not.
        if entry.dhcp_server != Some(true) {
            debug!(vlan = %name, "DHCP Server not enabled; no template directory");
            continue;
        }
        let dir = layout.vlan_dir(site, name);
        fs::create_dir_all(&dir).map_err(|e| CoreError::io(&dir, e))?;
        for (file, builtin) in DHCP_TEMPLATES {
            write(&dir.join(file), &template(layout, file, builtin)?, &mut summary)?;
        }
        summary.dhcp_dirs.push(dir);
    }

    let ports = summary.site_dir.join(PORTS_FILE);
    write(&ports, &template(layout, PORTS_FILE, SAMPLE_PORTS)?, &mut summary)?;

    let header = catalog.names().collect::<Vec<_>>().join(",");
    write(&layout.subnets_path(site), &format!("{header}\n"), &mut summary)?;

    info!(site, dir = %summary.site_dir.display(), "site prepared");
    Ok(summary)
}
