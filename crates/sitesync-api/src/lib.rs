// sitesync-api: async client for the Meraki Dashboard v1 API.
//
// Covers the slice of the API the reconciler needs: organization and
// network lookup, appliance VLANs, site-to-site VPN, and appliance ports.
// `DashboardApi` abstracts the client so callers can swap in
// `MockDashboard` (feature `test-util`) for tests.

pub mod client;
pub mod dashboard;
mod endpoints;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod models;
pub mod requests;
pub mod transport;

pub use client::{DEFAULT_BASE_URL, DashboardClient};
pub use dashboard::DashboardApi;
pub use error::Error;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{Call, MockDashboard, Op};
pub use models::{AppliancePort, ApplianceVlan, Network, Organization, SiteToSiteVpn, VpnHub, VpnSubnet};
pub use requests::{
    AccessPolicy, CreateVlanRequest, DhcpSettings, FixedIpAssignment, Ipv6Settings, PortType,
    ReservedIpRange, UpdatePortRequest, UpdateVlanRequest, UpdateVpnRequest,
};
pub use transport::{TlsMode, TransportConfig};
