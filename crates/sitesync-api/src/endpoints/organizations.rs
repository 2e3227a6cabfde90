// Organization and network endpoints

use crate::client::DashboardClient;
use crate::error::Error;
use crate::models::{Network, Organization};

/// Page size large enough that one request returns every network.
const NETWORKS_PER_PAGE: u32 = 100_000;

impl DashboardClient {
    /// `GET /organizations/{organizationId}`
    pub async fn get_organization(&self, org_id: &str) -> Result<Organization, Error> {
        self.get(&format!("organizations/{org_id}")).await
    }

    /// `GET /organizations/{organizationId}/networks`
    pub async fn list_networks(&self, org_id: &str) -> Result<Vec<Network>, Error> {
        self.get_with_params(
            &format!("organizations/{org_id}/networks"),
            &[("perPage", NETWORKS_PER_PAGE.to_string())],
        )
        .await
    }
}
