// Appliance port endpoints

use crate::client::DashboardClient;
use crate::error::Error;
use crate::models::AppliancePort;
use crate::requests::UpdatePortRequest;

impl DashboardClient {
    pub async fn get_port(&self, network_id: &str, port: u32) -> Result<AppliancePort, Error> {
        self.get(&format!("networks/{network_id}/appliance/ports/{port}"))
            .await
    }

    pub async fn update_port(
        &self,
        network_id: &str,
        port: u32,
        req: &UpdatePortRequest,
    ) -> Result<AppliancePort, Error> {
        req.validate()?;
        self.put(&format!("networks/{network_id}/appliance/ports/{port}"), req)
            .await
    }
}
