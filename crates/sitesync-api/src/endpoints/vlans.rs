// Appliance VLAN endpoints

use crate::client::DashboardClient;
use crate::error::Error;
use crate::models::ApplianceVlan;
use crate::requests::{CreateVlanRequest, UpdateVlanRequest};

impl DashboardClient {
    pub async fn list_vlans(&self, network_id: &str) -> Result<Vec<ApplianceVlan>, Error> {
        self.get(&format!("networks/{network_id}/appliance/vlans"))
            .await
    }

    pub async fn get_vlan(&self, network_id: &str, vlan_id: u16) -> Result<ApplianceVlan, Error> {
        self.get(&format!("networks/{network_id}/appliance/vlans/{vlan_id}"))
            .await
    }

    pub async fn create_vlan(
        &self,
        network_id: &str,
        req: &CreateVlanRequest,
    ) -> Result<ApplianceVlan, Error> {
        req.validate()?;
        self.post(&format!("networks/{network_id}/appliance/vlans"), req)
            .await
    }

    pub async fn update_vlan(
        &self,
        network_id: &str,
        vlan_id: u16,
        req: &UpdateVlanRequest,
    ) -> Result<ApplianceVlan, Error> {
        req.validate()?;
        self.put(
            &format!("networks/{network_id}/appliance/vlans/{vlan_id}"),
            req,
        )
        .await
    }
}
