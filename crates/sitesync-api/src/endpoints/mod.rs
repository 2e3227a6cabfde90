// Endpoint methods on `DashboardClient`, one file per API area.

mod organizations;
mod ports;
mod vlans;
mod vpn;
