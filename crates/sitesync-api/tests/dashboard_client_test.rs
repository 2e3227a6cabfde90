#![allow(clippy::unwrap_used)]
// Integration tests for `DashboardClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitesync_api::{
    AccessPolicy, CreateVlanRequest, DashboardApi, DashboardClient, Error, Ipv6Settings,
    TransportConfig, UpdatePortRequest, UpdateVlanRequest, UpdateVpnRequest,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DashboardClient) {
    let server = MockServer::start().await;
    let key: SecretString = "test-key".to_string().into();
    let client = DashboardClient::new(
        &format!("{}/api/v1", server.uri()),
        &key,
        &TransportConfig::default(),
    )
    .unwrap();
    (server, client)
}

// ── Organization / networks ─────────────────────────────────────────

#[tokio::test]
async fn test_get_organization_sends_bearer_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/organizations/549236"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "549236", "name": "Acme"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let org = client.get_organization("549236").await.unwrap();
    assert_eq!(org.name, "Acme");
}

#[tokio::test]
async fn test_list_networks_requests_single_page() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/organizations/549236/networks"))
        .and(query_param("perPage", "100000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "N_1", "name": "branch-01", "productTypes": ["appliance"]},
            {"id": "N_2", "name": "branch-02", "productTypes": ["appliance", "switch"]}
        ])))
        .mount(&server)
        .await;

    let networks = client.list_networks("549236").await.unwrap();
    assert_eq!(networks.len(), 2);
    assert_eq!(networks[1].product_types, vec!["appliance", "switch"]);
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_invalid_key() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/organizations/1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"errors": ["Invalid API key"]})))
        .mount(&server)
        .await;

    let result = client.get_organization("1").await;
    assert!(matches!(result, Err(Error::InvalidApiKey)), "got: {result:?}");
}

#[tokio::test]
async fn test_error_envelope_messages_are_joined() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/networks/N_1/appliance/vlans"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": ["VLANs are not enabled for this network"]
        })))
        .mount(&server)
        .await;

    let err = client.list_vlans("N_1").await.unwrap_err();
    assert!(err.is_not_enabled());
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "VLANs are not enabled for this network");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_forbidden_and_rate_limit() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/organizations/2"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"errors": ["No access"]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/organizations/3"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let forbidden = client.get_organization("2").await;
    assert!(matches!(forbidden, Err(Error::Forbidden { ref message }) if message == "No access"));

    let limited = client.get_organization("3").await;
    assert!(matches!(limited, Err(Error::RateLimited { retry_after_secs: 7 })));
}

#[tokio::test]
async fn test_bad_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/networks/N_1/appliance/vlans/10"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.get_vlan("N_1", 10).await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

// ── VLANs ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_vlans_accepts_string_ids() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/networks/N_1/appliance/vlans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "10", "name": "Data", "subnet": "10.0.10.0/24", "applianceIp": "10.0.10.1"},
            {"id": 20, "name": "Voice", "subnet": "10.0.20.0/24", "applianceIp": "10.0.20.1"}
        ])))
        .mount(&server)
        .await;

    let vlans = client.list_vlans("N_1").await.unwrap();
    let ids: Vec<u16> = vlans.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![10, 20]);
}

#[tokio::test]
async fn test_create_vlan_posts_payload() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/networks/N_1/appliance/vlans"))
        .and(body_json(json!({
            "id": 30,
            "name": "Guest",
            "subnet": "10.0.30.0/24",
            "applianceIp": "10.0.30.0",
            "ipv6": {"enabled": true},
            "vpnMode": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "30", "name": "Guest", "subnet": "10.0.30.0/24", "applianceIp": "10.0.30.0"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let req = CreateVlanRequest {
        id: 30,
        name: "Guest".into(),
        subnet: "10.0.30.0/24".into(),
        appliance_ip: "10.0.30.0".into(),
        ipv6: Ipv6Settings { enabled: true },
        vpn_mode: Some(false),
    };
    let vlan = DashboardApi::create_vlan(&client, "N_1", &req).await.unwrap();
    assert_eq!(vlan.id, 30);
}

#[tokio::test]
async fn test_rename_puts_name_only() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/networks/N_1/appliance/vlans/10"))
        .and(body_json(json!({"name": "Corp"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 10, "name": "Corp"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    client
        .update_vlan("N_1", 10, &UpdateVlanRequest::rename("Corp"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_invalid_request_never_reaches_server() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = client
        .update_vlan("N_1", 10, &UpdateVlanRequest::default())
        .await;
    assert!(matches!(result, Err(Error::InvalidRequest(_))));
}

// ── VPN / ports ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_vpn_round_trip_keeps_hubs() {
    let (server, client) = setup().await;

    let settings = json!({
        "mode": "spoke",
        "hubs": [{"hubId": "N_HUB", "useDefaultRoute": false}],
        "subnets": [{"localSubnet": "10.0.10.0/24", "useVpn": false}]
    });
    Mock::given(method("GET"))
        .and(path("/api/v1/networks/N_1/appliance/vpn/siteToSiteVpn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(settings))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/networks/N_1/appliance/vpn/siteToSiteVpn"))
        .and(body_json(json!({
            "mode": "spoke",
            "hubs": [{"hubId": "N_HUB", "useDefaultRoute": false}],
            "subnets": [{"localSubnet": "10.0.10.0/24", "useVpn": true}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mode": "spoke"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut vpn = client.get_site_to_site_vpn("N_1").await.unwrap();
    vpn.subnets[0].use_vpn = true;
    let req = UpdateVpnRequest {
        mode: vpn.mode,
        hubs: vpn.hubs,
        subnets: vpn.subnets,
    };
    client.update_site_to_site_vpn("N_1", &req).await.unwrap();
}

#[tokio::test]
async fn test_update_port_payload() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/networks/N_1/appliance/ports/3"))
        .and(body_json(json!({
            "enabled": true,
            "type": "access",
            "vlan": 10,
            "accessPolicy": "open"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": 3, "enabled": true, "type": "access", "vlan": 10, "accessPolicy": "open"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let port = client
        .update_port("N_1", 3, &UpdatePortRequest::access(10, AccessPolicy::Open))
        .await
        .unwrap();
    assert_eq!(port.vlan, Some(10));
}
