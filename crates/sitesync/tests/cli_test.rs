//! Integration tests for the `sitesync` binary.
//!
//! Argument parsing, configuration and exit codes run without a network.
//! The end-to-end cases point the binary at a wiremock Dashboard.
#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `sitesync` binary with env isolation.
///
/// Clears the Meraki and `SITESYNC_*` variables and points the config
/// directories at a nonexistent path so tests never read real settings.
fn sitesync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("sitesync");
    cmd.env("HOME", "/tmp/sitesync-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/sitesync-cli-test-nonexistent")
        .env_remove("MERAKI_API_KEY")
        .env_remove("MERAKI_ORG_ID")
        .env_remove("SITESYNC_CONFIG")
        .env_remove("SITESYNC_PROFILE")
        .env_remove("SITESYNC_BASE_URL")
        .env_remove("SITESYNC_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Write a config whose directories all live under `root`.
fn write_config(root: &Path, extra: &str) -> std::path::PathBuf {
    let config = root.join("config.toml");
    let body = format!(
        "[defaults]\n\
         input_dir = '{root}/input'\n\
         output_dir = '{root}/out'\n\
         backup_dir = '{root}/backups'\n\
         cache_dir = '{root}/cache'\n\
         {extra}",
        root = root.display()
    );
    fs::write(&config, body).unwrap();
    config
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = sitesync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    sitesync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("vlans")
            .and(predicate::str::contains("ports"))
            .and(predicate::str::contains("report"))
            .and(predicate::str::contains("prep")),
    );
}

#[test]
fn test_version_flag() {
    sitesync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sitesync"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    sitesync_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    sitesync_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Argument errors ─────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = sitesync_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_vlans_requires_a_site() {
    let output = sitesync_cmd().args(["vlans", "-a"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_site_name_and_file_conflict() {
    let output = sitesync_cmd()
        .args([
            "vlans",
            "-a",
            "--site-name",
            "branch-01",
            "--site-names-file",
            "sites.txt",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("cannot be used with"));
}

#[test]
fn test_multi_site_requires_file() {
    let output = sitesync_cmd()
        .args(["vlans", "-a", "-m", "--site-name", "branch-01"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_vlans_without_add_or_update_is_rejected_before_connecting() {
    sitesync_cmd()
        .args(["vlans", "--site-name", "branch-01"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Nothing to do"));
}

#[test]
fn test_invalid_output_format() {
    let output = sitesync_cmd()
        .args(["--output", "invalid", "report"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("possible values"));
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_missing_org_id_is_a_usage_error() {
    let tmp = tempfile::tempdir().unwrap();
    let config = write_config(tmp.path(), "");
    sitesync_cmd()
        .arg("--config")
        .arg(&config)
        .arg("report")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("organization id"));
}

#[test]
fn test_missing_api_key_is_an_auth_error() {
    let tmp = tempfile::tempdir().unwrap();
    let config = write_config(tmp.path(), "");
    sitesync_cmd()
        .arg("--config")
        .arg(&config)
        .args(["--org-id", "1", "report"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No API key"));
}

#[test]
fn test_unknown_profile_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let config = write_config(tmp.path(), "");
    sitesync_cmd()
        .arg("--config")
        .arg(&config)
        .args(["--profile", "nope", "report"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_unreachable_dashboard_is_a_connection_error() {
    let tmp = tempfile::tempdir().unwrap();
    let config = write_config(tmp.path(), "");
    sitesync_cmd()
        .arg("--config")
        .arg(&config)
        .args([
            "--org-id",
            "1",
            "--api-key",
            "k",
            "--base-url",
            "http://127.0.0.1:1/api/v1",
            "--timeout",
            "2",
            "report",
        ])
        .assert()
        .code(7);
}

// ── Local commands ──────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    sitesync_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("retention_days = 120"));
}

#[test]
fn test_config_show_masks_api_keys() {
    let tmp = tempfile::tempdir().unwrap();
    let config = write_config(
        tmp.path(),
        "\n[profiles.default]\norg_id = '1'\napi_key = 'super-secret'\n",
    );
    sitesync_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("super-secret").not())
        .stdout(predicate::str::contains("org_id = \"1\""));
}

#[test]
fn test_config_path_honors_flag() {
    sitesync_cmd()
        .args(["--config", "/etc/sitesync/custom.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/etc/sitesync/custom.toml"));
}

#[test]
fn test_cache_clear_removes_the_profile_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let config = write_config(tmp.path(), "");
    let cache = tmp.path().join("cache").join("default");
    fs::create_dir_all(&cache).unwrap();
    let file = cache.join("meraki_network_cache.json");
    fs::write(&file, r#"{"timestamp": 0, "data": {}}"#).unwrap();

    sitesync_cmd()
        .arg("--config")
        .arg(&config)
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared"));
    assert!(!file.exists());

    sitesync_cmd()
        .arg("--config")
        .arg(&config)
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No network cache"));
}

// ── End to end against a mock Dashboard ─────────────────────────────

async fn dashboard() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/organizations/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1", "name": "Acme"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/organizations/1/networks"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": "N_1", "name": "branch-01"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/networks/N_1/appliance/vlans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 20, "name": "Voice", "subnet": "10.1.20.0/24", "applianceIp": "10.1.20.1"}
        ])))
        .mount(&server)
        .await;
    server
}

fn seed_inputs(root: &Path) {
    let input = root.join("input");
    fs::create_dir_all(input.join("sites").join("branch-01")).unwrap();
    fs::write(
        input.join("vlans.json"),
        r#"{
            "Data":  {"ID": 10, "VPN Mode": "true", "DHCP Server": false},
            "Voice": {"ID": 20, "DHCP Server": false}
        }"#,
    )
    .unwrap();
    fs::write(
        input.join("sites").join("branch-01").join("subnets.csv"),
        "Data,Voice\n10.1.10.0/24,10.1.20.0/24\n",
    )
    .unwrap();
}

fn connected_cmd(server: &MockServer, config: &Path) -> assert_cmd::Command {
    let mut cmd = sitesync_cmd();
    cmd.arg("--config")
        .arg(config)
        .args(["--org-id", "1", "--api-key", "test-key", "--base-url"])
        .arg(format!("{}/api/v1", server.uri()))
        .args(["--output", "json"]);
    cmd
}

async fn run_blocking(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_vlans_creates_missing_and_advertises_it() {
    let server = dashboard().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/networks/N_1/appliance/vlans"))
        .and(body_partial_json(json!({
            "id": 10,
            "name": "Data",
            "subnet": "10.1.10.0/24",
            "applianceIp": "10.1.10.0",
            "vpnMode": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(
            json!({"id": "10", "name": "Data", "subnet": "10.1.10.0/24"}),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/networks/N_1/appliance/vpn/siteToSiteVpn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mode": "spoke",
            "hubs": [{"hubId": "N_HUB", "useDefaultRoute": false}],
            "subnets": [
                {"localSubnet": "10.1.10.0/24", "useVpn": false},
                {"localSubnet": "10.1.20.0/24", "useVpn": true}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/networks/N_1/appliance/vpn/siteToSiteVpn"))
        .and(body_partial_json(json!({
            "mode": "spoke",
            "subnets": [
                {"localSubnet": "10.1.10.0/24", "useVpn": true},
                {"localSubnet": "10.1.20.0/24", "useVpn": true}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mode": "spoke"})))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    seed_inputs(tmp.path());
    let config = write_config(tmp.path(), "");

    let mut cmd = connected_cmd(&server, &config);
    cmd.args(["vlans", "-a", "--site-name", "branch-01"]);
    let output = run_blocking(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let reports: Value = serde_json::from_slice(&output.stdout).unwrap();
    let vlans = reports[0]["vlans"].as_array().unwrap();
    let data = vlans.iter().find(|v| v["vlan_id"] == 10).unwrap();
    assert_eq!(data["outcome"]["status"], "applied");
    assert_eq!(data["vpn"]["status"], "applied");
    let voice = vlans.iter().find(|v| v["vlan_id"] == 20).unwrap();
    assert_eq!(voice["outcome"]["status"], "unchanged");

    let ledger = fs::read_to_string(tmp.path().join("backups").join("branch-01.json")).unwrap();
    assert!(ledger.contains("site_to_site_vpn"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_site_fails_the_run_but_not_the_others() {
    let server = dashboard().await;
    let tmp = tempfile::tempdir().unwrap();
    seed_inputs(tmp.path());
    fs::write(tmp.path().join("input").join("sites.txt"), "nowhere\nbranch-01\n").unwrap();
    let config = write_config(tmp.path(), "");

    let mut cmd = connected_cmd(&server, &config);
    cmd.args(["vlans", "-u", "--site-names-file", "sites.txt"]);
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("1 of 2 sites had failures"), "{text}");
    let reports: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reports[0]["site"], "branch-01");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_report_writes_file_and_lists_gaps() {
    let server = dashboard().await;
    let tmp = tempfile::tempdir().unwrap();
    seed_inputs(tmp.path());
    let config = write_config(tmp.path(), "");

    let mut cmd = connected_cmd(&server, &config);
    cmd.arg("report");
    let output = run_blocking(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["branch-01"]["missing_vlans"], json!(["Data"]));
    assert!(tmp.path().join("out").join("vlan_report.json").exists());
}
