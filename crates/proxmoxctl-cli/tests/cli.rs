//! Integration tests for the proxmoxctl binary.

use std::path::Path;

use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

const TOKEN: &str = "root@pam!cli=0123456789abcdef";

/// Binary with a private config file and none of the caller's settings.
fn proxmoxctl(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("proxmoxctl").expect("proxmoxctl binary");
    for var in [
        "PROXMOX_SERVER_NAME",
        "PROXMOX_SERVER_URL",
        "PROXMOX_API_TOKEN",
        "PROXMOX_TLS_INSECURE",
        "PROXMOX_OUTPUT",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.arg("--config").arg(config);
    cmd
}

/// Binary pointed at a stub server through the environment.
fn against(server: &MockServer, dir: &TempDir) -> Command {
    let mut cmd = proxmoxctl(&dir.path().join("config.toml"));
    cmd.env("PROXMOX_SERVER_URL", server.base_url())
        .env("PROXMOX_API_TOKEN", TOKEN);
    cmd
}

#[test]
fn help_lists_command_groups() {
    Command::cargo_bin("proxmoxctl")
        .expect("proxmoxctl binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Proxmox VE"))
        .stdout(predicate::str::contains("snapshot"))
        .stdout(predicate::str::contains("backup"));
}

#[test]
fn version() {
    Command::cargo_bin("proxmoxctl")
        .expect("proxmoxctl binary")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("proxmoxctl"));
}

#[test]
fn missing_config_fails_before_any_request() {
    let dir = TempDir::new().expect("tempdir");
    proxmoxctl(&dir.path().join("absent.toml"))
        .args(["vm", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: missing required config keys"))
        .stderr(predicate::str::contains("server_url"))
        .stderr(predicate::str::contains("api_token"));
}

#[test]
fn partial_config_names_only_missing_key() {
    let server = MockServer::start();
    let any = server.mock(|when, then| {
        when.path_contains("/api2/json");
        then.status(200).json_body(json!({"data": []}));
    });

    let dir = TempDir::new().expect("tempdir");
    proxmoxctl(&dir.path().join("config.toml"))
        .env("PROXMOX_SERVER_URL", server.base_url())
        .args(["status", "cluster"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Error: missing required config keys: api_token (run `proxmoxctl config set`",
        ));

    any.assert_hits(0);
}

#[test]
fn config_set_then_show_masks_token() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("nested").join("config.toml");

    proxmoxctl(&path)
        .args([
            "config",
            "set",
            "--server-name",
            "homelab",
            "--server-url",
            "https://pve.local:8006",
            "--api-token",
            TOKEN,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ config saved to"));
    assert!(path.exists());

    proxmoxctl(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Server Name : homelab"))
        .stdout(predicate::str::contains("API Token   : root****cdef"))
        .stdout(predicate::str::contains(TOKEN).not());
}

#[test]
fn config_show_without_settings_fails() {
    let dir = TempDir::new().expect("tempdir");
    proxmoxctl(&dir.path().join("config.toml"))
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no configuration found"));
}

#[test]
fn vm_list_resolves_first_node() {
    let server = MockServer::start();
    let nodes = server.mock(|when, then| {
        when.method(GET)
            .path("/api2/json/nodes")
            .header("authorization", format!("PVEAPIToken={TOKEN}"));
        then.status(200)
            .json_body(json!({"data": [{"node": "pve1"}, {"node": "pve2"}]}));
    });
    let guests = server.mock(|when, then| {
        when.method(GET).path("/api2/json/nodes/pve1/qemu");
        then.status(200).json_body(json!({"data": [
            {"vmid": 101, "name": "db", "status": "stopped", "maxmem": 4_294_967_296u64, "cpus": 4},
            {"vmid": 100, "name": "web", "status": "running", "maxmem": 2_147_483_648u64,
             "cpus": 2, "uptime": 3_660}
        ]}));
    });

    let dir = TempDir::new().expect("tempdir");
    against(&server, &dir)
        .args(["vm", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Using node: pve1"))
        .stdout(
            predicate::str::is_match(r"(?s)100\s+web\s+running.*101\s+db\s+stopped")
                .expect("regex"),
        );

    nodes.assert();
    guests.assert();
}

#[test]
fn json_output_prints_raw_data() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api2/json/cluster/status");
        then.status(200).json_body(json!({"data": [
            {"type": "cluster", "name": "lab", "quorate": 1, "nodes": 2}
        ]}));
    });

    let dir = TempDir::new().expect("tempdir");
    let output = against(&server, &dir)
        .args(["-o", "json", "status", "cluster"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(
        printed,
        json!([{"type": "cluster", "name": "lab", "quorate": 1, "nodes": 2}])
    );
}

#[test]
fn api_error_body_is_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api2/json/nodes/pve1/qemu");
        then.status(500).body(r#"{"errors":{"vmid":"already exists"}}"#);
    });

    let dir = TempDir::new().expect("tempdir");
    against(&server, &dir)
        .args(["vm", "create", "--vmid", "100", "--name", "web", "--node", "pve1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            r#"Error: API error 500: {"errors":{"vmid":"already exists"}}"#,
        ));
}

#[test]
fn declined_prompt_aborts_without_request() {
    let server = MockServer::start();
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/api2/json/nodes/pve1/qemu/100");
        then.status(200).json_body(json!({"data": null}));
    });

    let dir = TempDir::new().expect("tempdir");
    against(&server, &dir)
        .args(["vm", "delete", "100", "--node", "pve1"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("⨯ Aborted."));

    delete.assert_hits(0);
}
