//! Clone command implementation.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cli::{CloneCommands, CloneLxcArgs, CloneVmArgs};
use crate::client::ApiClient;
use crate::error::CliError;
use crate::node::resolve_node;
use crate::output::{Message, OutputFormat};

use super::upid;

/// Body of `POST /nodes/{node}/qemu/{vmid}/clone`.
#[derive(Debug, Serialize)]
struct CloneVm<'a> {
    newid: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pool: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage: Option<&'a str>,
    full: u8,
}

/// Body of `POST /nodes/{node}/lxc/{vmid}/clone`.
#[derive(Debug, Serialize)]
struct CloneContainer<'a> {
    newid: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    hostname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pool: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage: Option<&'a str>,
}

/// Clone command executor.
pub struct CloneCommand<'a> {
    client: &'a ApiClient,
    node: Option<&'a str>,
}

impl<'a> CloneCommand<'a> {
    /// Create a new clone command.
    #[must_use]
    pub const fn new(client: &'a ApiClient, node: Option<&'a str>) -> Self {
        Self { client, node }
    }

    /// Execute a clone subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &CloneCommands,
    ) -> Result<(), CliError> {
        let node = resolve_node(self.client, self.node).await?;
        let msg = match command {
            CloneCommands::Vm(args) => self.clone_vm(&node, args).await?,
            CloneCommands::Lxc(args) => self.clone_lxc(&node, args).await?,
        };
        format.write(writer, &msg)
    }

    async fn clone_vm(&self, node: &str, args: &CloneVmArgs) -> Result<Message, CliError> {
        // --full wins over --linked.
        let full = args.full || !args.linked;
        let body = CloneVm {
            newid: args.newid,
            name: args.name.as_deref(),
            snapname: args.snapname.as_deref(),
            pool: args.pool.as_deref(),
            storage: args.storage.as_deref(),
            full: u8::from(full),
        };
        let task: Value = self
            .client
            .post(&format!("/nodes/{node}/qemu/{}/clone", args.vmid), Some(&body))
            .await?;
        debug!(upid = upid(&task), source = args.vmid, newid = args.newid, full, "VM clone queued");

        let mode = if full { "Full" } else { "Linked" };
        Ok(Message::success(format!(
            "{mode} clone of VM {} → VM {} queued on node {node}",
            args.vmid, args.newid
        )))
    }

    async fn clone_lxc(&self, node: &str, args: &CloneLxcArgs) -> Result<Message, CliError> {
        let body = CloneContainer {
            newid: args.newid,
            hostname: args.hostname.as_deref(),
            snapname: args.snapname.as_deref(),
            pool: args.pool.as_deref(),
            storage: args.storage.as_deref(),
        };
        let task: Value = self
            .client
            .post(&format!("/nodes/{node}/lxc/{}/clone", args.vmid), Some(&body))
            .await?;
        debug!(
            upid = upid(&task),
            source = args.vmid,
            newid = args.newid,
            "container clone queued"
        );

        Ok(Message::success(format!(
            "Clone of LXC container {} → container {} queued on node {node}",
            args.vmid, args.newid
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{client_for, table, text};
    use httpmock::prelude::*;
    use serde_json::json;

    fn vm_args(linked: bool, full: bool) -> CloneVmArgs {
        CloneVmArgs {
            vmid: 9000,
            newid: 120,
            name: Some("web-clone".into()),
            snapname: None,
            pool: None,
            storage: None,
            linked,
            full,
        }
    }

    async fn clone_vm_with(args: CloneVmArgs, expected_full: u8) -> String {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api2/json/nodes/pve1/qemu/9000/clone")
                    .json_body(json!({"newid": 120, "name": "web-clone", "full": expected_full}));
                then.status(200).json_body(json!({"data": "UPID:pve1:6"}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        CloneCommand::new(&client, Some("pve1"))
            .execute(&mut buf, &table(), &CloneCommands::Vm(args))
            .await
            .expect("clone");
        mock.assert_async().await;
        text(buf)
    }

    #[tokio::test]
    async fn vm_clone_is_full_by_default() {
        let out = clone_vm_with(vm_args(false, false), 1).await;
        assert_eq!(out, "✓ Full clone of VM 9000 → VM 120 queued on node pve1\n");
    }

    #[tokio::test]
    async fn linked_vm_clone() {
        let out = clone_vm_with(vm_args(true, false), 0).await;
        assert_eq!(out, "✓ Linked clone of VM 9000 → VM 120 queued on node pve1\n");
    }

    #[tokio::test]
    async fn full_flag_overrides_linked() {
        let out = clone_vm_with(vm_args(true, true), 1).await;
        assert!(out.starts_with("✓ Full clone"));
    }

    #[tokio::test]
    async fn lxc_clone_sends_optional_fields() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api2/json/nodes/pve1/lxc/200/clone")
                    .json_body(json!({"newid": 201, "hostname": "cache2", "storage": "local-lvm"}));
                then.status(200).json_body(json!({"data": "UPID:pve1:7"}));
            })
            .await;

        let args = CloneLxcArgs {
            vmid: 200,
            newid: 201,
            hostname: Some("cache2".into()),
            snapname: None,
            pool: None,
            storage: Some("local-lvm".into()),
        };
        let client = client_for(&server);
        let mut buf = Vec::new();
        CloneCommand::new(&client, Some("pve1"))
            .execute(&mut buf, &table(), &CloneCommands::Lxc(args))
            .await
            .expect("clone");

        mock.assert_async().await;
        assert_eq!(
            text(buf),
            "✓ Clone of LXC container 200 → container 201 queued on node pve1\n"
        );
    }
}
