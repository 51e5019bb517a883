//! Container command implementation.
//!
//! LXC guests under `/nodes/{node}/lxc`.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cli::{GuestType, LxcCommands, LxcCreateArgs};
use crate::client::ApiClient;
use crate::error::CliError;
use crate::node::resolve_node;
use crate::output::{Message, OutputFormat};

use super::guest::{self, PowerAction};
use super::upid;

/// Body of `POST /nodes/{node}/lxc`.
#[derive(Debug, Serialize)]
struct CreateContainer<'a> {
    vmid: u32,
    hostname: &'a str,
    memory: u64,
    cores: u32,
    rootfs: &'a str,
    ostemplate: &'a str,
    net0: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

/// Container command executor.
pub struct LxcCommand<'a> {
    client: &'a ApiClient,
    node: Option<&'a str>,
}

impl<'a> LxcCommand<'a> {
    /// Create a new container command.
    #[must_use]
    pub const fn new(client: &'a ApiClient, node: Option<&'a str>) -> Self {
        Self { client, node }
    }

    /// Execute a container subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails or the response cannot be decoded.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &LxcCommands,
    ) -> Result<(), CliError> {
        let node = resolve_node(self.client, self.node).await?;
        let client = self.client;
        let kind = GuestType::Lxc;

        match command {
            LxcCommands::List => guest::list(client, &node, kind, writer, format).await,
            LxcCommands::Create(args) => self.create(&node, args, writer, format).await,
            LxcCommands::Delete { vmid, force } => {
                guest::delete(client, &node, kind, *vmid, *force, writer, format).await
            }
            LxcCommands::Start { vmid } => {
                guest::power(client, &node, kind, *vmid, PowerAction::Start, writer, format).await
            }
            LxcCommands::Stop { vmid } => {
                guest::power(client, &node, kind, *vmid, PowerAction::Stop, writer, format).await
            }
            LxcCommands::Shutdown { vmid } => {
                guest::power(client, &node, kind, *vmid, PowerAction::Shutdown, writer, format)
                    .await
            }
            LxcCommands::Reboot { vmid } => {
                guest::power(client, &node, kind, *vmid, PowerAction::Reboot, writer, format)
                    .await
            }
            LxcCommands::Status { vmid } => {
                guest::status(client, &node, kind, *vmid, writer, format).await
            }
        }
    }

    async fn create<W: Write>(
        &self,
        node: &str,
        args: &LxcCreateArgs,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let body = CreateContainer {
            vmid: args.vmid,
            hostname: &args.hostname,
            memory: args.memory,
            cores: args.cores,
            rootfs: &args.disk,
            ostemplate: &args.template,
            net0: "name=eth0,bridge=vmbr0,ip=dhcp",
            password: args.password.as_deref(),
        };
        let task: Value = self
            .client
            .post(&format!("/nodes/{node}/lxc"), Some(&body))
            .await?;
        debug!(upid = upid(&task), vmid = args.vmid, "container creation queued");

        let msg = Message::success(format!(
            "LXC container {} ({}) creation task queued on node {node}",
            args.vmid, args.hostname
        ));
        format.write(writer, &msg)
    }
}
