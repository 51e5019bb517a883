//! VM command implementation.
//!
//! KVM guests under `/nodes/{node}/qemu`.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cli::{GuestType, VmCommands, VmCreateArgs};
use crate::client::ApiClient;
use crate::error::CliError;
use crate::node::resolve_node;
use crate::output::{Message, OutputFormat};

use super::guest::{self, PowerAction};
use super::upid;

const NET0: &str = "virtio,bridge=vmbr0";

/// Body of `POST /nodes/{node}/qemu`.
#[derive(Debug, Serialize)]
struct CreateVm<'a> {
    vmid: u32,
    name: &'a str,
    memory: u64,
    cores: u32,
    scsi0: &'a str,
    net0: &'static str,
    ostype: &'static str,
    scsihw: &'static str,
    boot: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ide2: Option<String>,
}

impl<'a> CreateVm<'a> {
    fn from_args(args: &'a VmCreateArgs) -> Self {
        let ide2 = args.iso.as_ref().map(|iso| format!("{iso},media=cdrom"));
        Self {
            vmid: args.vmid,
            name: &args.name,
            memory: args.memory,
            cores: args.cores,
            scsi0: &args.disk,
            net0: NET0,
            ostype: "l26",
            scsihw: "virtio-scsi-pci",
            boot: if ide2.is_some() {
                "order=scsi0;ide2"
            } else {
                "order=scsi0"
            },
            ide2,
        }
    }
}

/// Body of `PUT /nodes/{node}/qemu/{vmid}/config`.
#[derive(Debug, Serialize)]
struct ModifyVm<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cores: Option<u32>,
}

/// VM command executor.
pub struct VmCommand<'a> {
    client: &'a ApiClient,
    node: Option<&'a str>,
}

impl<'a> VmCommand<'a> {
    /// Create a new VM command.
    #[must_use]
    pub const fn new(client: &'a ApiClient, node: Option<&'a str>) -> Self {
        Self { client, node }
    }

    /// Execute a VM subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails, the response cannot be decoded,
    /// or `modify` is given nothing to change.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &VmCommands,
    ) -> Result<(), CliError> {
        if let VmCommands::Modify { name, memory, cores, .. } = command {
            if name.is_none() && memory.is_none() && cores.is_none() {
                return Err(CliError::InvalidArgument(
                    "no changes specified (use --name, --memory, or --cores)".into(),
                ));
            }
        }

        let node = resolve_node(self.client, self.node).await?;
        let client = self.client;
        let kind = GuestType::Qemu;

        match command {
            VmCommands::List => guest::list(client, &node, kind, writer, format).await,
            VmCommands::Create(args) => self.create(&node, args, writer, format).await,
            VmCommands::Modify { vmid, name, memory, cores } => {
                let changes = ModifyVm {
                    name: name.as_deref(),
                    memory: *memory,
                    cores: *cores,
                };
                self.modify(&node, *vmid, &changes, writer, format).await
            }
            VmCommands::Delete { vmid, force } => {
                guest::delete(client, &node, kind, *vmid, *force, writer, format).await
            }
            VmCommands::Start { vmid } => {
                guest::power(client, &node, kind, *vmid, PowerAction::Start, writer, format).await
            }
            VmCommands::Stop { vmid } => {
                guest::power(client, &node, kind, *vmid, PowerAction::Stop, writer, format).await
            }
            VmCommands::Shutdown { vmid } => {
                guest::power(client, &node, kind, *vmid, PowerAction::Shutdown, writer, format)
                    .await
            }
            VmCommands::Reboot { vmid } => {
                guest::power(client, &node, kind, *vmid, PowerAction::Reboot, writer, format)
                    .await
            }
            VmCommands::Status { vmid } => {
                guest::status(client, &node, kind, *vmid, writer, format).await
            }
        }
    }

    async fn create<W: Write>(
        &self,
        node: &str,
        args: &VmCreateArgs,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let body = CreateVm::from_args(args);
        let task: Value = self
            .client
            .post(&format!("/nodes/{node}/qemu"), Some(&body))
            .await?;
        debug!(upid = upid(&task), vmid = args.vmid, "VM creation queued");

        let msg = Message::success(format!(
            "VM {} ({}) creation task queued on node {node}",
            args.vmid, args.name
        ));
        format.write(writer, &msg)
    }

    async fn modify<W: Write>(
        &self,
        node: &str,
        vmid: u32,
        changes: &ModifyVm<'_>,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let _: Value = self
            .client
            .put(&format!("/nodes/{node}/qemu/{vmid}/config"), Some(changes))
            .await?;
        format.write(writer, &Message::success(format!("VM {vmid} updated successfully")))
    }
}
