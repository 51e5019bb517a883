//! Snapshot command implementation.
//!
//! Snapshots live under `/nodes/{node}/{qemu|lxc}/{vmid}/snapshot`.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cli::{GuestType, SnapshotCommands};
use crate::client::ApiClient;
use crate::error::CliError;
use crate::format;
use crate::node::resolve_node;
use crate::output::{Message, OutputFormat, Table, TableDisplay};
use crate::resources::{Snapshot, decode, decode_list};

use super::{confirmed, upid};

/// Pseudo-snapshot the API lists for the running state.
const CURRENT: &str = "current";

/// Guest config keys holding 0/1 flags.
const FLAG_KEYS: [&str; 5] = ["onboot", "protection", "template", "tablet", "console"];

/// Body of `POST .../snapshot`.
#[derive(Debug, Serialize)]
struct CreateSnapshot<'a> {
    snapname: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vmstate: Option<u8>,
}

/// Snapshot command executor.
pub struct SnapshotCommand<'a> {
    client: &'a ApiClient,
    node: Option<&'a str>,
}

impl<'a> SnapshotCommand<'a> {
    /// Create a new snapshot command.
    #[must_use]
    pub const fn new(client: &'a ApiClient, node: Option<&'a str>) -> Self {
        Self { client, node }
    }

    /// Execute a snapshot subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails or the response cannot be decoded.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &SnapshotCommands,
    ) -> Result<(), CliError> {
        let node = resolve_node(self.client, self.node).await?;

        match command {
            SnapshotCommands::List { vmid, guest } => {
                let base = base_path(&node, *guest, *vmid);
                self.list(writer, format, &base, *guest, *vmid).await
            }
            SnapshotCommands::Create { vmid, guest, name, desc, vmstate } => {
                let base = base_path(&node, *guest, *vmid);
                let body = CreateSnapshot {
                    snapname: name,
                    description: desc.as_deref(),
                    // RAM state only exists for VMs.
                    vmstate: (*vmstate && *guest == GuestType::Qemu).then_some(1),
                };
                let task: Value = self.client.post(&base, Some(&body)).await?;
                debug!(upid = upid(&task), vmid, snapshot = name.as_str(), "snapshot queued");

                let msg = Message::success(format!(
                    "Snapshot '{name}' of {guest} {vmid} creation task queued"
                ));
                format.write(writer, &msg)
            }
            SnapshotCommands::Delete { vmid, guest, name, force } => {
                let question = format!("Delete snapshot '{name}' of {guest} {vmid}?");
                if !confirmed(*force, &question)? {
                    return format.write(writer, &Message::aborted("Aborted."));
                }
                let base = base_path(&node, *guest, *vmid);
                self.client.delete(&format!("{base}/{name}")).await?;

                let msg = Message::success(format!(
                    "Snapshot '{name}' of {guest} {vmid} deletion task queued"
                ));
                format.write(writer, &msg)
            }
            SnapshotCommands::Rollback { vmid, guest, name, force } => {
                let question = format!(
                    "Roll back {guest} {vmid} to snapshot '{name}'? This cannot be undone."
                );
                if !confirmed(*force, &question)? {
                    return format.write(writer, &Message::aborted("Rollback aborted."));
                }
                let base = base_path(&node, *guest, *vmid);
                let task: Value = self
                    .client
                    .post_empty(&format!("{base}/{name}/rollback"))
                    .await?;
                debug!(upid = upid(&task), vmid, snapshot = name.as_str(), "rollback queued");

                let msg = Message::success(format!(
                    "Rollback of {guest} {vmid} to snapshot '{name}' task queued"
                ));
                format.write(writer, &msg)
            }
            SnapshotCommands::Show { vmid, guest, name } => {
                let base = base_path(&node, *guest, *vmid);
                let data: Value = self.client.get(&format!("{base}/{name}/config")).await?;
                if format.is_json() {
                    return format.write_json(writer, &data);
                }

                let config = decode::<Option<BTreeMap<String, Value>>>(data)?
                    .unwrap_or_default();
                let mut table = Table::fields();
                for (key, value) in &config {
                    if FLAG_KEYS.contains(&key.as_str()) {
                        table.field(key, format::boolish(value));
                    } else {
                        table.field(key, format::stringify(value));
                    }
                }
                table.write_table(writer)
            }
        }
    }

    async fn list<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        base: &str,
        guest: GuestType,
        vmid: u32,
    ) -> Result<(), CliError> {
        let data: Value = self.client.get(base).await?;
        if format.is_json() {
            return format.write_json(writer, &data);
        }

        let snapshots: Vec<Snapshot> = decode_list(data)?;
        let mut table = Table::new(&["NAME", "DESCRIPTION", "VMSTATE", "CREATED"]);
        for snap in snapshots.iter().filter(|s| s.name != CURRENT) {
            table.row([
                snap.name.clone(),
                snap.description.clone(),
                format::yes_no(snap.vmstate).to_string(),
                format::timestamp(snap.snaptime),
            ]);
        }

        if table.is_empty() {
            let msg = Message::info(format!("No snapshots found for {guest} {vmid}."));
            return format.write(writer, &msg);
        }
        table.write_table(writer)
    }
}

fn base_path(node: &str, guest: GuestType, vmid: u32) -> String {
    format!("/nodes/{node}/{guest}/{vmid}/snapshot")
}
