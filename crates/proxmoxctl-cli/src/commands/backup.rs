//! Backup command implementation.
//!
//! Provides subcommands for:
//! - On-demand backups through `vzdump`
//! - Listing, inspecting and deleting backup volumes
//! - Restoring a backup into a guest
//! - Scheduled jobs (see the `jobs` module)

use std::io::Write;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cli::{BackupCommands, BackupCreateArgs, BackupRestoreArgs};
use crate::client::ApiClient;
use crate::error::CliError;
use crate::format;
use crate::node::resolve_node;
use crate::output::{Message, OutputFormat, Table, TableDisplay};
use crate::resources::{Volume, decode, decode_list};

use super::jobs::JobsCommand;
use super::{confirmed, upid};

/// Body of `POST /nodes/{node}/vzdump`.
#[derive(Debug, Serialize)]
struct Vzdump<'a> {
    storage: &'a str,
    mode: &'a str,
    compress: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    all: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vmid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mailto: Option<&'a str>,
    #[serde(rename = "notes-template", skip_serializing_if = "Option::is_none")]
    notes_template: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remove: Option<u32>,
}

impl<'a> Vzdump<'a> {
    fn from_args(args: &'a BackupCreateArgs) -> Self {
        let all = args.vmids == "all";
        Self {
            storage: &args.storage,
            mode: &args.mode,
            compress: &args.compress,
            all: all.then_some(1),
            vmid: (!all).then_some(args.vmids.as_str()),
            mailto: args.mailto.as_deref(),
            notes_template: args.notes.as_deref(),
            remove: (args.remove_older > 0).then_some(args.remove_older),
        }
    }
}

/// Body of a restore, `POST /nodes/{node}/{qemu|lxc}`.
#[derive(Debug, Serialize)]
struct Restore<'a> {
    vmid: u32,
    archive: String,
    force: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<u8>,
}

/// Backup command executor.
pub struct BackupCommand<'a> {
    client: &'a ApiClient,
    node: Option<&'a str>,
}

impl<'a> BackupCommand<'a> {
    /// Create a new backup command.
    #[must_use]
    pub const fn new(client: &'a ApiClient, node: Option<&'a str>) -> Self {
        Self { client, node }
    }

    /// Execute a backup subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails, the response cannot be decoded,
    /// or a job command is given invalid arguments.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &BackupCommands,
    ) -> Result<(), CliError> {
        // Jobs are cluster-wide and need no node.
        if let BackupCommands::Jobs { command } = command {
            return JobsCommand::new(self.client).execute(writer, format, command).await;
        }

        let node = resolve_node(self.client, self.node).await?;
        match command {
            BackupCommands::Create(args) => self.create(&node, args, writer, format).await,
            BackupCommands::List { storage, vmid } => {
                self.list(&node, storage, *vmid, writer, format).await
            }
            BackupCommands::Show { storage, file } => {
                self.show(&node, storage, file, writer, format).await
            }
            BackupCommands::Delete { storage, file, force } => {
                let volid = format!("{storage}:{file}");
                let question = format!("Delete backup '{volid}'? This cannot be undone.");
                if !confirmed(*force, &question)? {
                    return format.write(writer, &Message::aborted("Aborted."));
                }
                self.client
                    .delete(&format!("/nodes/{node}/storage/{storage}/content/{file}"))
                    .await?;
                format.write(writer, &Message::success(format!("Backup '{volid}' deleted")))
            }
            BackupCommands::Restore(args) => self.restore(&node, args, writer, format).await,
            // Dispatched above.
            BackupCommands::Jobs { .. } => Ok(()),
        }
    }

    async fn create<W: Write>(
        &self,
        node: &str,
        args: &BackupCreateArgs,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let body = Vzdump::from_args(args);
        let task: Value = self
            .client
            .post(&format!("/nodes/{node}/vzdump"), Some(&body))
            .await?;
        debug!(upid = upid(&task), guests = args.vmids.as_str(), "backup queued");

        let msg = Message::success(format!(
            "Backup task queued for guest(s) {} on node {node} → storage: {} \
             (mode: {}, compress: {})",
            args.vmids, args.storage, args.mode, args.compress
        ));
        format.write(writer, &msg)
    }

    async fn list<W: Write>(
        &self,
        node: &str,
        storage: &str,
        vmid: Option<u32>,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let mut path = format!("/nodes/{node}/storage/{storage}/content?content=backup");
        if let Some(vmid) = vmid {
            path.push_str(&format!("&vmid={vmid}"));
        }
        let data: Value = self.client.get(&path).await?;
        if format.is_json() {
            return format.write_json(writer, &data);
        }

        let backups: Vec<Volume> = decode_list(data)?;
        if backups.is_empty() {
            let msg = Message::info(format!("No backups found on storage '{storage}'."));
            return format.write(writer, &msg);
        }

        let mut table = Table::new(&["VOLID", "VMID", "FORMAT", "SIZE", "CREATED"]);
        for backup in &backups {
            table.row([
                backup.volid.clone(),
                format::id_or_dash(backup.vmid),
                backup.format.clone(),
                format::size(backup.size),
                format::timestamp(backup.ctime),
            ]);
        }
        table.write_table(writer)
    }

    async fn show<W: Write>(
        &self,
        node: &str,
        storage: &str,
        file: &str,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let data: Value = self
            .client
            .get(&format!("/nodes/{node}/storage/{storage}/content/{file}"))
            .await?;
        if format.is_json() {
            return format.write_json(writer, &data);
        }

        let backup: Volume = decode(data)?;
        let mut table = Table::fields();
        table.field("Volume ID", format!("{storage}:{file}"));
        table.field("Format", backup.format.as_str());
        table.field("Size", format::size(backup.size));
        table.field("Created", format::timestamp(backup.ctime));
        table.field("Notes", backup.notes.as_str());
        table.field("Protected", format::yes_no(backup.protected));
        table.field("Encrypted", format::yes_no(!backup.encrypted.is_empty()));
        table.write_table(writer)
    }

    async fn restore<W: Write>(
        &self,
        node: &str,
        args: &BackupRestoreArgs,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let guest = args.guest;
        let archive = format!("{}:{}", args.storage, args.file);
        let question = format!("Restore {guest} {} from '{archive}'?", args.vmid);
        if !confirmed(args.force, &question)? {
            return format.write(writer, &Message::aborted("Aborted."));
        }

        let body = Restore {
            vmid: args.vmid,
            archive,
            force: 1,
            storage: args.target_storage.as_deref(),
            start: args.start.then_some(1),
        };
        let task: Value = self
            .client
            .post(&format!("/nodes/{node}/{guest}"), Some(&body))
            .await?;
        debug!(upid = upid(&task), vmid = args.vmid, "restore queued");

        let msg = Message::success(format!(
            "Restore of {guest} {} from '{}' task queued on node {node}",
            args.vmid, body.archive
        ));
        format.write(writer, &msg)
    }
}
