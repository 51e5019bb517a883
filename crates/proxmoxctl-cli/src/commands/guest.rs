//! Operations shared by VMs and containers.
//!
//! Both guest kinds expose the same list, status, power and delete endpoints
//! under `/nodes/{node}/{qemu|lxc}`.

use std::io::Write;

use serde_json::Value;
use tracing::debug;

use crate::cli::GuestType;
use crate::client::ApiClient;
use crate::error::CliError;
use crate::format;
use crate::output::{Message, OutputFormat, Table, TableDisplay};
use crate::resources::{GuestStatus, GuestSummary, decode, decode_list};

use super::{confirmed, upid};

/// Power transitions accepted by `status/{action}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PowerAction {
    Start,
    Stop,
    Shutdown,
    Reboot,
}

impl PowerAction {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Shutdown => "shutdown",
            Self::Reboot => "reboot",
        }
    }
}

/// How a guest kind is named in messages.
pub(crate) const fn label(kind: GuestType) -> &'static str {
    match kind {
        GuestType::Qemu => "VM",
        GuestType::Lxc => "LXC container",
    }
}

/// Guests on one node, sorted by id.
pub(crate) async fn list<W: Write>(
    client: &ApiClient,
    node: &str,
    kind: GuestType,
    writer: &mut W,
    format: &OutputFormat,
) -> Result<(), CliError> {
    let data: Value = client.get(&format!("/nodes/{node}/{kind}")).await?;
    if format.is_json() {
        return format.write_json(writer, &data);
    }

    let mut guests: Vec<GuestSummary> = decode_list(data)?;
    guests.sort_by_key(|g| g.vmid);

    let mut table = Table::new(&["VMID", "NAME", "STATUS", "MEMORY", "CPUS", "UPTIME"]);
    for guest in &guests {
        table.row([
            guest.vmid.to_string(),
            guest.name.clone(),
            guest.status.clone(),
            format::size(guest.maxmem),
            guest.cpus.to_string(),
            format::duration(guest.uptime),
        ]);
    }
    table.write_table(writer)
}

pub(crate) async fn status<W: Write>(
    client: &ApiClient,
    node: &str,
    kind: GuestType,
    vmid: u32,
    writer: &mut W,
    format: &OutputFormat,
) -> Result<(), CliError> {
    let data: Value = client
        .get(&format!("/nodes/{node}/{kind}/{vmid}/status/current"))
        .await?;
    if format.is_json() {
        return format.write_json(writer, &data);
    }

    let status: GuestStatus = decode(data)?;
    let mut table = Table::fields();
    table.field("VMID", vmid.to_string());
    table.field("Name", status.name.as_str());
    table.field("Status", status.status.as_str());
    table.field("CPU Usage", format::percentage(status.cpu));
    table.field(
        "Memory",
        format!("{} / {}", format::size(status.mem), format::size(status.maxmem)),
    );
    table.field("Uptime", format::duration(status.uptime));
    table.write_table(writer)
}

pub(crate) async fn power<W: Write>(
    client: &ApiClient,
    node: &str,
    kind: GuestType,
    vmid: u32,
    action: PowerAction,
    writer: &mut W,
    format: &OutputFormat,
) -> Result<(), CliError> {
    let action = action.as_str();
    let task: Value = client
        .post_empty(&format!("/nodes/{node}/{kind}/{vmid}/status/{action}"))
        .await?;
    debug!(upid = upid(&task), action, vmid, "power task queued");

    let msg = Message::success(format!("{} {vmid} {action} task queued", label(kind)));
    format.write(writer, &msg)
}

pub(crate) async fn delete<W: Write>(
    client: &ApiClient,
    node: &str,
    kind: GuestType,
    vmid: u32,
    force: bool,
    writer: &mut W,
    format: &OutputFormat,
) -> Result<(), CliError> {
    let what = label(kind);
    if !confirmed(force, &format!("Are you sure you want to delete {what} {vmid}?"))? {
        return format.write(writer, &Message::aborted("Aborted."));
    }

    client.delete(&format!("/nodes/{node}/{kind}/{vmid}")).await?;
    format.write(writer, &Message::success(format!("{what} {vmid} deleted")))
}
