//! Status command implementation.
//!
//! Read-only views of the cluster:
//! - Cluster quorum and per-node summary
//! - Detailed status of one node
//! - Cluster resources grouped by type
//! - Recent tasks on a node

use std::collections::HashMap;
use std::io::Write;

use serde_json::{Value, json};
use tracing::debug;

use crate::cli::StatusCommands;
use crate::client::ApiClient;
use crate::error::CliError;
use crate::format;
use crate::node::resolve_node;
use crate::output::{Message, OutputFormat, Table, TableDisplay, section_header};
use crate::resources::{
    ClusterStatusEntry, NodeStatus, NodeVersion, Resource, Task, Usage, decode, decode_list,
};

/// Status command executor.
pub struct StatusCommand<'a> {
    client: &'a ApiClient,
    node: Option<&'a str>,
}

impl<'a> StatusCommand<'a> {
    /// Create a new status command.
    #[must_use]
    pub const fn new(client: &'a ApiClient, node: Option<&'a str>) -> Self {
        Self { client, node }
    }

    /// Execute a status subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails or the response cannot be decoded.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &StatusCommands,
    ) -> Result<(), CliError> {
        match command {
            StatusCommands::Cluster => self.cluster(writer, format).await,
            StatusCommands::Node => self.node_status(writer, format).await,
            StatusCommands::Resources { kind } => {
                self.resources(writer, format, kind.as_deref()).await
            }
            StatusCommands::Tasks { limit, errors } => {
                self.tasks(writer, format, *limit, *errors).await
            }
        }
    }

    async fn cluster<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let data: Value = self.client.get("/cluster/status").await?;
        if format.is_json() {
            return format.write_json(writer, &data);
        }

        let entries: Vec<ClusterStatusEntry> = decode_list(data)?;
        let mut cluster = None;
        let mut nodes = Table::new(&[
            "NODE", "STATUS", "ONLINE", "CPU", "MEM USED", "MEM TOTAL", "UPTIME",
        ]);

        for entry in &entries {
            match entry.kind.as_str() {
                "cluster" => {
                    let mut table = Table::fields();
                    table.field("Name", entry.name.as_str());
                    table.field("Quorum", format::yes_no(entry.quorate));
                    table.field("Nodes (total)", entry.nodes.to_string());
                    table.field("Version", entry.version.as_str());
                    cluster = Some(table);
                }
                "node" => nodes.row([
                    entry.name.clone(),
                    entry.node_status().to_string(),
                    format::yes_no(entry.online).to_string(),
                    format::percentage(entry.cpu),
                    format::size(entry.mem),
                    format::size(entry.maxmem),
                    format::duration(entry.uptime),
                ]),
                other => debug!(kind = other, "skipping cluster status entry"),
            }
        }

        // A standalone node reports no cluster entry.
        if let Some(table) = cluster {
            section_header(writer, "CLUSTER")?;
            table.write_table(writer)?;
        }
        if !nodes.is_empty() {
            section_header(writer, "NODES")?;
            nodes.write_table(writer)?;
        }
        Ok(())
    }

    async fn node_status<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let node = resolve_node(self.client, self.node).await?;
        let status: Value = self.client.get(&format!("/nodes/{node}/status")).await?;
        let version: Value = match self.client.get(&format!("/nodes/{node}/version")).await {
            Ok(version) => version,
            Err(e) => {
                debug!(error = %e, "node version unavailable");
                Value::Null
            }
        };

        if format.is_json() {
            return format.write_json(writer, &json!({"status": status, "version": version}));
        }

        let status: NodeStatus = decode(status)?;
        let version: NodeVersion = decode::<Option<NodeVersion>>(version)
            .ok()
            .flatten()
            .unwrap_or_default();

        section_header(writer, &format!("NODE: {}", node.to_uppercase()))?;
        let mut overview = Table::fields();
        overview.field("Node", node.as_str());
        overview.field("Manager", status.pveversion.as_str());
        overview.field("Kernel", status.kversion.as_str());
        overview.field("PVE Version", version.version.as_str());
        overview.field("Uptime", format::duration(status.uptime));
        overview.write_table(writer)?;

        section_header(writer, "CPU")?;
        let cpu = &status.cpuinfo;
        let mut table = Table::fields();
        table.field("Model", cpu.model.as_str());
        table.field("Sockets", cpu.sockets.to_string());
        table.field("Cores per Socket", cpu.cores.to_string());
        table.field("Threads (total)", cpu.cpus.to_string());
        table.field("Current Usage", format::percentage(status.cpu));
        table.field("Load Avg (1/5/15m)", format::load_avg(&status.loadavg));
        table.write_table(writer)?;

        for (title, usage) in [
            ("MEMORY", &status.memory),
            ("SWAP", &status.swap),
            ("ROOT FILESYSTEM", &status.rootfs),
        ] {
            section_header(writer, title)?;
            usage_table(usage).write_table(writer)?;
        }
        Ok(())
    }

    async fn resources<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        kind: Option<&str>,
    ) -> Result<(), CliError> {
        let path = match kind {
            Some(kind) if !kind.is_empty() => format!("/cluster/resources?type={kind}"),
            _ => "/cluster/resources".to_string(),
        };
        let data: Value = self.client.get(&path).await?;
        if format.is_json() {
            return format.write_json(writer, &data);
        }

        let resources: Vec<Resource> = decode_list(data)?;
        let mut order: Vec<&str> = Vec::new();
        let mut grouped: HashMap<&str, Vec<&Resource>> = HashMap::new();
        for resource in &resources {
            let group = grouped.entry(resource.kind.as_str()).or_default();
            if group.is_empty() {
                order.push(resource.kind.as_str());
            }
            group.push(resource);
        }

        for kind in order {
            let items = grouped.get(kind).map(Vec::as_slice).unwrap_or_default();
            section_header(writer, &format!("{}S", kind.to_uppercase()))?;
            resource_table(kind, items).write_table(writer)?;
        }
        Ok(())
    }

    async fn tasks<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        limit: u32,
        errors: bool,
    ) -> Result<(), CliError> {
        let node = resolve_node(self.client, self.node).await?;
        let mut path = format!("/nodes/{node}/tasks?limit={limit}");
        if errors {
            path.push_str("&errors=1");
        }
        let data: Value = self.client.get(&path).await?;
        if format.is_json() {
            return format.write_json(writer, &data);
        }

        let tasks: Vec<Task> = decode_list(data)?;
        if tasks.is_empty() {
            return format.write(writer, &Message::info("No tasks found."));
        }

        let mut table = Table::new(&["UPID", "TYPE", "USER", "STATUS", "STARTED", "ENDED"]);
        for task in &tasks {
            table.row([
                format::truncate(&task.upid, 40),
                task.kind.clone(),
                task.user.clone(),
                task.display_status().to_string(),
                format::timestamp(task.starttime),
                format::timestamp(task.endtime),
            ]);
        }
        section_header(writer, &format!("RECENT TASKS (NODE: {})", node.to_uppercase()))?;
        table.write_table(writer)
    }
}

fn usage_table(usage: &Usage) -> Table {
    let mut table = Table::fields();
    table.field("Used", format::size(usage.used));
    table.field("Free", format::size(usage.free));
    table.field("Total", format::size(usage.total));
    table.field("Usage", format::usage_bar(usage.used, usage.total, 20));
    table
}

fn resource_table(kind: &str, items: &[&Resource]) -> Table {
    match kind {
        "qemu" | "lxc" => {
            let mut table = Table::new(&[
                "ID", "NAME", "NODE", "STATUS", "CPU", "MEM", "DISK", "UPTIME",
            ]);
            for r in items {
                table.row([
                    r.vmid.to_string(),
                    r.name.clone(),
                    r.node.clone(),
                    r.status.clone(),
                    format::percentage(r.cpu),
                    format::size(r.mem),
                    format::size(r.maxdisk),
                    format::duration(r.uptime),
                ]);
            }
            table
        }
        "storage" => {
            let mut table = Table::new(&["NAME", "NODE", "STATUS", "USED", "TOTAL", "USAGE"]);
            for r in items {
                table.row([
                    r.storage.clone(),
                    r.node.clone(),
                    r.status.clone(),
                    format::size(r.disk),
                    format::size(r.maxdisk),
                    format::usage_bar(r.disk, r.maxdisk, 16),
                ]);
            }
            table
        }
        "node" => {
            let mut table = Table::new(&[
                "NODE", "STATUS", "CPU", "MEM USED", "MEM TOTAL", "UPTIME",
            ]);
            for r in items {
                table.row([
                    r.node.clone(),
                    r.status.clone(),
                    format::percentage(r.cpu),
                    format::size(r.mem),
                    format::size(r.maxmem),
                    format::duration(r.uptime),
                ]);
            }
            table
        }
        _ => {
            let mut table = Table::new(&["ID", "TYPE", "STATUS", "NODE"]);
            for r in items {
                table.row([r.id.clone(), r.kind.clone(), r.status.clone(), r.node.clone()]);
            }
            table
        }
    }
}
