//! Storage command implementation.
//!
//! Without `--node`, `list` and `show` read the cluster-wide storage
//! configuration. With it they read live usage from that node.

use std::io::Write;

use serde_json::Value;

use crate::cli::StorageCommands;
use crate::client::ApiClient;
use crate::error::CliError;
use crate::format;
use crate::node::resolve_node;
use crate::output::{Message, OutputFormat, Table, TableDisplay, section_header};
use crate::resources::{Storage, Volume, decode, decode_list};

/// Storage command executor.
pub struct StorageCommand<'a> {
    client: &'a ApiClient,
    node: Option<&'a str>,
}

impl<'a> StorageCommand<'a> {
    /// Create a new storage command.
    #[must_use]
    pub const fn new(client: &'a ApiClient, node: Option<&'a str>) -> Self {
        Self { client, node }
    }

    /// Execute a storage subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails or the response cannot be decoded.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &StorageCommands,
    ) -> Result<(), CliError> {
        match command {
            StorageCommands::List { active, content } => {
                self.list(writer, format, *active, content.as_deref()).await
            }
            StorageCommands::Show { storage } => self.show(writer, format, storage).await,
            StorageCommands::Content { storage, kind, vmid } => {
                self.content(writer, format, storage, kind.as_deref(), *vmid)
                    .await
            }
        }
    }

    async fn list<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        active: bool,
        content: Option<&str>,
    ) -> Result<(), CliError> {
        let mut path = match self.node {
            Some(node) => format!("/nodes/{node}/storage"),
            None => "/storage".to_string(),
        };
        let mut query = Vec::new();
        if active {
            query.push("enabled=1".to_string());
        }
        if let Some(content) = content {
            query.push(format!("content={content}"));
        }
        if !query.is_empty() {
            path = format!("{path}?{}", query.join("&"));
        }

        let data: Value = self.client.get(&path).await?;
        if format.is_json() {
            return format.write_json(writer, &data);
        }

        let pools: Vec<Storage> = decode_list(data)?;
        if pools.is_empty() {
            return format.write(writer, &Message::info("No storage pools found."));
        }

        let table = if let Some(node) = self.node {
            section_header(writer, &format!("STORAGE — NODE: {}", node.to_uppercase()))?;
            let mut table = Table::new(&[
                "NAME", "TYPE", "STATUS", "USED", "AVAIL", "TOTAL", "USAGE", "CONTENT",
            ]);
            for pool in &pools {
                table.row([
                    pool.storage.clone(),
                    pool.kind.clone(),
                    pool.state().to_string(),
                    format::size(pool.used),
                    format::size(pool.avail),
                    format::size(pool.total),
                    format::usage_bar(pool.used, pool.total, 14),
                    format::content_list(&pool.content),
                ]);
            }
            table
        } else {
            section_header(writer, "STORAGE — CLUSTER CONFIG")?;
            let mut table = Table::new(&[
                "NAME", "TYPE", "SHARED", "ENABLED", "CONTENT", "PATH / SERVER",
            ]);
            for pool in &pools {
                table.row([
                    pool.storage.clone(),
                    pool.kind.clone(),
                    format::yes_no(pool.shared).to_string(),
                    format::enabled(pool.disable).to_string(),
                    format::content_list(&pool.content),
                    pool.location().to_string(),
                ]);
            }
            table
        };
        table.write_table(writer)
    }

    async fn show<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        storage: &str,
    ) -> Result<(), CliError> {
        let path = match self.node {
            Some(node) => format!("/nodes/{node}/storage/{storage}/status"),
            None => format!("/storage/{storage}"),
        };
        let data: Value = self.client.get(&path).await?;
        if format.is_json() {
            return format.write_json(writer, &data);
        }

        let pool: Storage = decode(data)?;
        let mut table = Table::fields();
        table.field("Name", pool.storage.as_str());
        table.field("Type", pool.kind.as_str());
        table.field("Content", format::content_list(&pool.content));
        table.field("Shared", format::yes_no(pool.shared));
        table.field("Enabled", format::enabled(pool.disable));
        for (name, value) in [
            ("Path", &pool.path),
            ("Server", &pool.server),
            ("Export", &pool.export),
            ("Pool", &pool.pool),
            ("Datastore", &pool.datastore),
        ] {
            if !value.is_empty() {
                table.field(name, value.as_str());
            }
        }
        // Usage is only reported by the node-level endpoint.
        if pool.total > 0 {
            table.field("Used", format::size(pool.used));
            table.field("Avail", format::size(pool.avail));
            table.field("Total", format::size(pool.total));
            table.field("Usage", format::usage_bar(pool.used, pool.total, 20));
        }

        section_header(writer, &format!("STORAGE: {}", storage.to_uppercase()))?;
        table.write_table(writer)
    }

    async fn content<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        storage: &str,
        kind: Option<&str>,
        vmid: Option<u32>,
    ) -> Result<(), CliError> {
        let node = resolve_node(self.client, self.node).await?;
        let mut path = format!("/nodes/{node}/storage/{storage}/content");
        let mut query = Vec::new();
        if let Some(kind) = kind {
            query.push(format!("content={kind}"));
        }
        if let Some(vmid) = vmid {
            query.push(format!("vmid={vmid}"));
        }
        if !query.is_empty() {
            path = format!("{path}?{}", query.join("&"));
        }

        let data: Value = self.client.get(&path).await?;
        if format.is_json() {
            return format.write_json(writer, &data);
        }

        let volumes: Vec<Volume> = decode_list(data)?;
        if volumes.is_empty() {
            let msg = Message::info(format!("No content found in storage '{storage}'."));
            return format.write(writer, &msg);
        }

        section_header(writer, &format!("CONTENT — {}", storage.to_uppercase()))?;
        let mut table = Table::new(&["VOLUME ID", "TYPE", "FORMAT", "SIZE", "VMID", "NOTES"]);
        for volume in &volumes {
            table.row([
                volume.volid.clone(),
                volume.content.clone(),
                volume.format.clone(),
                format::size(volume.size),
                format::id_or_dash(volume.vmid),
                volume.notes.clone(),
            ]);
        }
        table.write_table(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{client_for, json as json_format, table, text};
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn cluster_list_shows_configuration() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api2/json/storage");
                then.status(200).json_body(json!({"data": [
                    {"storage": "local", "type": "dir", "content": "iso,vztmpl,backup",
                     "path": "/var/lib/vz"},
                    {"storage": "nas", "type": "nfs", "content": "backup", "shared": 1,
                     "disable": 1, "server": "10.0.0.5"}
                ]}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        let command = StorageCommands::List { active: false, content: None };
        StorageCommand::new(&client, None)
            .execute(&mut buf, &table(), &command)
            .await
            .expect("list");

        mock.assert_async().await;
        let out = text(buf);
        assert!(out.starts_with("\n  STORAGE — CLUSTER CONFIG\n"));
        assert!(out.contains("local  dir   no      yes      iso, vztmpl, backup  /var/lib/vz"));
        assert!(out.contains("nas    nfs   yes     no       backup               10.0.0.5"));
    }

    #[tokio::test]
    async fn node_list_passes_filters() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api2/json/nodes/pve1/storage")
                    .query_param("enabled", "1")
                    .query_param("content", "images");
                then.status(200).json_body(json!({"data": [
                    {"storage": "local-lvm", "type": "lvmthin", "content": "images,rootdir",
                     "active": 1, "used": 25, "avail": 75, "total": 100}
                ]}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        let command = StorageCommands::List { active: true, content: Some("images".into()) };
        StorageCommand::new(&client, Some("pve1"))
            .execute(&mut buf, &table(), &command)
            .await
            .expect("list");

        mock.assert_async().await;
        let out = text(buf);
        assert!(out.contains("STORAGE — NODE: PVE1"));
        assert!(out.contains("active"));
        assert!(out.contains("25.0%"));
        assert!(out.contains("images, rootdir"));
    }

    #[tokio::test]
    async fn empty_list_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api2/json/storage");
                then.status(200).json_body(json!({"data": []}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        let command = StorageCommands::List { active: false, content: None };
        StorageCommand::new(&client, None)
            .execute(&mut buf, &table(), &command)
            .await
            .expect("list");
        assert_eq!(text(buf), "No storage pools found.\n");
    }

    #[tokio::test]
    async fn show_skips_empty_fields() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api2/json/storage/pbs");
                then.status(200).json_body(json!({"data": {
                    "storage": "pbs", "type": "pbs", "content": "backup",
                    "server": "10.0.0.9", "datastore": "main"
                }}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        let command = StorageCommands::Show { storage: "pbs".into() };
        StorageCommand::new(&client, None)
            .execute(&mut buf, &table(), &command)
            .await
            .expect("show");

        let out = text(buf);
        assert!(out.contains("STORAGE: PBS"));
        assert!(out.contains("Server     10.0.0.9"));
        assert!(out.contains("Datastore  main"));
        assert!(!out.contains("Path"));
        assert!(!out.contains("Usage"));
    }

    #[tokio::test]
    async fn show_with_node_reads_status() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api2/json/nodes/pve2/storage/local/status");
                then.status(200).json_body(json!({"data": {
                    "type": "dir", "content": "iso", "active": 1,
                    "used": 50, "avail": 150, "total": 200
                }}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        let command = StorageCommands::Show { storage: "local".into() };
        StorageCommand::new(&client, Some("pve2"))
            .execute(&mut buf, &table(), &command)
            .await
            .expect("show");

        mock.assert_async().await;
        let out = text(buf);
        assert!(out.contains("Usage    [█████░░░░░░░░░░░░░░░] 25.0%"));
    }

    #[tokio::test]
    async fn content_resolves_node_and_filters() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api2/json/nodes");
                then.status(200).json_body(json!({"data": [{"node": "pve1"}]}));
            })
            .await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api2/json/nodes/pve1/storage/local/content")
                    .query_param("content", "iso");
                then.status(200).json_body(json!({"data": [
                    {"volid": "local:iso/debian-12.iso", "content": "iso", "format": "iso",
                     "size": 1_048_576}
                ]}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        let command = StorageCommands::Content {
            storage: "local".into(),
            kind: Some("iso".into()),
            vmid: None,
        };
        StorageCommand::new(&client, None)
            .execute(&mut buf, &table(), &command)
            .await
            .expect("content");

        mock.assert_async().await;
        let out = text(buf);
        assert!(out.contains("CONTENT — LOCAL"));
        assert!(out.contains("local:iso/debian-12.iso  iso   iso     1.0 MB  —"));
    }

    #[tokio::test]
    async fn content_json_is_raw() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api2/json/nodes/pve1/storage/local/content");
                then.status(200).json_body(json!({"data": []}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        let command = StorageCommands::Content { storage: "local".into(), kind: None, vmid: None };
        StorageCommand::new(&client, Some("pve1"))
            .execute(&mut buf, &json_format(), &command)
            .await
            .expect("content");
        assert_eq!(text(buf).trim(), "[]");
    }
}
