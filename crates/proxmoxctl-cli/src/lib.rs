//! # proxmoxctl-cli
//!
//! Command-line client for the Proxmox VE REST API.
//!
//! Provides commands for:
//! - Cluster, node, resource and task status
//! - VM and container lifecycle, cloning and snapshots
//! - Backups, restores and scheduled backup jobs
//! - Storage pools, users and groups
//!
//! # Architecture
//!
//! Every command resolves its connection settings through
//! [`proxmoxctl_config::ConfigResolver`], builds an [`client::ApiClient`] and
//! talks to `<server>/api2/json` over HTTPS with an API token. Responses are
//! decoded into the typed records in [`resources`] and rendered by
//! [`output`], or printed raw in JSON mode.
//!
//! ```text
//! ┌────────────┐   PVEAPIToken / JSON   ┌──────────────────┐
//! │ proxmoxctl │◄──────────────────────►│  Proxmox VE API  │
//! └────────────┘      (HTTPS :8006)     └──────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod commands;
pub mod error;
pub mod format;
pub mod node;
pub mod output;
pub mod prompt;
pub mod resources;

pub use cli::{Cli, Commands, Format};
pub use client::ApiClient;
pub use error::{ApiError, CliError};
pub use output::OutputFormat;
