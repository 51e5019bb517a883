//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`status`] - Cluster, node, resource and task status
//! - [`vm`] - Virtual machine management
//! - [`lxc`] - Container management
//! - [`clone`] - VM and container cloning
//! - [`snapshot`] - Guest snapshots
//! - [`backup`] - Backups, restores and scheduled jobs
//! - [`storage`] - Storage pools and content
//! - [`user`] - User accounts
//! - [`group`] - User groups
//! - [`config`] - Connection settings

pub mod backup;
pub mod clone;
pub mod config;
pub mod group;
pub mod lxc;
pub mod snapshot;
pub mod status;
pub mod storage;
pub mod user;
pub mod vm;

mod guest;
mod jobs;

pub use backup::BackupCommand;
pub use clone::CloneCommand;
pub use config::ConfigCommand;
pub use group::GroupCommand;
pub use lxc::LxcCommand;
pub use snapshot::SnapshotCommand;
pub use status::StatusCommand;
pub use storage::StorageCommand;
pub use user::UserCommand;
pub use vm::VmCommand;

use crate::error::CliError;
use crate::prompt;

/// Ask before a destructive operation unless `force` is set.
fn confirmed(force: bool, question: &str) -> Result<bool, CliError> {
    if force {
        return Ok(true);
    }
    Ok(prompt::confirm(question)?)
}

/// UPID of a queued task, for the debug log.
fn upid(data: &serde_json::Value) -> &str {
    data.as_str().unwrap_or_default()
}
