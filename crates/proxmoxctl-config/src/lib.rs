//! # proxmoxctl-config
//!
//! Connection settings for `proxmoxctl`.
//!
//! Settings are resolved from three layers, highest priority first:
//!
//! 1. explicit overrides from the command line (`--config <path>` picks the
//!    file, `--insecure` forces TLS verification off)
//! 2. `PROXMOX_*` environment variables
//! 3. the persisted TOML file (`<config dir>/proxmoxctl/config.toml`)
//!
//! ```text
//! ┌───────────┐   ┌─────────────┐   ┌────────────┐
//! │ overrides │ > │ PROXMOX_*   │ > │ config.toml│ ──► ConnectionConfig
//! └───────────┘   └─────────────┘   └────────────┘
//! ```
//!
//! The resolved [`ConnectionConfig`] is a plain value; nothing here keeps
//! process-wide state.

#![forbid(unsafe_code)]

pub mod connection;
pub mod error;
pub mod resolver;
pub mod store;

pub use connection::ConnectionConfig;
pub use error::ConfigError;
pub use resolver::{ConfigResolver, ENV_PREFIX, Overrides};
pub use store::{default_config_path, save};
