//! Config command implementation.
//!
//! Reads and writes the connection settings file. Needs no API client.

use std::io::{self, Write};
use std::path::Path;

use proxmoxctl_config::{ConfigResolver, ConnectionConfig};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::ConfigCommands;
use crate::error::CliError;
use crate::output::{Message, OutputFormat, TableDisplay};
use crate::prompt;

/// Values given on the command line for `config set`.
#[derive(Debug, Default)]
struct Given<'a> {
    server_name: Option<&'a str>,
    server_url: Option<&'a str>,
    api_token: Option<&'a str>,
    tls_insecure: bool,
}

/// Resolved settings as shown by `config show`, token masked.
#[derive(Debug, Serialize)]
struct ConfigView {
    server_name: String,
    server_url: String,
    api_token: String,
    tls_insecure: bool,
}

impl From<&ConnectionConfig> for ConfigView {
    fn from(config: &ConnectionConfig) -> Self {
        Self {
            server_name: config.server_name.clone(),
            server_url: config.server_url.clone(),
            api_token: config.masked_token(),
            tls_insecure: config.tls_insecure,
        }
    }
}

impl TableDisplay for ConfigView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Server Name : {}", self.server_name)?;
        writeln!(writer, "Server URL  : {}", self.server_url)?;
        writeln!(writer, "API Token   : {}", self.api_token)?;
        if self.tls_insecure {
            writeln!(writer, "TLS Verify  : disabled")?;
        }
        Ok(())
    }
}

/// Config command executor.
pub struct ConfigCommand<'a> {
    resolver: &'a ConfigResolver,
}

impl<'a> ConfigCommand<'a> {
    /// Create a new config command.
    #[must_use]
    pub const fn new(resolver: &'a ConfigResolver) -> Self {
        Self { resolver }
    }

    /// Execute a config subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be read, prompted for or saved,
    /// or if `show` finds no server configured.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &ConfigCommands,
    ) -> Result<(), CliError> {
        match command {
            ConfigCommands::Set {
                server_name,
                server_url,
                api_token,
                tls_insecure,
            } => {
                let given = Given {
                    server_name: server_name.as_deref(),
                    server_url: server_url.as_deref(),
                    api_token: api_token.as_deref(),
                    tls_insecure: *tls_insecure,
                };
                self.set(writer, format, &given)
            }
            ConfigCommands::Show => self.show(writer, format),
        }
    }

    fn set<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        given: &Given<'_>,
    ) -> Result<(), CliError> {
        let current = self.saved();
        let config = ConnectionConfig {
            server_name: match given.server_name {
                Some(name) => name.to_string(),
                None => ask("Server name (friendly label)", &current.server_name)?,
            },
            server_url: match given.server_url {
                Some(url) => url.to_string(),
                None => ask("Server URL (e.g. https://192.168.1.10:8006)", &current.server_url)?,
            },
            api_token: match given.api_token {
                Some(token) => token.to_string(),
                None => {
                    let token = prompt::secret("API Token (USER@REALM!TOKENID=SECRET): ")?;
                    if token.is_empty() {
                        current.api_token.clone()
                    } else {
                        token
                    }
                }
            },
            tls_insecure: given.tls_insecure || current.tls_insecure,
        };

        let path = self.resolver.save(&config)?;
        info!(path = %path.display(), "connection settings saved");
        let msg = Message::success(format!("config saved to {}", path.display()));
        format.write(writer, &msg)
    }

    fn show<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let config = self.resolver.resolve()?;
        if config.server_url.trim().is_empty() {
            return Err(CliError::NotConfigured);
        }
        format.write(writer, &ConfigView::from(&config))
    }

    /// Settings currently in the file, ignoring the environment so that
    /// `set` never persists values that only came from `PROXMOX_*`.
    fn saved(&self) -> ConnectionConfig {
        let file_only = ConfigResolver::new(self.resolver.path().map(Path::to_path_buf));
        file_only.resolve().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable config file");
            ConnectionConfig::default()
        })
    }
}

/// Prompt for a value, keeping `current` when the answer is empty.
fn ask(label: &str, current: &str) -> io::Result<String> {
    let label = if current.is_empty() {
        format!("{label}: ")
    } else {
        format!("{label} [{current}]: ")
    };
    let answer = prompt::line(&label)?;
    Ok(if answer.is_empty() {
        current.to_string()
    } else {
        answer
    })
}
