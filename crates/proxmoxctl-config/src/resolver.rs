//! Layered resolution of the connection settings.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::connection::{
    ConnectionConfig, KEY_API_TOKEN, KEY_SERVER_NAME, KEY_SERVER_URL, KEY_TLS_INSECURE,
};
use crate::error::ConfigError;
use crate::store::{self, FileLayer};

/// Prefix shared by every environment variable the resolver reads.
pub const ENV_PREFIX: &str = "PROXMOX_";

/// Overrides taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Alternate config file location.
    pub config_path: Option<PathBuf>,
    /// Force TLS verification off.
    pub tls_insecure: bool,
}

/// Resolves a [`ConnectionConfig`] from overrides, environment and file.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    path: Option<PathBuf>,
    env: BTreeMap<String, String>,
    force_insecure: bool,
}

impl ConfigResolver {
    /// Resolver for the running process: reads `PROXMOX_*` from the process
    /// environment and the file selected by `overrides` (or the default path).
    pub fn from_process(overrides: &Overrides) -> Self {
        let path = overrides
            .config_path
            .clone()
            .or_else(|| store::default_config_path().ok());
        let env = std::env::vars().filter(|(key, _)| key.starts_with(ENV_PREFIX));

        Self::new(path)
            .with_env(env)
            .insecure(overrides.tls_insecure)
    }

    /// Resolver over an explicit file and an empty environment.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    /// Replace the environment snapshot.
    #[must_use]
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Force `tls_insecure` on regardless of the other layers.
    #[must_use]
    pub fn insecure(mut self, force: bool) -> Self {
        self.force_insecure = force;
        self
    }

    /// Config file consulted by [`resolve`](Self::resolve), if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Merge every layer without checking completeness.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or parsed, or when a
    /// boolean environment variable holds an unrecognised value.
    pub fn resolve(&self) -> Result<ConnectionConfig, ConfigError> {
        let file = match &self.path {
            Some(path) => store::read(path)?,
            None => None,
        }
        .unwrap_or_default();

        let FileLayer {
            server_name,
            server_url,
            api_token,
            tls_insecure,
        } = file;
        let mut config = ConnectionConfig {
            server_name: server_name.unwrap_or_default(),
            server_url: server_url.unwrap_or_default(),
            api_token: api_token.unwrap_or_default(),
            tls_insecure: tls_insecure.unwrap_or(false),
        };

        if let Some(value) = self.env_value(KEY_SERVER_NAME) {
            config.server_name = value.to_string();
        }
        if let Some(value) = self.env_value(KEY_SERVER_URL) {
            config.server_url = value.to_string();
        }
        if let Some(value) = self.env_value(KEY_API_TOKEN) {
            config.api_token = value.to_string();
        }
        if let Some(value) = self.env_value(KEY_TLS_INSECURE) {
            config.tls_insecure = parse_bool(&env_name(KEY_TLS_INSECURE), value)?;
        }
        if self.force_insecure {
            config.tls_insecure = true;
        }

        debug!(
            server_url = %config.server_url,
            tls_insecure = config.tls_insecure,
            "resolved connection config"
        );
        Ok(config)
    }

    /// Resolve and require `server_url` and `api_token`.
    ///
    /// # Errors
    ///
    /// Everything [`resolve`](Self::resolve) returns, plus
    /// [`ConfigError::ConfigurationMissing`].
    pub fn load(&self) -> Result<ConnectionConfig, ConfigError> {
        let config = self.resolve()?;
        config.ensure_complete()?;
        Ok(config)
    }

    /// Persist `config` at this resolver's path.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoConfigDir`] when no path is known, otherwise what
    /// [`store::save`] returns.
    pub fn save(&self, config: &ConnectionConfig) -> Result<PathBuf, ConfigError> {
        let path = self.path.as_deref().ok_or(ConfigError::NoConfigDir)?;
        store::save(config, path)?;
        Ok(path.to_path_buf())
    }

    fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .get(&env_name(key))
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

fn env_name(key: &str) -> String {
    format!("{ENV_PREFIX}{}", key.to_ascii_uppercase())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
