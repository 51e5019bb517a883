//! Configuration error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving or persisting connection settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required settings resolved empty.
    #[error(
        "missing required config keys: {} (run `proxmoxctl config set` to configure)",
        .keys.join(", ")
    )]
    ConfigurationMissing {
        /// Names of the keys that are empty.
        keys: Vec<&'static str>,
    },

    /// No per-user configuration directory exists on this platform.
    #[error("could not determine the user configuration directory")]
    NoConfigDir,

    /// Reading or writing the config file failed.
    #[error("config file '{}': {source}", .path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The config file is not valid TOML for a connection record.
    #[error("invalid config file '{}': {source}", .path.display())]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// The record could not be serialized.
    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// An override carried a value that does not fit the key.
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue {
        /// Key (environment variable) name.
        key: String,
        /// Offending value.
        value: String,
    },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_lists_keys() {
        let err = ConfigError::ConfigurationMissing {
            keys: vec!["server_url", "api_token"],
        };
        let msg = err.to_string();
        assert!(msg.contains("server_url, api_token"));
        assert!(msg.contains("proxmoxctl config set"));
    }

    #[test]
    fn io_error_names_path() {
        let err = ConfigError::io(
            "/tmp/x/config.toml",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "config file '/tmp/x/config.toml': denied");
    }
}
