//! CLI error types.

use std::borrow::Cow;
use std::fmt;

use proxmoxctl_config::ConfigError;
use thiserror::Error;

/// Errors from talking to the Proxmox VE API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The connection settings lack a base URL or token.
    #[error(
        "missing required config keys: {} (run `proxmoxctl config set` to configure)",
        .keys.join(", ")
    )]
    ConfigurationMissing {
        /// Names of the empty keys.
        keys: Vec<&'static str>,
    },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// No response within the client timeout.
    #[error("request timed out after {secs}s")]
    Timeout {
        /// Timeout that elapsed, in seconds.
        secs: u64,
    },

    /// The server answered with a non-2xx status.
    #[error("{}", api_fault(.status, .body))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body exactly as received.
        body: Vec<u8>,
    },

    /// The request body could not be serialized.
    #[error("could not encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response did not match the expected shape.
    #[error("could not decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// `GET /nodes` returned an empty list.
    #[error("no nodes found in cluster (pass --node explicitly)")]
    NoNodesFound,

    /// The first node entry has no usable name.
    #[error("could not parse node name from /nodes response (pass --node explicitly)")]
    NodeNameMissing,
}

impl ApiError {
    /// HTTP status for [`ApiError::Api`], `None` otherwise.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Body of an [`ApiError::Api`] as text, invalid UTF-8 replaced.
    #[must_use]
    pub fn body_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Api { body, .. } => Some(String::from_utf8_lossy(body)),
            _ => None,
        }
    }
}

fn api_fault(status: impl fmt::Display, body: &[u8]) -> String {
    if body.is_empty() {
        format!("API error {status}")
    } else {
        format!("API error {status}: {}", String::from_utf8_lossy(body))
    }
}

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// API request failed.
    Api(ApiError),
    /// Connection settings could not be resolved or saved.
    Config(ConfigError),
    /// Output formatting error.
    Format(String),
    /// Invalid argument.
    InvalidArgument(String),
    /// No server has been configured yet.
    NotConfigured,
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "{e}"),
            Self::Config(e) => write!(f, "{e}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::NotConfigured => write!(
                f,
                "no configuration found. Run `proxmoxctl config set` to get started"
            ),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Format(_) | Self::InvalidArgument(_) | Self::NotConfigured => None,
        }
    }
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
