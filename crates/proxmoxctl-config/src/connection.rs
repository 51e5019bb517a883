//! The connection record shared by the resolver, the store and the client.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Key name of the friendly server label.
pub const KEY_SERVER_NAME: &str = "server_name";
/// Key name of the server base URL.
pub const KEY_SERVER_URL: &str = "server_url";
/// Key name of the API token.
pub const KEY_API_TOKEN: &str = "api_token";
/// Key name of the TLS verification toggle.
pub const KEY_TLS_INSECURE: &str = "tls_insecure";

/// Settings needed to talk to one Proxmox VE cluster.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Friendly label for the server.
    pub server_name: String,
    /// Base URL, e.g. `https://pve.local:8006`.
    pub server_url: String,
    /// API token in `USER@REALM!TOKENID=SECRET` form.
    pub api_token: String,
    /// Skip TLS certificate verification.
    pub tls_insecure: bool,
}

impl ConnectionConfig {
    /// Create a record from a base URL and token.
    #[must_use]
    pub fn new(server_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_token: api_token.into(),
            ..Self::default()
        }
    }

    /// Keys that must be set but are empty.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.server_url.trim().is_empty() {
            missing.push(KEY_SERVER_URL);
        }
        if self.api_token.trim().is_empty() {
            missing.push(KEY_API_TOKEN);
        }
        missing
    }

    /// Check that both the base URL and the token are present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConfigurationMissing`] naming every empty key.
    pub fn ensure_complete(&self) -> Result<(), ConfigError> {
        let keys = self.missing_keys();
        if keys.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ConfigurationMissing { keys })
        }
    }

    /// Token with its middle hidden, safe for display.
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.api_token.chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}****{tail}")
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server_name", &self.server_name)
            .field("server_url", &self.server_url)
            .field("api_token", &self.masked_token())
            .field("tls_insecure", &self.tls_insecure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn complete_config_passes() {
        let config = ConnectionConfig::new("https://pve.local:8006", "root@pam!cli=SECRET");
        assert!(config.ensure_complete().is_ok());
    }

    #[test]
    fn empty_url_is_missing() {
        let config = ConnectionConfig::new("", "root@pam!cli=SECRET");
        match config.ensure_complete() {
            Err(ConfigError::ConfigurationMissing { keys }) => {
                assert_eq!(keys, vec![KEY_SERVER_URL]);
            }
            other => panic!("expected ConfigurationMissing, got {other:?}"),
        }
    }

    #[test]
    fn whitespace_counts_as_missing() {
        let config = ConnectionConfig::new("  ", "\t");
        assert_eq!(config.missing_keys(), vec![KEY_SERVER_URL, KEY_API_TOKEN]);
    }

    #[test]
    fn masked_token_short() {
        let config = ConnectionConfig::new("https://x", "abc");
        assert_eq!(config.masked_token(), "****");
    }

    #[test]
    fn masked_token_long() {
        let config = ConnectionConfig::new("https://x", "root@pam!cli=SECRET");
        assert_eq!(config.masked_token(), "root****CRET");
    }

    #[test]
    fn debug_hides_token() {
        let config = ConnectionConfig::new("https://x", "root@pam!cli=TOPSECRET");
        let debug = format!("{config:?}");
        assert!(!debug.contains("TOPSECRET"));
        assert!(debug.contains("https://x"));
    }

    #[test]
    fn toml_round_trip_keeps_keys() {
        let config = ConnectionConfig {
            server_name: "lab".into(),
            server_url: "https://pve.local:8006".into(),
            api_token: "root@pam!cli=SECRET".into(),
            tls_insecure: true,
        };
        let text = toml::to_string(&config).expect("serialize");
        assert!(text.contains("server_url = \"https://pve.local:8006\""));
        assert!(text.contains("tls_insecure = true"));
        let back: ConnectionConfig = toml::from_str(&text).expect("parse");
        assert_eq!(back, config);
    }

    proptest! {
        #[test]
        fn masked_token_never_reveals_middle(token in "[a-zA-Z0-9@!=]{9,64}") {
            let config = ConnectionConfig::new("https://x", token.clone());
            let masked = config.masked_token();
            prop_assert_eq!(masked.chars().count(), 12);
            prop_assert!(masked.contains("****"));
            prop_assert!(token.starts_with(&masked[..4]));
        }
    }
}
