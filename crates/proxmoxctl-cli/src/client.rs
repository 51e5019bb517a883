//! HTTP client for the Proxmox VE REST API.
//!
//! Every call goes to `<server_url>/api2/json<path>` with an
//! `Authorization: PVEAPIToken=<token>` header. Successful responses carry a
//! `{"data": ...}` envelope which is unwrapped before the value is returned.
//!
//! # Example
//!
//! ```rust,no_run
//! use proxmoxctl_cli::client::ApiClient;
//! use proxmoxctl_config::ConnectionConfig;
//! use serde_json::Value;
//!
//! # async fn example() -> Result<(), proxmoxctl_cli::ApiError> {
//! let config = ConnectionConfig::new("https://pve.local:8006", "root@pam!cli=SECRET");
//! let client = ApiClient::new(&config)?;
//! let nodes: Vec<Value> = client.get("/nodes").await?;
//! println!("{} node(s)", nodes.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use proxmoxctl_config::ConnectionConfig;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::ApiError;

/// Path prefix of the JSON API.
pub const API_PREFIX: &str = "/api2/json";

/// Timeout applied to every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Authenticated client bound to one server.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(serde::Deserialize)]
struct Envelope<T> {
    data: T,
}

impl ApiClient {
    /// Build a client from resolved connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ConfigurationMissing`] when the base URL or token
    /// is empty, or [`ApiError::Transport`] if the HTTP client cannot be
    /// built.
    pub fn new(config: &ConnectionConfig) -> Result<Self, ApiError> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    pub(crate) fn with_timeout(
        config: &ConnectionConfig,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let keys = config.missing_keys();
        if !keys.is_empty() {
            return Err(ApiError::ConfigurationMissing { keys });
        }

        if config.tls_insecure {
            warn!("TLS certificate verification is disabled");
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(config.tls_insecure)
            .build()?;

        Ok(Self {
            http,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
            timeout,
        })
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.base_url)
    }

    /// `GET path`, returning the unwrapped `data` value.
    ///
    /// # Errors
    ///
    /// Transport failures, timeouts, non-2xx statuses and decode failures.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.send(Method::GET, path, None).await?;
        decode(&body)
    }

    /// `POST path` with an optional JSON body.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get), plus [`ApiError::Encode`].
    pub async fn post<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        let response = self.send(Method::POST, path, body).await?;
        decode(&response)
    }

    /// `PUT path` with an optional JSON body.
    ///
    /// # Errors
    ///
    /// As [`post`](Self::post).
    pub async fn put<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        let response = self.send(Method::PUT, path, body).await?;
        decode(&response)
    }

    /// `DELETE path`. The response body is not decoded.
    ///
    /// # Errors
    ///
    /// Transport failures, timeouts and non-2xx statuses.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// `POST` without a body, for actions that take no parameters.
    ///
    /// # Errors
    ///
    /// As [`post`](Self::post).
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.post::<T, Value>(path, None).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.url(path);
        debug!(%method, %url, "sending request");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(AUTHORIZATION, format!("PVEAPIToken={}", self.token))
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        debug!(%method, %url, status = status.as_u16(), "received response");
        trace!(len = bytes.len(), "response body");

        if !status.is_success() {
            return Err(ApiError::Api {
                status: status.as_u16(),
                body: bytes.to_vec(),
            });
        }
        Ok(bytes.to_vec())
    }

    fn classify(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            ApiError::Transport(err)
        }
    }
}

fn encode<B: Serialize + ?Sized>(body: Option<&B>) -> Result<Option<Vec<u8>>, ApiError> {
    body.map(serde_json::to_vec)
        .transpose()
        .map_err(ApiError::Encode)
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice::<Envelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(ApiError::Decode)
}
