//! Default node selection for node-scoped commands.

use serde_json::Value;
use tracing::info;

use crate::client::ApiClient;
use crate::error::ApiError;

/// First node reported by `GET /nodes`, in server order.
///
/// Prints `Using node: <name>` to stderr so the choice is visible. The
/// result is not cached; every call queries the cluster again.
///
/// # Errors
///
/// [`ApiError::NoNodesFound`] for an empty list, [`ApiError::NodeNameMissing`]
/// when the first entry has no `node` string, and any request error.
pub async fn default_node(client: &ApiClient) -> Result<String, ApiError> {
    let nodes: Option<Vec<Value>> = client.get("/nodes").await?;
    let nodes = nodes.unwrap_or_default();
    let first = nodes.first().ok_or(ApiError::NoNodesFound)?;

    let name = first
        .get("node")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or(ApiError::NodeNameMissing)?;

    info!(node = name, "no --node given, using first cluster node");
    eprintln!("Using node: {name}");
    Ok(name.to_string())
}

/// The explicit node when given, otherwise [`default_node`].
///
/// # Errors
///
/// See [`default_node`].
pub async fn resolve_node(client: &ApiClient, explicit: Option<&str>) -> Result<String, ApiError> {
    match explicit {
        Some(node) if !node.is_empty() => Ok(node.to_string()),
        _ => default_node(client).await,
    }
}
