use async_trait::async_trait;
use pylon_core::CreationPlan;
use pylon_model::{DeploymentSpec, NodeId, ServerId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Result of a successful creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCreated {
    pub server_id: ServerId,
    /// Constraints the scheduler deployed with, if any.
    pub deployment: Option<DeploymentSpec>,
}

/// Server creation API handler.
///
/// This trait abstracts the backend implementation, allowing users to:
/// - Use the provided `PanelAdapter`
/// - Implement custom handlers with additional logic (auth, rate limiting, etc.)
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Validate `body` and create a server on `node`.
    async fn create_server(&self, node: NodeId, body: Value) -> Result<ServerCreated, ApiError>;

    /// Validate `body` and return the plan that creation would use, without creating anything.
    async fn plan_server(&self, node: NodeId, body: Value) -> Result<CreationPlan, ApiError>;
}
