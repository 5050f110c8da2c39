use async_trait::async_trait;
use pylon_model::{CreationPayload, DeploymentSpec, ServerId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// The scheduler found no allocation matching the deployment constraints.
    #[error("no viable allocation: {0}")]
    NoViableAllocation(String),

    #[error("provisioning backend failed: {0}")]
    Backend(String),
}

/// Server creation service receiving validated, normalized input.
///
/// `deployment` is `Some` exactly when the scheduler must pick the node and
/// allocation; otherwise `payload.allocation_id` names the allocation.
#[async_trait]
pub trait ServerProvisioner: Send + Sync + 'static {
    async fn create_server(
        &self,
        payload: CreationPayload,
        deployment: Option<DeploymentSpec>,
    ) -> Result<ServerId, ProvisioningError>;
}
