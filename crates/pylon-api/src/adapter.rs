use std::sync::Arc;

use async_trait::async_trait;
use pylon_core::{CreationPlan, ReferentialChecker, RequestValidator};
use pylon_model::NodeId;
use serde_json::Value;
use tracing::{Span, info};

use crate::{
    error::ApiError,
    handler::{ApiHandler, ServerCreated},
    provision::ServerProvisioner,
};

/// Adapter that bridges a record store and a provisioner to `ApiHandler`.
///
/// Validation runs on the blocking pool because referential lookups may block.
pub struct PanelAdapter<R, P> {
    validator: Arc<RequestValidator>,
    refs: Arc<R>,
    provisioner: Arc<P>,
}

impl<R, P> PanelAdapter<R, P>
where
    R: ReferentialChecker + Send + Sync + 'static,
    P: ServerProvisioner,
{
    pub fn new(validator: RequestValidator, refs: Arc<R>, provisioner: Arc<P>) -> Self {
        Self {
            validator: Arc::new(validator),
            refs,
            provisioner,
        }
    }

    async fn plan(&self, node: NodeId, body: Value) -> Result<CreationPlan, ApiError> {
        let validator = Arc::clone(&self.validator);
        let refs = Arc::clone(&self.refs);
        let span = Span::current();

        let request = tokio::task::spawn_blocking(move || {
            span.in_scope(|| validator.validate(&body, node, refs.as_ref()))
        })
        .await
        .map_err(|e| ApiError::Internal(format!("validation task failed: {e}")))??;

        Ok(CreationPlan::from_request(&request))
    }
}

#[async_trait]
impl<R, P> ApiHandler for PanelAdapter<R, P>
where
    R: ReferentialChecker + Send + Sync + 'static,
    P: ServerProvisioner,
{
    async fn create_server(&self, node: NodeId, body: Value) -> Result<ServerCreated, ApiError> {
        let (payload, deployment) = self.plan(node, body).await?.into_parts();
        let strategy = if deployment.is_some() { "auto_deploy" } else { "explicit" };

        let server_id = self
            .provisioner
            .create_server(payload, deployment.clone())
            .await?;

        info!(server = %server_id, %node, strategy, "server created");
        Ok(ServerCreated {
            server_id,
            deployment,
        })
    }

    async fn plan_server(&self, node: NodeId, body: Value) -> Result<CreationPlan, ApiError> {
        self.plan(node, body).await
    }
}
