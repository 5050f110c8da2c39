use pylon_model::{CreationPayload, DeploymentSpec, ValidatedRequest};
use serde::Serialize;

use crate::{deploy::build_deployment_spec, normalize::normalize};

/// Everything the creation service needs for one server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreationPlan {
    pub payload: CreationPayload,
    /// Present only for auto-deployed requests.
    pub deployment: Option<DeploymentSpec>,
}

impl CreationPlan {
    pub fn from_request(request: &ValidatedRequest) -> Self {
        Self {
            payload: normalize(request),
            deployment: build_deployment_spec(request),
        }
    }

    pub fn into_parts(self) -> (CreationPayload, Option<DeploymentSpec>) {
        (self.payload, self.deployment)
    }
}

impl From<&ValidatedRequest> for CreationPlan {
    fn from(request: &ValidatedRequest) -> Self {
        Self::from_request(request)
    }
}
