use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pylon_core::ValidationError;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::provision::ProvisioningError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Provisioning(ProvisioningError::NoViableAllocation(_)) => {
                StatusCode::CONFLICT
            }
            ApiError::Provisioning(ProvisioningError::Backend(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => {
                debug!(fields = errors.len(), "rejecting invalid request");
                json!({ "errors": errors })
            }
            other => {
                if status.is_server_error() {
                    error!(error = %other, "request failed");
                }
                json!({ "error": other.to_string() })
            }
        };
        (status, Json(body)).into_response()
    }
}
