use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Request, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
};
use pylon_model::NodeId;
use serde_json::Value;
use tracing::{Instrument, info_span};
use uuid::Uuid;

use crate::{error::ApiError, handler::ApiHandler};

const X_REQUEST_ID: &str = "x-request-id";

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    /// Create new HTTP API with the given handler.
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - POST /api/v1/nodes/{node_id}/servers - Create server
    /// - POST /api/v1/nodes/{node_id}/servers/validate - Validate and return the creation plan
    pub fn router(self) -> Router {
        Router::new()
            .route("/api/v1/nodes/{node_id}/servers", post(create_server::<H>))
            .route(
                "/api/v1/nodes/{node_id}/servers/validate",
                post(plan_server::<H>),
            )
            .with_state(self.handler)
            .layer(middleware::from_fn(with_request_id))
    }
}

/// The request body must be a JSON object.
fn object_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    let Json(value) = body.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    if !value.is_object() {
        return Err(ApiError::InvalidRequest(
            "request body must be a JSON object".into(),
        ));
    }
    Ok(value)
}

/// POST /api/v1/nodes/{node_id}/servers
async fn create_server<H>(
    State(handler): State<Arc<H>>,
    Path(node): Path<NodeId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let body = object_body(body)?;
    let created = handler.create_server(node, body).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/v1/nodes/{node_id}/servers/validate
async fn plan_server<H>(
    State(handler): State<Arc<H>>,
    Path(node): Path<NodeId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let body = object_body(body)?;
    let plan = handler.plan_server(node, body).await?;

    Ok(Json(plan))
}

/// Runs every request in a span carrying its correlation id.
///
/// The id is taken from `x-request-id` when the caller sent one and echoed back.
async fn with_request_id(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = info_span!(
        "request",
        %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}
