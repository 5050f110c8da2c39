//! HTTP surface of the server creation flow.
//!
//! [`HttpApi`] mounts the routes, [`ApiHandler`] abstracts the backend and
//! [`PanelAdapter`] is the ready implementation: it validates on the blocking pool,
//! builds the creation plan and hands it to a [`ServerProvisioner`].
mod adapter;
mod error;
mod handler;
mod http;
mod provision;

pub use adapter::PanelAdapter;
pub use error::ApiError;
pub use handler::{ApiHandler, ServerCreated};
pub use http::HttpApi;
pub use provision::{ProvisioningError, ServerProvisioner};
