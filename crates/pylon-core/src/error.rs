use pylon_model::ResourceKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("resource kind is not registered in the rule catalog: {0:?}")]
    UnknownResource(ResourceKind),

    #[error("rule catalog has no constraint for field: {0}")]
    MissingRule(&'static str),
}

pub type CoreResult<T> = Result<T, CoreError>;
