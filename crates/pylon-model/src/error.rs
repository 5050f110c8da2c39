use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid port range: {0}")]
    InvalidPortRange(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
