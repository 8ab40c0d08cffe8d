use thiserror::Error;

/// Errors raised while decoding inbound bus payloads.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
