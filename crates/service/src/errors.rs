use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("store connection failed: {0}")]
    Connection(String),
    #[error("store operation failed: {0}")]
    Operation(String),
    #[error("store client is not connected")]
    NotConnected,
    #[error("store not ready after {attempts} attempts: {last_error}")]
    Unavailable { attempts: u32, last_error: String },
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}
