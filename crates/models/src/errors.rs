use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// A record could not be encoded, or a stored value could not be decoded.
    #[error("codec error: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self { Self::Codec(e.to_string()) }
}
