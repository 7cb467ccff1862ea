use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
