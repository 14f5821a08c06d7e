use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("vectorization failed: {0}")]
    Vectorization(String),
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("completion failed: {0}")]
    Completion(String),
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
    #[error("malformed corpus: {0}")]
    Corpus(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("http error: {0}")]
    Http(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl RagError {
    pub fn vectorization<E: std::fmt::Display>(err: E) -> Self {
        RagError::Vectorization(err.to_string())
    }

    pub fn completion<E: std::fmt::Display>(err: E) -> Self {
        RagError::Completion(err.to_string())
    }

    pub fn http<E: std::fmt::Display>(err: E) -> Self {
        RagError::Http(err.to_string())
    }
}

impl IntoResponse for RagError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            RagError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RagError::Vectorization(_) | RagError::Completion(_) | RagError::Http(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
