// Error taxonomy shared by the proxy core and the HTTP surface

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Every failure a request can surface. No variant is retried internally;
/// each maps to exactly one HTTP status at the boundary. Raw API keys must
/// never be embedded in these messages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or inconsistent provider fields supplied by the caller.
    #[error("{0}")]
    Config(String),

    /// Stored ciphertext could not be decrypted.
    #[error("{0}")]
    Decryption(String),

    /// The credential database failed or is unreachable.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The upstream provider call failed, whatever the cause.
    #[error("LLM API error: {0}")]
    Upstream(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Config(_) => StatusCode::BAD_REQUEST,
            Error::Decryption(_) | Error::Storage(_) | Error::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "invalid_request_error",
            Error::Decryption(_) => "decryption_error",
            Error::Storage(_) => "storage_error",
            Error::Upstream(_) => "api_error",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {}", self);
        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}
