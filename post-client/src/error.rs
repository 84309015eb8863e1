use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostClientError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },
    #[error("Token storage error: {0}")]
    TokenStorage(#[from] std::io::Error),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl PostClientError {
    pub async fn from_http_response(resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        match resp.text().await {
            Ok(body) => Self::from_status(status, &body),
            Err(err) => Self::RequestError(err),
        }
    }

    /// Maps a non-success status and its body onto a variant.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| body.trim().to_string());
        match status {
            401 => Self::Unauthorized,
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            400 | 422 => Self::InvalidRequest(message),
            _ => Self::ServerError { status, message },
        }
    }
}
