//! HTTP client for the post server API.

mod error;
mod http_client;
pub mod model;

pub use error::PostClientError;
pub use http_client::{DEFAULT_TOKEN_FILE, PostClientHttp};
pub use model::{GenerateResponse, Post, PostChanges, PostPage, PostStats, User};
