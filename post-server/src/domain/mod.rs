pub mod error;
pub mod generation;
pub mod post;
pub mod user;
