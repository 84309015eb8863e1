pub mod auth_service;
pub mod generation;
pub mod post_service;
