pub mod post_repository;
pub mod seed;
pub mod user_repository;
