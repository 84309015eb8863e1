pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod utils;

use actix_web::web;

/// Registers every `/api` route. Services must already be in app data.
/// Routes taking an `AuthenticatedUser` answer 401 without a valid token.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(handlers::health::health)
            .service(handlers::auth::scope())
            .service(handlers::ai::scope())
            .service(handlers::auth::profile)
            .service(handlers::post::get_posts)
            .service(handlers::post::get_stats)
            .service(handlers::post::get_post)
            .service(handlers::post::create_post)
            .service(handlers::post::update_post)
            .service(handlers::post::delete_post)
            .service(handlers::post::publish_post),
    );
}
