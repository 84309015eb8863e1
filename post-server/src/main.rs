use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpServer, web};
use tracing::info;

use post_server::application::auth_service::AuthService;
use post_server::application::generation::GenerationService;
use post_server::application::post_service::PostService;
use post_server::data::post_repository::JsonPostRepository;
use post_server::data::seed::{demo_posts, demo_users};
use post_server::data::user_repository::InMemoryUserRepository;
use post_server::infrastructure::ai_config::AiConfigStore;
use post_server::infrastructure::config::AppConfig;
use post_server::infrastructure::logging::init_logging;
use post_server::infrastructure::security::JwtKeys;
use post_server::presentation;
use post_server::presentation::middleware::RequestContext;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;

    let user_repo = Arc::new(InMemoryUserRepository::new());
    let post_repo = Arc::new(JsonPostRepository::new(config.posts_file()));

    let auth_service = AuthService::new(
        Arc::clone(&user_repo),
        JwtKeys::new(config.jwt_secret.clone()),
    );
    let post_service = PostService::new(Arc::clone(&post_repo));
    let generation_service = GenerationService::new(
        AiConfigStore::new(config.ai_config_file()),
        config.images_dir(),
    );

    // Creates the config document with defaults on first start.
    generation_service.config_store().load().await;

    if config.seed_demo_data {
        auth_service.seed(demo_users()).await?;
        let seeded = post_service.seed_if_empty(demo_posts()).await?;
        info!(seeded, "demo posts checked");
    }

    info!(
        host = %config.host,
        port = config.port,
        data_dir = %config.data_dir.display(),
        "starting post server"
    );

    let config_data = config.clone();

    HttpServer::new(move || {
        let cors = build_cors(&config_data);
        App::new()
            .wrap(Logger::default())
            .wrap(RequestContext)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(cors)
            .app_data(web::Data::new(post_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(generation_service.clone()))
            .configure(presentation::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
        ])
        .max_age(3600);

    if config.cors_origins.iter().any(|origin| origin == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in &config.cors_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}
