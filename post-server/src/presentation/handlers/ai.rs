use crate::application::generation::GenerationService;
use crate::application::post_service::PostService;
use crate::data::post_repository::JsonPostRepository;
use crate::domain::error::DomainError;
use crate::presentation::dto::{GenerateRequest, GenerateResponse};
use crate::presentation::utils::{AuthenticatedUser, request_id};
use actix_web::{HttpRequest, HttpResponse, Scope, get, post, put, web};
use serde_json::{Map, Value};
use tracing::info;

pub fn scope() -> Scope {
    web::scope("/ai")
        .service(generate)
        .service(get_config)
        .service(update_config)
}

#[post("/generate")]
pub async fn generate(
    req: HttpRequest,
    generator: web::Data<GenerationService>,
    posts: web::Data<PostService<JsonPostRepository>>,
    payload: web::Json<GenerateRequest>,
) -> Result<HttpResponse, DomainError> {
    let GenerateRequest { request, save } = payload.into_inner();
    if request.topic.trim().is_empty() {
        return Err(DomainError::Validation("topic is required".into()));
    }

    let generated = generator.generate(request).await;
    let post = if save {
        Some(posts.promote(generated.clone()).await?)
    } else {
        None
    };

    info!(
        request_id = %request_id(&req),
        errors = generated.errors().len(),
        saved = post.is_some(),
        "post generated"
    );

    Ok(HttpResponse::Ok().json(GenerateResponse { generated, post }))
}

#[get("/config")]
pub async fn get_config(
    _user: AuthenticatedUser,
    generator: web::Data<GenerationService>,
) -> HttpResponse {
    let config = generator.config_store().load().await;
    HttpResponse::Ok().json(config.masked())
}

/// Applies the supplied keys to the stored config. Masked or blank API keys
/// leave the stored secrets as they are.
#[put("/config")]
pub async fn update_config(
    user: AuthenticatedUser,
    generator: web::Data<GenerationService>,
    payload: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, DomainError> {
    let store = generator.config_store();
    let current = store.load().await;
    let updated = current
        .updated(payload.into_inner())
        .map_err(|err| DomainError::Validation(err.to_string()))?;
    store.save(&updated).await?;

    info!(user_id = user.id, model = %updated.default_model, "ai config updated");
    Ok(HttpResponse::Ok().json(updated.masked()))
}
