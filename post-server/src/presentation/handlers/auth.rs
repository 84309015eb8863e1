use crate::application::auth_service::AuthService;
use crate::data::user_repository::InMemoryUserRepository;
use crate::domain::error::DomainError;
use crate::infrastructure::security::TOKEN_TTL_SECS;
use crate::presentation::dto::{AuthResponse, LoginRequest, RegisterRequest, UserSummary};
use crate::presentation::utils::AuthenticatedUser;
use actix_web::{HttpResponse, Responder, Scope, delete, get, post, web};
use serde_json::json;
use tracing::info;

pub fn scope() -> Scope {
    web::scope("/auth")
        .service(register)
        .service(login)
        .service(logout)
}

#[post("/register")]
pub async fn register(
    service: web::Data<AuthService<InMemoryUserRepository>>,
    payload: web::Json<RegisterRequest>,
) -> Result<impl Responder, DomainError> {
    let payload = payload.into_inner();
    let user = service
        .register(
            payload.username,
            payload.email,
            payload.password,
            payload.confirm_password,
        )
        .await?;

    info!(user_id = user.id, email = %user.email, "user registered");

    Ok(HttpResponse::Created().json(UserSummary::from(user)))
}

#[post("/login")]
pub async fn login(
    service: web::Data<AuthService<InMemoryUserRepository>>,
    payload: web::Json<LoginRequest>,
) -> Result<impl Responder, DomainError> {
    let (jwt, user) = service.login(&payload.email, &payload.password).await?;

    info!(email = %user.email, "user logged in");

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: jwt,
        expires_in: TOKEN_TTL_SECS,
        token_type: "Bearer".to_string(),
        user: user.into(),
    }))
}

/// Tokens are stateless; the client just drops its copy.
#[delete("/logout")]
pub async fn logout() -> impl Responder {
    HttpResponse::Ok().json(json!({ "success": true }))
}

#[get("/users/profile")]
pub async fn profile(
    user: AuthenticatedUser,
    service: web::Data<AuthService<InMemoryUserRepository>>,
) -> Result<impl Responder, DomainError> {
    let user = service.get_user(user.id).await?;
    Ok(HttpResponse::Ok().json(UserSummary::from(user)))
}
