use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpMessage, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::application::auth_service::AuthService;
use crate::data::user_repository::InMemoryUserRepository;
use crate::domain::error::DomainError;
use crate::presentation::middleware::RequestId;

/// The caller behind a valid `Authorization: Bearer <jwt>` header. Taking
/// it as a handler argument is what makes a route require a token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: u64,
    pub username: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = DomainError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let auth = req
            .app_data::<web::Data<AuthService<InMemoryUserRepository>>>()
            .cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let auth =
                auth.ok_or_else(|| DomainError::Internal("auth service not registered".into()))?;
            let token = token.ok_or(DomainError::Unauthorized)?;

            let user = auth.authenticate(&token).await?;
            debug!(user_id = user.id, "token accepted");
            Ok(AuthenticatedUser {
                id: user.id,
                username: user.username,
            })
        })
    }
}

pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc.def"));

        let basic = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic Zm9vOmJhcg=="))
            .to_http_request();
        assert!(bearer_token(&basic).is_none());

        let empty = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer  "))
            .to_http_request();
        assert!(bearer_token(&empty).is_none());
    }
}
