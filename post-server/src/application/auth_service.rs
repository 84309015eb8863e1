use std::sync::Arc;

use tracing::{info, instrument};

use crate::data::seed::SeedUser;
use crate::data::user_repository::UserRepository;
use crate::domain::{error::DomainError, user::User};
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

pub struct AuthService<R: UserRepository + 'static> {
    repo: Arc<R>,
    keys: JwtKeys,
}

// Shares the repository; `R` itself need not be `Clone`.
impl<R: UserRepository + 'static> Clone for AuthService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            keys: self.keys.clone(),
        }
    }
}

impl<R> AuthService<R>
where
    R: UserRepository + 'static,
{
    pub fn new(repo: Arc<R>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn get_user(&self, id: u64) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::UserNotFound(id))
    }

    #[instrument(skip(self, password, confirm_password))]
    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
        confirm_password: String,
    ) -> Result<User, DomainError> {
        if password != confirm_password {
            return Err(DomainError::Validation("passwords do not match".into()));
        }
        if username.trim().is_empty() || !email.contains('@') {
            return Err(DomainError::Validation(
                "username and a valid email are required".into(),
            ));
        }

        let hash =
            hash_password(&password).map_err(|err| DomainError::Internal(err.to_string()))?;
        self.repo
            .create(username, email.trim().to_lowercase(), hash)
            .await
    }

    /// Resolves a bearer token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User, DomainError> {
        let claims = self
            .keys
            .verify_token(token)
            .map_err(|_| DomainError::Unauthorized)?;
        let user_id: u64 = claims.sub.parse().map_err(|_| DomainError::Unauthorized)?;

        self.repo
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::Unauthorized)
    }

    /// Returns the bearer token and the user it was issued for.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), DomainError> {
        let user = self
            .repo
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        let token = self
            .keys
            .generate_token(user.id)
            .map_err(|err| DomainError::Internal(err.to_string()))?;
        Ok((token, user))
    }

    pub async fn seed(&self, users: Vec<SeedUser>) -> Result<(), DomainError> {
        for seed in users {
            let password = seed.password.to_string();
            match self
                .register(
                    seed.username.into(),
                    seed.email.into(),
                    password.clone(),
                    password,
                )
                .await
            {
                Ok(_) | Err(DomainError::UserAlreadyExists(_)) => {}
                Err(err) => return Err(err),
            }
        }
        info!("demo users seeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::seed::demo_users;
    use crate::data::user_repository::InMemoryUserRepository;

    fn service() -> AuthService<InMemoryUserRepository> {
        AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            JwtKeys::new("test-secret".into()),
        )
    }

    #[tokio::test]
    async fn seeded_user_can_log_in() {
        let auth = service();
        auth.seed(demo_users()).await.unwrap();

        let (token, user) = auth.login("Admin@Example.com", "admin123").await.unwrap();

        assert_eq!(user.username, "admin");
        let claims = auth.keys().verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let auth = service();
        auth.seed(demo_users()).await.unwrap();

        let result = auth.login("test@example.com", "nope").await;
        assert!(matches!(result, Err(DomainError::Unauthorized)));
    }

    #[tokio::test]
    async fn register_rejects_mismatch_and_duplicates() {
        let auth = service();

        let mismatch = auth
            .register("u".into(), "u@example.com".into(), "a".into(), "b".into())
            .await;
        assert!(matches!(mismatch, Err(DomainError::Validation(_))));

        auth.register("u".into(), "u@example.com".into(), "a".into(), "a".into())
            .await
            .unwrap();
        let dup = auth
            .register("v".into(), "U@example.com".into(), "a".into(), "a".into())
            .await;
        assert!(matches!(dup, Err(DomainError::UserAlreadyExists(_))));
    }

    #[tokio::test]
    async fn clones_share_the_user_store() {
        let auth = service();
        let handle = auth.clone();

        auth.register("u".into(), "u@example.com".into(), "pw".into(), "pw".into())
            .await
            .unwrap();

        let (token, user) = handle.login("u@example.com", "pw").await.unwrap();
        assert_eq!(auth.authenticate(&token).await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn authenticate_rejects_foreign_and_garbage_tokens() {
        let auth = service();
        auth.seed(demo_users()).await.unwrap();

        let foreign = JwtKeys::new("other-secret".into()).generate_token(1).unwrap();
        assert!(matches!(
            auth.authenticate(&foreign).await,
            Err(DomainError::Unauthorized)
        ));
        assert!(matches!(
            auth.authenticate("not-a-jwt").await,
            Err(DomainError::Unauthorized)
        ));

        let unknown_user = auth.keys().generate_token(999).unwrap();
        assert!(matches!(
            auth.authenticate(&unknown_user).await,
            Err(DomainError::Unauthorized)
        ));
    }
}
