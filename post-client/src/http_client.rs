use std::path::PathBuf;
use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::PostClientError;
use crate::model::{AuthResponse, GenerateResponse, Post, PostChanges, PostPage, PostStats, User};

pub const DEFAULT_TOKEN_FILE: &str = ".post_token";

#[derive(Clone)]
pub struct PostClientHttp {
    client: Arc<Client>,
    base_url: String,
    token: Option<String>,
    token_file: PathBuf,
}

impl PostClientHttp {
    pub fn connect(endpoint: &str) -> Result<Self, PostClientError> {
        let base_url = endpoint.trim_end_matches('/').to_string();
        Ok(Self {
            client: Arc::new(Client::builder().build()?),
            base_url,
            token: None,
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
        })
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = path.into();
        self
    }

    pub fn set_token(&mut self, token: String) -> Result<(), PostClientError> {
        std::fs::write(&self.token_file, &token)?;
        self.token = Some(token);
        Ok(())
    }

    pub fn clear_token(&mut self) -> Result<(), PostClientError> {
        self.token = None;
        match std::fs::remove_file(&self.token_file) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// In-memory token first, then the token file.
    pub fn token(&self) -> Option<String> {
        match &self.token {
            Some(t) if !t.is_empty() => Some(t.clone()),
            _ => std::fs::read_to_string(&self.token_file)
                .ok()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => req.header(header::AUTHORIZATION, format!("Bearer {token}")),
            None => req,
        }
    }

    async fn read<T: DeserializeOwned>(resp: Response) -> Result<T, PostClientError> {
        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(PostClientError::from_http_response(resp).await)
        }
    }

    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> Result<User, PostClientError> {
        let resp = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({
                "username": username,
                "email": email,
                "password": password,
                "confirm_password": password,
            }))
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn login(&mut self, email: String, password: String) -> Result<User, PostClientError> {
        let resp = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let auth: AuthResponse = Self::read(resp).await?;
        debug!(expires_in = auth.expires_in, "token received");
        self.set_token(auth.access_token)?;
        Ok(auth.user)
    }

    pub async fn logout(&mut self) -> Result<(), PostClientError> {
        let resp = self
            .authorized(self.client.delete(self.url("/auth/logout")))
            .send()
            .await?;
        let _: Value = Self::read(resp).await?;
        self.clear_token()
    }

    pub async fn profile(&self) -> Result<User, PostClientError> {
        let resp = self
            .authorized(self.client.get(self.url("/users/profile")))
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn list_posts(
        &self,
        page: Option<usize>,
        limit: Option<usize>,
        status: Option<String>,
        search: Option<String>,
    ) -> Result<PostPage, PostClientError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(status) = status {
            query.push(("status", status));
        }
        if let Some(search) = search {
            query.push(("search", search));
        }

        let resp = self
            .client
            .get(self.url("/posts"))
            .query(&query)
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn get_post(&self, id: u64) -> Result<Post, PostClientError> {
        let resp = self
            .client
            .get(self.url(&format!("/posts/{id}")))
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn create_post(
        &self,
        title: String,
        content: String,
        hashtags: Vec<String>,
    ) -> Result<Post, PostClientError> {
        let resp = self
            .authorized(self.client.post(self.url("/posts")))
            .json(&json!({
                "title": title,
                "content": content,
                "hashtags": hashtags,
            }))
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn update_post(&self, id: u64, changes: &PostChanges) -> Result<Post, PostClientError> {
        let resp = self
            .authorized(self.client.put(self.url(&format!("/posts/{id}"))))
            .json(changes)
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn delete_post(&self, id: u64) -> Result<(), PostClientError> {
        let resp = self
            .authorized(self.client.delete(self.url(&format!("/posts/{id}"))))
            .send()
            .await?;
        let _: Value = Self::read(resp).await?;
        Ok(())
    }

    pub async fn publish_post(&self, id: u64) -> Result<Post, PostClientError> {
        let resp = self
            .authorized(self.client.post(self.url(&format!("/posts/{id}/publish"))))
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn stats(&self) -> Result<PostStats, PostClientError> {
        let resp = self
            .client
            .get(self.url("/posts/stats/summary"))
            .send()
            .await?;
        Self::read(resp).await
    }

    /// `request` is the generation request body; `save` stores the result as a draft.
    pub async fn generate(&self, mut request: Value, save: bool) -> Result<GenerateResponse, PostClientError> {
        if let Value::Object(map) = &mut request {
            map.insert("save".into(), Value::Bool(save));
        }
        let resp = self
            .authorized(self.client.post(self.url("/ai/generate")))
            .json(&request)
            .send()
            .await?;
        Self::read(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_token_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("post_client_{}_{name}", std::process::id()))
    }

    #[test]
    fn token_persists_to_file_and_clears() {
        let path = temp_token_path("persist");
        let mut client = PostClientHttp::connect("http://localhost:8080/")
            .unwrap()
            .with_token_file(&path);

        client.set_token("abc".into()).unwrap();
        let reloaded = PostClientHttp::connect("http://localhost:8080")
            .unwrap()
            .with_token_file(&path);
        assert_eq!(reloaded.token().as_deref(), Some("abc"));

        client.clear_token().unwrap();
        assert!(client.token().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn url_joins_api_prefix() {
        let client = PostClientHttp::connect("http://localhost:8080/").unwrap();
        assert_eq!(client.url("/posts/3"), "http://localhost:8080/api/posts/3");
    }
}
