use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::post_service::PostQuery;
use crate::domain::error::DomainError;
use crate::domain::generation::{GeneratedPost, GenerationRequest};
use crate::domain::post::{NewPost, Post, PostStatus, PostUpdate};
use crate::domain::user::User;

// ======================= AUTH =======================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: u64,
    pub username: String,
    pub email: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(rename = "token_type")]
    pub token_type: String, // "Bearer"
    pub user: UserSummary,
}

// ======================= POSTS =======================

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub status: Option<PostStatus>,
    #[serde(default)]
    pub scheduled_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

impl CreatePostRequest {
    pub fn into_new_post(self) -> Result<NewPost, DomainError> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(DomainError::Validation(
                "title and content are required".into(),
            ));
        }
        Ok(NewPost {
            title: self.title,
            content: self.content,
            status: self.status,
            scheduled_time: self.scheduled_time,
            hashtags: self.hashtags,
            ai: None,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<PostStatus>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub hashtags: Option<Vec<String>>,
}

impl From<UpdatePostRequest> for PostUpdate {
    fn from(req: UpdatePostRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            status: req.status,
            scheduled_time: req.scheduled_time,
            hashtags: req.hashtags,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub status: Option<PostStatus>,
    pub search: Option<String>,
}

impl From<ListPostsQuery> for PostQuery {
    fn from(query: ListPostsQuery) -> Self {
        Self {
            page: query.page,
            limit: query.limit,
            status: query.status,
            search: query.search,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted_id: u64,
}

// ======================= AI =======================

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub request: GenerationRequest,
    /// Persist the result as an AI-generated draft.
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub generated: GeneratedPost,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Post>,
}
