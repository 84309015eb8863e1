//! Wire types returned by the post server.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize, Display)]
#[display("#{id} [{status}] {title}")]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub status: String,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,
    pub facebook_post_id: Option<String>,
    #[serde(default)]
    pub engagement_stats: BTreeMap<String, f64>,
    #[serde(default)]
    pub ai_generated: bool,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub current_page: usize,
    pub per_page: usize,
    pub total: usize,
    pub pages: usize,
}

#[derive(Debug, Deserialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct PostStats {
    pub total_posts: usize,
    pub published_posts: usize,
    pub draft_posts: usize,
    pub scheduled_posts: usize,
    pub failed_posts: usize,
    pub today_posts: usize,
    pub total_engagement: f64,
}

#[derive(Debug, Default, Serialize)]
pub struct PostChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashtags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerationMetadata {
    #[serde(default)]
    pub errors: Vec<String>,
    pub model_used: Option<String>,
    #[serde(default)]
    pub image_generated: bool,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedPost {
    pub title: String,
    pub content: String,
    pub hashtags: Vec<String>,
    pub predicted_engagement: BTreeMap<String, f64>,
    pub optimization_tips: Vec<String>,
    pub image_url: Option<String>,
    pub image_description: Option<String>,
    pub generation_metadata: GenerationMetadata,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub generated: GeneratedPost,
    pub post: Option<Post>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_display_is_one_line_summary() {
        let post: Post = serde_json::from_value(serde_json::json!({
            "id": 7,
            "title": "Spring menu",
            "content": "body",
            "status": "draft",
            "scheduled_time": null,
            "created_time": "2024-03-01T10:00:00Z",
            "updated_time": "2024-03-01T10:00:00Z",
            "facebook_post_id": null,
            "image_url": null
        }))
        .unwrap();
        assert_eq!(post.to_string(), "#7 [draft] Spring menu");
        assert!(post.engagement_stats.is_empty());
    }
}
