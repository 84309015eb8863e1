use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::generation::GenerationMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Scheduled,
    Published,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
            PostStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metric name to score. Filled by the publish simulation or by AI prediction.
pub type EngagementStats = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub scheduled_time: Option<DateTime<Utc>>,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,
    #[serde(default)]
    pub facebook_post_id: Option<String>,
    #[serde(default)]
    pub engagement_stats: EngagementStats,
    #[serde(default)]
    pub ai_generated: bool,
    #[serde(default)]
    pub generation_metadata: Option<GenerationMetadata>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_description: Option<String>,
    #[serde(default)]
    pub optimization_tips: Vec<String>,
}

/// AI provenance carried over when a generated post is persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiProvenance {
    pub metadata: GenerationMetadata,
    pub image_url: Option<String>,
    pub image_description: Option<String>,
    pub optimization_tips: Vec<String>,
    pub predicted_engagement: EngagementStats,
}

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub status: Option<PostStatus>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub hashtags: Vec<String>,
    pub ai: Option<AiProvenance>,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }
}

/// Partial update: only `Some` fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<PostStatus>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub hashtags: Option<Vec<String>>,
}

impl Post {
    pub fn new(id: u64, new: NewPost, now: DateTime<Utc>) -> Self {
        let mut post = Self {
            id,
            title: new.title,
            content: new.content,
            hashtags: new.hashtags,
            status: new.status.unwrap_or_default(),
            scheduled_time: new.scheduled_time,
            created_time: now,
            updated_time: now,
            facebook_post_id: None,
            engagement_stats: EngagementStats::new(),
            ai_generated: false,
            generation_metadata: None,
            image_url: None,
            image_description: None,
            optimization_tips: Vec::new(),
        };

        if let Some(ai) = new.ai {
            post.ai_generated = true;
            post.generation_metadata = Some(ai.metadata);
            post.image_url = ai.image_url;
            post.image_description = ai.image_description;
            post.optimization_tips = ai.optimization_tips;
            post.engagement_stats = ai.predicted_engagement;
        }

        post
    }

    pub fn apply(&mut self, update: PostUpdate, now: DateTime<Utc>) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(scheduled_time) = update.scheduled_time {
            self.scheduled_time = Some(scheduled_time);
        }
        if let Some(hashtags) = update.hashtags {
            self.hashtags = hashtags;
        }
        self.touch(now);
    }

    /// Bumps `updated_time`, never letting it fall behind `created_time`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_time = now.max(self.created_time);
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle) || self.content.to_lowercase().contains(&needle)
    }

    pub fn total_engagement(&self) -> f64 {
        self.engagement_stats.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_post_defaults_to_draft_with_equal_timestamps() {
        let now = Utc::now();
        let post = Post::new(7, NewPost::new("A", "B"), now);

        assert_eq!(post.id, 7);
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.created_time, post.updated_time);
        assert!(post.engagement_stats.is_empty());
        assert!(!post.ai_generated);
    }

    #[test]
    fn apply_only_touches_supplied_fields() {
        let now = Utc::now();
        let mut post = Post::new(1, NewPost::new("title", "body"), now);
        let later = now + Duration::seconds(5);

        post.apply(
            PostUpdate {
                content: Some("new body".into()),
                ..PostUpdate::default()
            },
            later,
        );

        assert_eq!(post.title, "title");
        assert_eq!(post.content, "new body");
        assert_eq!(post.updated_time, later);
        assert_eq!(post.created_time, now);
    }

    #[test]
    fn touch_never_moves_updated_before_created() {
        let now = Utc::now();
        let mut post = Post::new(1, NewPost::new("a", "b"), now);
        post.touch(now - Duration::hours(1));
        assert_eq!(post.updated_time, post.created_time);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&PostStatus::Scheduled).unwrap();
        assert_eq!(json, "\"scheduled\"");
    }

    #[test]
    fn missing_optional_fields_deserialize_to_defaults() {
        let raw = r#"{
            "id": 3,
            "title": "t",
            "content": "c",
            "created_time": "2024-01-20T10:00:00Z",
            "updated_time": "2024-01-20T10:00:00Z"
        }"#;
        let post: Post = serde_json::from_str(raw).unwrap();
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.hashtags.is_empty());
        assert!(post.facebook_post_id.is_none());
        assert!(post.optimization_tips.is_empty());
    }
}
