use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::post::{AiProvenance, EngagementStats, NewPost};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    #[serde(default = "default_audience")]
    pub target_audience: String,
    #[serde(default = "default_post_type")]
    pub post_type: String,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default = "default_true")]
    pub include_hashtags: bool,
    #[serde(default = "default_true")]
    pub include_emoji: bool,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    #[serde(default)]
    pub generate_image: bool,
    #[serde(default = "default_image_style")]
    pub image_style: String,
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            target_audience: default_audience(),
            post_type: default_post_type(),
            tone: default_tone(),
            include_hashtags: true,
            include_emoji: true,
            max_length: default_max_length(),
            generate_image: false,
            image_style: default_image_style(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    #[serde(default)]
    pub errors: Vec<String>,
    pub generation_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub image_generated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPost {
    pub title: String,
    pub content: String,
    pub hashtags: Vec<String>,
    pub predicted_engagement: EngagementStats,
    pub optimization_tips: Vec<String>,
    pub image_url: Option<String>,
    pub image_description: Option<String>,
    pub generation_metadata: GenerationMetadata,
}

impl GeneratedPost {
    pub fn errors(&self) -> &[String] {
        &self.generation_metadata.errors
    }

    /// Draft post carrying this result's AI provenance.
    pub fn into_new_post(self) -> NewPost {
        NewPost {
            title: self.title,
            content: self.content,
            status: None,
            scheduled_time: None,
            hashtags: self.hashtags,
            ai: Some(AiProvenance {
                metadata: self.generation_metadata,
                image_url: self.image_url,
                image_description: self.image_description,
                optimization_tips: self.optimization_tips,
                predicted_engagement: self.predicted_engagement,
            }),
        }
    }
}

fn default_audience() -> String {
    "general public".into()
}

fn default_post_type() -> String {
    "promotion".into()
}

fn default_tone() -> String {
    "friendly".into()
}

fn default_image_style() -> String {
    "modern minimalist".into()
}

fn default_max_length() -> u32 {
    300
}

fn default_true() -> bool {
    true
}
