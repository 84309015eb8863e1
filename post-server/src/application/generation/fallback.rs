//! Canned values substituted when a step's service call fails, one entry per
//! step, plus the whole-pipeline placeholder.

use std::fmt::Display;

use chrono::Utc;

use crate::domain::generation::{GeneratedPost, GenerationMetadata};
use crate::domain::post::EngagementStats;

pub const ENGAGEMENT_METRICS: [&str; 5] = ["likes", "comments", "shares", "clicks", "overall"];
pub const DEFAULT_SCORE: f64 = 5.0;

pub fn title(topic: &str) -> String {
    format!("Highlights about {topic}")
}

pub fn content(topic: &str) -> String {
    format!("Sharing some great content about {topic}...")
}

pub fn hashtags(topic: &str) -> Vec<String> {
    vec![topic_tag(topic)]
}

pub fn image_prompt(topic: &str) -> String {
    format!("Beautiful {topic} illustration")
}

pub fn engagement() -> EngagementStats {
    ENGAGEMENT_METRICS
        .iter()
        .map(|metric| (metric.to_string(), DEFAULT_SCORE))
        .collect()
}

pub fn tips() -> Vec<String> {
    vec![
        "Add more interactive elements to the post".into(),
        "Publish when your audience is most active".into(),
        "Use more eye-catching visuals".into(),
    ]
}

/// Result used when the workflow itself cannot be built.
pub fn placeholder(topic: &str, cause: &dyn Display) -> GeneratedPost {
    GeneratedPost {
        title: format!("Thoughts on {topic}"),
        content: format!("Want to share some great content about {topic}..."),
        hashtags: hashtags(topic),
        predicted_engagement: [("overall".to_string(), DEFAULT_SCORE)].into_iter().collect(),
        optimization_tips: vec!["Check the AI configuration settings".into()],
        image_url: None,
        image_description: None,
        generation_metadata: GenerationMetadata {
            errors: vec![format!("generation failed: {cause}")],
            generation_time: Some(Utc::now()),
            model_used: None,
            image_generated: false,
        },
    }
}

fn topic_tag(topic: &str) -> String {
    let tag: String = topic.split_whitespace().collect();
    format!("#{tag}")
}
