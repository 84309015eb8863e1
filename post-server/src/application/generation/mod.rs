//! AI-assisted post generation: a fixed, fail-soft sequence of calls to a
//! text service and an optional image service.

pub mod fallback;
mod parse;
mod prompts;
mod workflow;

use std::path::PathBuf;

use tracing::{instrument, warn};

pub use workflow::{GeneratedImage, GenerationState, GenerationWorkflow, StepName, StepOutcome};

use crate::domain::generation::{GeneratedPost, GenerationRequest};
use crate::infrastructure::ai_config::AiConfigStore;

#[derive(Clone)]
pub struct GenerationService {
    config: AiConfigStore,
    images_dir: PathBuf,
}

impl GenerationService {
    pub fn new(config: AiConfigStore, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            images_dir: images_dir.into(),
        }
    }

    pub fn config_store(&self) -> &AiConfigStore {
        &self.config
    }

    /// Always returns a well-formed post. If the workflow cannot be built from
    /// the current configuration the result is the static placeholder.
    #[instrument(skip(self, request), fields(topic = %request.topic))]
    pub async fn generate(&self, request: GenerationRequest) -> GeneratedPost {
        let config = self.config.load().await;
        match GenerationWorkflow::from_config(&config, &self.images_dir) {
            Ok(workflow) => workflow.run(request).await,
            Err(err) => {
                warn!(error = %err, model = %config.default_model, "generation workflow unavailable");
                fallback::placeholder(&request.topic, &err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ai_config::AiConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_credential_degrades_to_placeholder() {
        let dir = TempDir::new().unwrap();
        let service = GenerationService::new(
            AiConfigStore::new(dir.path().join("ai_config.json")),
            dir.path().join("generated_images"),
        );

        let post = service.generate(GenerationRequest::new("t")).await;

        assert_eq!(post.title, "Thoughts on t");
        assert_eq!(post.hashtags, vec!["#t".to_string()]);
        assert_eq!(post.predicted_engagement.len(), 1);
        assert_eq!(post.errors().len(), 1);
        assert!(post.errors()[0].starts_with("generation failed"));
    }

    #[tokio::test]
    async fn unsupported_model_degrades_to_placeholder() {
        let dir = TempDir::new().unwrap();
        let store = AiConfigStore::new(dir.path().join("ai_config.json"));
        store
            .save(&AiConfig {
                default_model: "mistral-large".into(),
                openai_api_key: "sk-test".into(),
                ..AiConfig::default()
            })
            .await
            .unwrap();
        let service = GenerationService::new(store, dir.path());

        let post = service.generate(GenerationRequest::new("t")).await;

        assert!(post.errors()[0].contains("unsupported model: mistral-large"));
    }
}
