use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{fallback, parse, prompts};
use crate::domain::generation::{GeneratedPost, GenerationMetadata, GenerationRequest};
use crate::domain::post::EngagementStats;
use crate::infrastructure::ai_config::AiConfig;
use crate::infrastructure::llm::{self, AiError, ImageGenerator, Prompt, TextGenerator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepName {
    Title,
    Content,
    Hashtags,
    ImagePrompt,
    Image,
    Engagement,
    Tips,
}

impl StepName {
    pub const ORDER: [StepName; 7] = [
        StepName::Title,
        StepName::Content,
        StepName::Hashtags,
        StepName::ImagePrompt,
        StepName::Image,
        StepName::Engagement,
        StepName::Tips,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StepName::Title => "title generation",
            StepName::Content => "content generation",
            StepName::Hashtags => "hashtag generation",
            StepName::ImagePrompt => "image prompt generation",
            StepName::Image => "image generation",
            StepName::Engagement => "engagement prediction",
            StepName::Tips => "tips generation",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a step hands back to the workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome<T> {
    Produced(T),
    /// Disabled by the request; the state keeps its default and no error is recorded.
    Skipped,
    /// The service call failed; `value` is the canned substitute, if any.
    Degraded { value: Option<T>, error: String },
}

impl<T> StepOutcome<T> {
    fn degraded(value: T, error: impl fmt::Display) -> Self {
        StepOutcome::Degraded {
            value: Some(value),
            error: error.to_string(),
        }
    }

    fn failed(error: impl fmt::Display) -> Self {
        StepOutcome::Degraded {
            value: None,
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub path: String,
    pub description: String,
}

/// Accumulated outputs of one pipeline run.
#[derive(Debug, Clone)]
pub struct GenerationState {
    pub request: GenerationRequest,
    pub title: String,
    pub content: String,
    pub hashtags: Vec<String>,
    pub image_prompt: Option<String>,
    pub image: Option<GeneratedImage>,
    pub engagement: EngagementStats,
    pub tips: Vec<String>,
    pub errors: Vec<String>,
}

impl GenerationState {
    pub fn new(request: GenerationRequest) -> Self {
        Self {
            request,
            title: String::new(),
            content: String::new(),
            hashtags: Vec::new(),
            image_prompt: None,
            image: None,
            engagement: EngagementStats::new(),
            tips: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Records a degraded step's error and returns the value to write, if any.
    fn record<T>(&mut self, step: StepName, outcome: StepOutcome<T>) -> Option<T> {
        match outcome {
            StepOutcome::Produced(value) => {
                debug!(step = %step, "step produced output");
                Some(value)
            }
            StepOutcome::Skipped => {
                debug!(step = %step, "step skipped");
                None
            }
            StepOutcome::Degraded { value, error } => {
                warn!(step = %step, error = %error, "step degraded");
                self.errors.push(format!("{step} failed: {error}"));
                value
            }
        }
    }

    fn into_generated(self, model: &str, now: DateTime<Utc>) -> GeneratedPost {
        let image_generated = self.image.is_some();
        let (image_url, image_description) = match self.image {
            Some(image) => (Some(image.path), Some(image.description)),
            None => (None, None),
        };

        GeneratedPost {
            title: self.title,
            content: self.content,
            hashtags: self.hashtags,
            predicted_engagement: self.engagement,
            optimization_tips: self.tips,
            image_url,
            image_description,
            generation_metadata: GenerationMetadata {
                errors: self.errors,
                generation_time: Some(now),
                model_used: Some(model.to_string()),
                image_generated,
            },
        }
    }
}

/// The fixed seven-step sequence. Steps read the state, return a
/// [`StepOutcome`], and `run` writes the result back; no step can abort the run.
pub struct GenerationWorkflow {
    text: Arc<dyn TextGenerator>,
    images: Option<Arc<dyn ImageGenerator>>,
    images_dir: PathBuf,
    images_enabled: bool,
}

impl GenerationWorkflow {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        images: Option<Arc<dyn ImageGenerator>>,
        images_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            text,
            images,
            images_dir: images_dir.into(),
            images_enabled: true,
        }
    }

    pub fn with_images_enabled(mut self, enabled: bool) -> Self {
        self.images_enabled = enabled;
        self
    }

    /// Fails when the configured model has no usable provider.
    pub fn from_config(config: &AiConfig, images_dir: &Path) -> Result<Self, AiError> {
        let client = llm::http_client(config)?;
        let text = llm::text_generator(config, client.clone())?;
        let images = llm::image_generator(config, client);
        Ok(Self::new(text, images, images_dir).with_images_enabled(config.enable_image_generation))
    }

    pub async fn run(&self, request: GenerationRequest) -> GeneratedPost {
        info!(topic = %request.topic, model = self.text.model(), "generation started");
        let mut state = GenerationState::new(request);

        let outcome = self.title(&state).await;
        if let Some(title) = state.record(StepName::Title, outcome) {
            state.title = title;
        }

        let outcome = self.content(&state).await;
        if let Some(content) = state.record(StepName::Content, outcome) {
            state.content = content;
        }

        let outcome = self.hashtags(&state).await;
        if let Some(hashtags) = state.record(StepName::Hashtags, outcome) {
            state.hashtags = hashtags;
        }

        let outcome = self.image_prompt(&state).await;
        if let Some(prompt) = state.record(StepName::ImagePrompt, outcome) {
            state.image_prompt = Some(prompt);
        }

        let outcome = self.image(&state).await;
        if let Some(image) = state.record(StepName::Image, outcome) {
            state.image = Some(image);
        }

        let outcome = self.engagement(&state).await;
        if let Some(engagement) = state.record(StepName::Engagement, outcome) {
            state.engagement = engagement;
        }

        let outcome = self.tips(&state).await;
        if let Some(tips) = state.record(StepName::Tips, outcome) {
            state.tips = tips;
        }

        info!(errors = state.errors.len(), "generation finished");
        state.into_generated(self.text.model(), Utc::now())
    }

    async fn ask(&self, prompt: &Prompt) -> Result<String, AiError> {
        let reply = self.text.complete(prompt).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(reply.to_string())
    }

    /// Reads: request.
    async fn title(&self, state: &GenerationState) -> StepOutcome<String> {
        match self.ask(&prompts::title(&state.request)).await {
            Ok(title) => StepOutcome::Produced(title),
            Err(err) => StepOutcome::degraded(fallback::title(&state.request.topic), err),
        }
    }

    /// Reads: request.
    async fn content(&self, state: &GenerationState) -> StepOutcome<String> {
        match self.ask(&prompts::content(&state.request)).await {
            Ok(content) => StepOutcome::Produced(content),
            Err(err) => StepOutcome::degraded(fallback::content(&state.request.topic), err),
        }
    }

    /// Reads: request.
    async fn hashtags(&self, state: &GenerationState) -> StepOutcome<Vec<String>> {
        if !state.request.include_hashtags {
            return StepOutcome::Skipped;
        }

        let topic = &state.request.topic;
        match self.ask(&prompts::hashtags(&state.request)).await {
            Ok(reply) => {
                let tags = parse::hashtags(&reply);
                if tags.is_empty() {
                    StepOutcome::degraded(fallback::hashtags(topic), "no hashtags in response")
                } else {
                    StepOutcome::Produced(tags)
                }
            }
            Err(err) => StepOutcome::degraded(fallback::hashtags(topic), err),
        }
    }

    /// Reads: request, content.
    async fn image_prompt(&self, state: &GenerationState) -> StepOutcome<String> {
        if !(state.request.generate_image && self.images_enabled) {
            return StepOutcome::Skipped;
        }

        match self
            .ask(&prompts::image_prompt(&state.request, &state.content))
            .await
        {
            Ok(prompt) => StepOutcome::Produced(prompt),
            Err(err) => StepOutcome::degraded(fallback::image_prompt(&state.request.topic), err),
        }
    }

    /// Reads: image_prompt. Writes the downloaded image under `images_dir`.
    async fn image(&self, state: &GenerationState) -> StepOutcome<GeneratedImage> {
        let Some(prompt) = state.image_prompt.as_deref() else {
            return StepOutcome::Skipped;
        };
        let Some(images) = self.images.as_ref() else {
            return StepOutcome::failed(AiError::MissingCredential("OpenAI"));
        };

        match self.render(images.as_ref(), prompt).await {
            Ok(path) => StepOutcome::Produced(GeneratedImage {
                path,
                description: prompt.to_string(),
            }),
            Err(err) => StepOutcome::failed(err),
        }
    }

    async fn render(&self, images: &dyn ImageGenerator, prompt: &str) -> Result<String, AiError> {
        let url = images.generate(prompt).await?;
        let bytes = images.download(&url).await?;

        tokio::fs::create_dir_all(&self.images_dir).await?;
        let filename = format!("generated_{}.png", Utc::now().format("%Y%m%d_%H%M%S_%3f"));
        let path = self.images_dir.join(filename);
        tokio::fs::write(&path, &bytes).await?;

        info!(path = %path.display(), bytes = bytes.len(), "image saved");
        Ok(path.display().to_string())
    }

    /// Reads: request, title, content, hashtags.
    async fn engagement(&self, state: &GenerationState) -> StepOutcome<EngagementStats> {
        let prompt = prompts::engagement(
            &state.request,
            &state.title,
            &state.content,
            &state.hashtags,
        );
        match self.ask(&prompt).await {
            Ok(reply) => match parse::engagement(&reply) {
                Ok(scores) => StepOutcome::Produced(scores),
                Err(err) => StepOutcome::degraded(
                    fallback::engagement(),
                    AiError::Malformed(err.to_string()),
                ),
            },
            Err(err) => StepOutcome::degraded(fallback::engagement(), err),
        }
    }

    /// Reads: title, content, hashtags, engagement.
    async fn tips(&self, state: &GenerationState) -> StepOutcome<Vec<String>> {
        let engagement = serde_json::to_string(&state.engagement).unwrap_or_default();
        let prompt = prompts::tips(&state.title, &state.content, &state.hashtags, &engagement);
        match self.ask(&prompt).await {
            Ok(reply) => {
                let tips = parse::tips(&reply);
                if tips.is_empty() {
                    StepOutcome::degraded(fallback::tips(), "no tips in response")
                } else {
                    StepOutcome::Produced(tips)
                }
            }
            Err(err) => StepOutcome::degraded(fallback::tips(), err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct Unreachable;

    #[async_trait]
    impl TextGenerator for Unreachable {
        fn model(&self) -> &str {
            "gpt-test"
        }

        async fn complete(&self, _prompt: &Prompt) -> Result<String, AiError> {
            Err(AiError::Status {
                status: 503,
                body: "unavailable".into(),
            })
        }
    }

    /// Answers calls in order; fails once the script runs out.
    struct Scripted {
        replies: Mutex<VecDeque<&'static str>>,
        prompts: Mutex<Vec<Prompt>>,
    }

    impl Scripted {
        fn new(replies: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().copied().collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        fn model(&self) -> &str {
            "gpt-test"
        }

        async fn complete(&self, prompt: &Prompt) -> Result<String, AiError> {
            self.prompts.lock().unwrap().push(prompt.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .map(str::to_string)
                .ok_or(AiError::EmptyResponse)
        }
    }

    struct StubImages {
        download_status: Option<u16>,
    }

    #[async_trait]
    impl ImageGenerator for StubImages {
        async fn generate(&self, _prompt: &str) -> Result<String, AiError> {
            Ok("https://images.test/1.png".into())
        }

        async fn download(&self, _url: &str) -> Result<Vec<u8>, AiError> {
            match self.download_status {
                Some(status) => Err(AiError::Download { status }),
                None => Ok(b"\x89PNG".to_vec()),
            }
        }
    }

    const TITLE: &str = "  Morning coffee rituals  ";
    const CONTENT: &str = "Start your day with a perfect cup.";
    const TAGS: &str = "coffee, #morning, ritual";
    const SCORES: &str = r#"{"likes": 8, "comments": 6.5, "shares": 5, "clicks": 7, "overall": 7}"#;
    const TIPS: &str = "1. Post at 8am\n2. Ask readers for their routine\n3. Add a photo";

    fn request(topic: &str) -> GenerationRequest {
        GenerationRequest::new(topic)
    }

    #[tokio::test]
    async fn unreachable_service_still_yields_complete_post() {
        let dir = TempDir::new().unwrap();
        let workflow = GenerationWorkflow::new(Arc::new(Unreachable), None, dir.path());

        let post = workflow.run(request("t")).await;

        assert_eq!(post.title, fallback::title("t"));
        assert_eq!(post.content, fallback::content("t"));
        assert_eq!(post.hashtags, vec!["#t".to_string()]);
        assert_eq!(post.predicted_engagement, fallback::engagement());
        assert_eq!(post.optimization_tips, fallback::tips());
        assert!(post.image_url.is_none());
        assert!(post.image_description.is_none());
        assert!(post.errors().len() >= 3);
        assert!(post.errors()[0].starts_with("title generation failed"));
        assert!(!post.errors().iter().any(|e| e.starts_with("image")));
    }

    #[tokio::test]
    async fn successful_run_fills_every_field() {
        let dir = TempDir::new().unwrap();
        let text = Scripted::new(&[TITLE, CONTENT, TAGS, SCORES, TIPS]);
        let workflow = GenerationWorkflow::new(text.clone(), None, dir.path());

        let post = workflow.run(request("coffee")).await;

        assert_eq!(post.title, "Morning coffee rituals");
        assert_eq!(post.content, CONTENT);
        assert_eq!(post.hashtags, vec!["#coffee", "#morning", "#ritual"]);
        assert_eq!(post.predicted_engagement["comments"], 6.5);
        assert_eq!(
            post.optimization_tips,
            vec!["Post at 8am", "Ask readers for their routine", "Add a photo"]
        );
        assert!(post.errors().is_empty());
        assert_eq!(post.generation_metadata.model_used.as_deref(), Some("gpt-test"));
        assert!(!post.generation_metadata.image_generated);
        assert_eq!(text.calls(), 5);
    }

    #[tokio::test]
    async fn disabled_hashtags_are_empty_without_error() {
        let dir = TempDir::new().unwrap();
        let text = Scripted::new(&[TITLE, CONTENT, SCORES, TIPS]);
        let workflow = GenerationWorkflow::new(text.clone(), None, dir.path());
        let request = GenerationRequest {
            include_hashtags: false,
            ..request("coffee")
        };

        let post = workflow.run(request).await;

        assert!(post.hashtags.is_empty());
        assert!(post.errors().is_empty());
        assert_eq!(text.calls(), 4);
    }

    #[tokio::test]
    async fn malformed_engagement_uses_canonical_default() {
        let dir = TempDir::new().unwrap();
        let text = Scripted::new(&[TITLE, CONTENT, TAGS, "I'd say around 7/10", TIPS]);
        let workflow = GenerationWorkflow::new(text, None, dir.path());

        let post = workflow.run(request("coffee")).await;

        assert_eq!(post.predicted_engagement, fallback::engagement());
        assert_eq!(post.errors().len(), 1);
        assert!(post.errors()[0].starts_with("engagement prediction failed: malformed response"));
    }

    #[tokio::test]
    async fn image_without_credential_records_error() {
        let dir = TempDir::new().unwrap();
        let text = Scripted::new(&[TITLE, CONTENT, TAGS, "A steaming cup at sunrise", SCORES, TIPS]);
        let workflow = GenerationWorkflow::new(text, None, dir.path());
        let request = GenerationRequest {
            generate_image: true,
            ..request("coffee")
        };

        let post = workflow.run(request).await;

        assert!(post.image_url.is_none());
        assert_eq!(post.errors().len(), 1);
        assert!(post.errors()[0].starts_with("image generation failed"));
        assert!(post.errors()[0].contains("API key"));
    }

    #[tokio::test]
    async fn image_is_downloaded_into_images_dir() {
        let dir = TempDir::new().unwrap();
        let images_dir = dir.path().join("generated_images");
        let text = Scripted::new(&[TITLE, CONTENT, TAGS, "A steaming cup at sunrise", SCORES, TIPS]);
        let images = Arc::new(StubImages {
            download_status: None,
        });
        let workflow = GenerationWorkflow::new(text, Some(images), &images_dir);
        let request = GenerationRequest {
            generate_image: true,
            ..request("coffee")
        };

        let post = workflow.run(request).await;

        let path = PathBuf::from(post.image_url.clone().unwrap());
        assert!(path.starts_with(&images_dir));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("generated_"));
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG");
        assert_eq!(post.image_description.as_deref(), Some("A steaming cup at sunrise"));
        assert!(post.generation_metadata.image_generated);
        assert!(post.errors().is_empty());
    }

    #[tokio::test]
    async fn failed_download_leaves_image_unset() {
        let dir = TempDir::new().unwrap();
        let text = Scripted::new(&[TITLE, CONTENT, TAGS, "A steaming cup at sunrise", SCORES, TIPS]);
        let images = Arc::new(StubImages {
            download_status: Some(404),
        });
        let workflow = GenerationWorkflow::new(text, Some(images), dir.path());
        let request = GenerationRequest {
            generate_image: true,
            ..request("coffee")
        };

        let post = workflow.run(request).await;

        assert!(post.image_url.is_none());
        assert!(post.image_description.is_none());
        assert_eq!(post.errors(), ["image generation failed: download failed: HTTP 404"]);
    }

    #[tokio::test]
    async fn config_switch_disables_image_steps_silently() {
        let dir = TempDir::new().unwrap();
        let text = Scripted::new(&[TITLE, CONTENT, TAGS, SCORES, TIPS]);
        let images = Arc::new(StubImages {
            download_status: None,
        });
        let workflow = GenerationWorkflow::new(text.clone(), Some(images), dir.path())
            .with_images_enabled(false);
        let request = GenerationRequest {
            generate_image: true,
            ..request("coffee")
        };

        let post = workflow.run(request).await;

        assert!(post.image_url.is_none());
        assert!(post.errors().is_empty());
        assert_eq!(text.calls(), 5);
    }

    #[tokio::test]
    async fn image_prompt_uses_generated_content() {
        let dir = TempDir::new().unwrap();
        let text = Scripted::new(&[TITLE, CONTENT, TAGS, "A steaming cup", SCORES, TIPS]);
        let images = Arc::new(StubImages {
            download_status: None,
        });
        let workflow = GenerationWorkflow::new(text.clone(), Some(images), dir.path());
        let request = GenerationRequest {
            generate_image: true,
            ..request("coffee")
        };

        workflow.run(request).await;

        let prompts = text.prompts.lock().unwrap();
        assert!(prompts[3].user.contains(CONTENT));
        assert!(prompts[3].user.contains("English"));
    }

    #[test]
    fn step_order_is_fixed() {
        let labels: Vec<_> = StepName::ORDER.iter().map(StepName::label).collect();
        assert_eq!(
            labels,
            vec![
                "title generation",
                "content generation",
                "hashtag generation",
                "image prompt generation",
                "image generation",
                "engagement prediction",
                "tips generation",
            ]
        );
    }
}
