//! The AI configuration document: provider keys, model names and sampling
//! parameters, merged over built-in defaults every time it is loaded.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::infrastructure::json_file::{JsonFileError, read_json, write_json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub openai_api_key: String,
    pub anthropic_api_key: String,
    pub default_model: String,
    pub image_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub enable_image_generation: bool,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            anthropic_api_key: String::new(),
            default_model: "gpt-4o-mini".into(),
            image_model: "dall-e-3".into(),
            max_tokens: 1000,
            temperature: 0.7,
            enable_image_generation: true,
            openai_base_url: "https://api.openai.com/v1".into(),
            anthropic_base_url: "https://api.anthropic.com/v1".into(),
            request_timeout_secs: 60,
        }
    }
}

impl AiConfig {
    pub fn has_openai_key(&self) -> bool {
        !self.openai_api_key.trim().is_empty()
    }

    pub fn has_anthropic_key(&self) -> bool {
        !self.anthropic_api_key.trim().is_empty()
    }

    /// Copy safe to return over the API: keys reduced to their last four characters.
    pub fn masked(&self) -> Self {
        Self {
            openai_api_key: mask(&self.openai_api_key),
            anthropic_api_key: mask(&self.anthropic_api_key),
            ..self.clone()
        }
    }

    /// Applies an update coming from a client. API key entries that are blank
    /// or still carry the `****` mask from [`AiConfig::masked`] are dropped,
    /// so a fetched config can be sent back without clobbering the secrets.
    pub fn updated(&self, mut patch: Map<String, Value>) -> Result<Self, serde_json::Error> {
        for key in SECRET_KEYS {
            let keep = match patch.get(key) {
                Some(Value::String(value)) => {
                    let value = value.trim();
                    !value.is_empty() && !value.starts_with(MASK)
                }
                Some(_) => true,
                None => false,
            };
            if !keep {
                patch.remove(key);
            }
        }
        self.merged(patch)
    }

    /// Overlays the recognized keys of `patch` onto this config.
    pub fn merged(&self, patch: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let mut base = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        base.extend(patch);
        serde_json::from_value(Value::Object(base))
    }
}

const MASK: &str = "****";
const SECRET_KEYS: [&str; 2] = ["openai_api_key", "anthropic_api_key"];

/// Builds a config from a stored document one key at a time, so a single
/// mistyped value falls back to its default instead of the whole document.
fn from_document(document: Value) -> AiConfig {
    let Value::Object(entries) = document else {
        warn!("ai config is not a JSON object, using defaults");
        return AiConfig::default();
    };

    let mut config = AiConfig::default();
    for (key, value) in entries {
        let single = Map::from_iter([(key.clone(), value)]);
        match config.merged(single) {
            Ok(next) => config = next,
            Err(err) => warn!(key = %key, error = %err, "invalid ai config value, keeping default"),
        }
    }
    config
}

fn mask(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{MASK}{tail}")
}

#[derive(Debug, Clone)]
pub struct AiConfigStore {
    path: PathBuf,
}

impl AiConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Never fails: a missing document is created with defaults, an unreadable
    /// one falls back to defaults, and invalid values fall back key by key.
    pub async fn load(&self) -> AiConfig {
        match read_json::<Value>(&self.path).await {
            Ok(Some(document)) => from_document(document),
            Ok(None) => {
                let config = AiConfig::default();
                if let Err(err) = self.save(&config).await {
                    warn!(error = %err, "failed to write default ai config");
                } else {
                    info!(path = %self.path.display(), "default ai config created");
                }
                config
            }
            Err(err) => {
                warn!(error = %err, "failed to load ai config, using defaults");
                AiConfig::default()
            }
        }
    }

    pub async fn save(&self, config: &AiConfig) -> Result<(), JsonFileError> {
        write_json(&self.path, config).await
    }
}
