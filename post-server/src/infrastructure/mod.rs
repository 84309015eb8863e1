pub mod ai_config;
pub mod config;
pub mod json_file;
pub mod llm;
pub mod logging;
pub mod security;
