use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Root directories of the image archive, scanned recursively.
    pub input_directories: Vec<String>,
    /// Metadata tables in priority order; the first table that provides a
    /// field for an object wins.
    #[serde(default)]
    pub metadata_tables: Vec<String>,
    /// Append-only JSONL table holding one description record per line.
    pub descriptions_table: String,
    #[serde(default = "default_max_images_per_object")]
    pub max_images_per_object: usize,
    /// Longest image side in pixels before encoding; null disables resizing.
    #[serde(default = "default_resize_max_side")]
    pub resize_max_side: Option<u32>,
    /// Pause between successive generation requests, independent of backoff.
    #[serde(default = "default_request_cooldown_secs")]
    pub request_cooldown_secs: f64,
    /// Maximum number of objects described per invocation.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

fn default_max_images_per_object() -> usize {
    5
}

fn default_resize_max_side() -> Option<u32> {
    Some(1024)
}

fn default_request_cooldown_secs() -> f64 {
    2.5
}

fn default_batch_size() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: f64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: f64,
}

fn default_max_attempts() -> u32 {
    6
}

fn default_base_delay_secs() -> f64 {
    2.0
}

fn default_max_delay_secs() -> f64 {
    30.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Overrides the built-in catalogue prompt. Placeholders like
    /// `[InventoryNo]` are substituted per object.
    #[serde(default)]
    pub prompt_template: Option<String>,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_url: default_api_url(),
            temperature: default_temperature(),
            prompt_template: None,
        }
    }
}
