// src/config/ai.rs
use serde::{Deserialize, Serialize};

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Empty means "not configured"; generation short-circuits.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            base_url: default_base_url(),
        }
    }
}

impl AiConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Normalize values that would make the client unusable.
    pub(crate) fn sanitize(&mut self) {
        self.api_key = self.api_key.trim().to_string();
        if self.model.trim().is_empty() {
            self.model = default_model();
        }
        // Accept "models/gemini-…" as written in some SDK examples.
        if let Some(stripped) = self.model.strip_prefix("models/") {
            self.model = stripped.to_string();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
    }
}
