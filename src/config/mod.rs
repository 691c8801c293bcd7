// src/config/mod.rs
//! Layered configuration: defaults, then an optional TOML file, then env vars.

pub mod ai;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use ai::AiConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/research.toml";
pub const ENV_CONFIG_PATH: &str = "RESEARCH_CONFIG_PATH";

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_web_max() -> usize {
    5
}
fn default_news_max() -> usize {
    5
}
fn default_user_agent() -> String {
    "CompanyResearchBot/1.0".to_string()
}
fn default_wikipedia_api_url() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}
fn default_wikipedia_rest_url() -> String {
    "https://en.wikipedia.org/api/rest_v1/page/summary".to_string()
}
fn default_duckduckgo_html_url() -> String {
    "https://html.duckduckgo.com/html/".to_string()
}
fn default_duckduckgo_api_url() -> String {
    "https://api.duckduckgo.com/".to_string()
}
fn default_gnews_url() -> String {
    "https://gnews.io/api/v4/search".to_string()
}

/// Endpoints, caps and credentials for the research providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_web_max")]
    pub web_max_results: usize,
    #[serde(default = "default_news_max")]
    pub news_max_results: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_wikipedia_api_url")]
    pub wikipedia_api_url: String,
    #[serde(default = "default_wikipedia_rest_url")]
    pub wikipedia_rest_url: String,
    #[serde(default = "default_duckduckgo_html_url")]
    pub duckduckgo_html_url: String,
    #[serde(default = "default_duckduckgo_api_url")]
    pub duckduckgo_api_url: String,
    #[serde(default = "default_gnews_url")]
    pub gnews_url: String,
    /// GNews token. Empty means news is skipped.
    #[serde(default)]
    pub news_api_key: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            web_max_results: default_web_max(),
            news_max_results: default_news_max(),
            user_agent: default_user_agent(),
            wikipedia_api_url: default_wikipedia_api_url(),
            wikipedia_rest_url: default_wikipedia_rest_url(),
            duckduckgo_html_url: default_duckduckgo_html_url(),
            duckduckgo_api_url: default_duckduckgo_api_url(),
            gnews_url: default_gnews_url(),
            news_api_key: String::new(),
        }
    }
}

impl SourcesConfig {
    /// Per-request fetch timeout; zero means "unset" and falls back to the default.
    pub fn request_timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => Duration::from_secs(default_timeout_secs()),
            n => Duration::from_secs(n),
        }
    }

    pub(crate) fn sanitize(&mut self) {
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
    }

    pub fn news_key(&self) -> Option<&str> {
        let k = self.news_api_key.trim();
        (!k.is_empty()).then_some(k)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

impl AppConfig {
    /// Defaults → TOML file (`$RESEARCH_CONFIG_PATH` or `config/research.toml`) → env.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!(
                        "{ENV_CONFIG_PATH} points to non-existent path {}",
                        pb.display()
                    ));
                }
                Self::load_from_file(&pb)?
            }
            Err(_) => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load_from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env(|k| std::env::var(k).ok())?;
        cfg.sources.sanitize();
        cfg.ai.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Overlay environment variables. `lookup` is injectable so tests need not
    /// touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GEMINI_API_KEY") {
            self.ai.api_key = v;
        }
        if let Some(v) = lookup("GEMINI_MODEL").filter(|v| !v.trim().is_empty()) {
            self.ai.model = v;
        }
        if let Some(v) = lookup("LLM_TIMEOUT_SECS") {
            self.ai.timeout_secs = parse_num(&v, "LLM_TIMEOUT_SECS")?;
        }
        if let Some(v) = lookup("NEWSAPI_KEY") {
            self.sources.news_api_key = v;
        }
        if let Some(v) = lookup("FETCH_TIMEOUT_SECS") {
            self.sources.timeout_secs = parse_num(&v, "FETCH_TIMEOUT_SECS")?;
        }
        if let Some(v) = lookup("BACKEND_HOST").filter(|v| !v.trim().is_empty()) {
            self.server.host = v;
        }
        if let Some(v) = lookup("BACKEND_PORT") {
            self.server.port = parse_num(&v, "BACKEND_PORT")?;
        }
        Ok(())
    }
}

fn parse_num<T>(raw: &str, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("invalid value for {name}: {raw:?}"))
}
