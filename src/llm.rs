//! Generative-model adapter: provider abstraction + Gemini client.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;

/// Longest provider error body echoed back into an error message.
const ERROR_BODY_MAX: usize = 800;

pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Trait object used by the generation flows and handlers.
pub trait LlmClient: Send + Sync {
    /// Send one prompt, get the model's raw text reply.
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
    /// `false` means callers must short-circuit instead of calling `generate`.
    fn is_configured(&self) -> bool {
        true
    }
}

pub type DynLlmClient = Arc<dyn LlmClient>;

/// Factory: a Gemini client when a key is configured, otherwise a disabled client.
pub fn build_client_from_config(config: &AiConfig) -> Result<DynLlmClient> {
    if !config.is_configured() {
        return Ok(Arc::new(DisabledClient));
    }
    Ok(Arc::new(GeminiClient::new(config)?))
}

// ------------------------------------------------------------
// Gemini
// ------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}
#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}
#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}
#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}
#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}
#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Gemini `generateContent` over REST.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("company-research-assistant/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building gemini http client")?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        })
    }

    async fn generate_impl(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let req = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&req)
            .send()
            .await
            .context("gemini request")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let body = body.trim();
            if body.is_empty() {
                return Err(anyhow!("gemini error: {status}"));
            }
            let body: String = body.chars().take(ERROR_BODY_MAX).collect();
            return Err(anyhow!("gemini error: {status}\n{body}"));
        }

        let body: GeminiResponse = resp.json().await.context("decoding gemini response")?;
        Ok(body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default())
    }
}

impl LlmClient for GeminiClient {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(self.generate_impl(prompt))
    }
    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// Disabled / static clients
// ------------------------------------------------------------

/// Used when no API key is configured. Never reaches the network.
pub struct DisabledClient;

impl LlmClient for DisabledClient {
    fn generate<'a>(&'a self, _prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(async { Err(anyhow!("model API key not configured")) })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
    fn is_configured(&self) -> bool {
        false
    }
}

/// Returns a fixed reply; for tests and offline demos.
#[derive(Clone)]
pub struct StaticClient {
    pub reply: String,
}

impl StaticClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl LlmClient for StaticClient {
    fn generate<'a>(&'a self, _prompt: &'a str) -> GenerateFuture<'a> {
        let out = self.reply.clone();
        Box::pin(async move { Ok(out) })
    }
    fn provider_name(&self) -> &'static str {
        "static"
    }
}
