// src/lib.rs
// Public library surface for the binary and the integration tests.

pub mod agent;
pub mod api;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod intent;
pub mod llm;
pub mod metrics;
pub mod plan;
pub mod prompt;
pub mod research;
pub mod telemetry;

use axum::Router;

pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;

/// Build the full in-process app from configuration (defaults → TOML → env).
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AppConfig::load()?;
    app_with(&cfg)
}

/// Wire real providers and the model client from an explicit config.
pub fn app_with(cfg: &AppConfig) -> anyhow::Result<Router> {
    let researcher = research::Researcher::from_config(&cfg.sources)?;
    let llm = llm::build_client_from_config(&cfg.ai)?;
    tracing::info!(
        news = researcher.news_enabled(),
        llm = llm.provider_name(),
        llm_configured = llm.is_configured(),
        "app wired"
    );
    Ok(app_from_state(AppState::new(researcher, llm)))
}

/// API routes plus `/metrics` when the Prometheus recorder is ours.
pub fn app_from_state(state: AppState) -> Router {
    let app = api::router(state);
    match metrics::install() {
        Some(handle) => app.merge(metrics::router(handle)),
        None => app,
    }
}
