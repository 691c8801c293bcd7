//! Company Research Assistant: binary entrypoint.
//! Loads `.env` and config, wires providers, serves the axum router.

use anyhow::Context;
use company_research_assistant::{app_with, telemetry, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Local/dev convenience; absent file is fine.
    let _ = dotenvy::dotenv();
    telemetry::init();

    let cfg = AppConfig::load().context("loading configuration")?;
    if !cfg.ai.is_configured() {
        tracing::warn!("GEMINI_API_KEY not set; plan and chat will answer with a configuration notice");
    }
    if cfg.sources.news_key().is_none() {
        tracing::warn!("NEWSAPI_KEY not set; news will be skipped");
    }

    let app = app_with(&cfg)?;
    let addr = cfg.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
