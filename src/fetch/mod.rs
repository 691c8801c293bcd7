// src/fetch/mod.rs
pub mod providers;
pub mod types;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;

use crate::config::SourcesConfig;
pub use crate::fetch::types::{
    Article, ResearchBundle, ResearchData, SearchHit, SourceKind, SourceResult, WikiSummary,
};

/// Maximum summary length (in characters) before the ellipsis marker is added.
pub const SUMMARY_MAX_CHARS: usize = 500;

const CONNECT_TIMEOUT_MAX: Duration = Duration::from_secs(4);

/// One strategy for one source kind.
///
/// Implementations never fail past this boundary: every transport, status or
/// decoding problem comes back as `SourceResult::Failed`.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, query: &str) -> SourceResult;
    fn name(&self) -> &'static str;
}

/// Shared HTTP client for all providers: one user agent, hard per-request timeout.
pub fn http_client(cfg: &SourcesConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(cfg.user_agent.as_str())
        .connect_timeout(cfg.request_timeout().min(CONNECT_TIMEOUT_MAX))
        .timeout(cfg.request_timeout())
        .build()
        .context("building provider http client")
}

/// Convert a provider's internal result into the boundary record, logging failures.
pub(crate) fn settle<T>(
    kind: SourceKind,
    provider: &'static str,
    res: Result<T>,
    wrap: impl FnOnce(T) -> SourceResult,
) -> SourceResult {
    match res {
        Ok(v) => wrap(v),
        Err(e) => {
            tracing::warn!(target: "fetch", error = %format!("{e:#}"), provider, "provider error");
            counter!("source_fetch_errors_total", "source" => kind.as_str()).increment(1);
            SourceResult::failed(kind, format!("{e:#}"))
        }
    }
}

/// Cap at `SUMMARY_MAX_CHARS` characters, appending `...` when cut.
pub fn truncate_summary(s: &str) -> String {
    if s.chars().count() > SUMMARY_MAX_CHARS {
        let mut out: String = s.chars().take(SUMMARY_MAX_CHARS).collect();
        out.push_str("...");
        out
    } else {
        s.to_string()
    }
}
