// src/fetch/providers/gnews.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::fetch::{settle, Article, SourceFetcher, SourceKind, SourceResult};

#[derive(Debug, Deserialize)]
struct SearchResp {
    #[serde(default)]
    articles: Vec<Article>,
}

/// GNews search. English only; one call per query.
pub struct GNewsProvider {
    client: reqwest::Client,
    url: String,
    api_key: String,
    max_results: usize,
}

impl GNewsProvider {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        api_key: impl Into<String>,
        max_results: usize,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
            max_results,
        }
    }

    async fn try_fetch(&self, query: &str) -> Result<Vec<Article>> {
        if self.api_key.trim().is_empty() {
            bail!("Missing API key.");
        }
        let max = self.max_results.to_string();
        let resp: SearchResp = self
            .client
            .get(&self.url)
            .query(&[
                ("q", query),
                ("token", self.api_key.as_str()),
                ("lang", "en"),
                ("max", max.as_str()),
            ])
            .send()
            .await
            .context("gnews request")?
            .error_for_status()
            .context("gnews status")?
            .json()
            .await
            .context("decoding gnews response")?;
        Ok(resp.articles)
    }
}

#[async_trait]
impl SourceFetcher for GNewsProvider {
    async fn fetch(&self, query: &str) -> SourceResult {
        let res = self.try_fetch(query).await;
        settle(SourceKind::News, self.name(), res, SourceResult::News)
    }

    fn name(&self) -> &'static str {
        "gnews"
    }
}
