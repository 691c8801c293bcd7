// src/research.rs
//! Aggregator: runs every source for one company with primary/fallback
//! escalation, merges the news probes, and narrates progress.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use metrics::{counter, histogram};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SourcesConfig;
use crate::fetch::providers::{
    DuckDuckGoHtml, DuckDuckGoInstant, GNewsProvider, WikipediaRest, WikipediaSearch,
};
use crate::fetch::{
    http_client, Article, ResearchBundle, ResearchData, SourceFetcher, SourceKind, SourceResult,
};

/// Articles kept after merging all news probes.
pub const NEWS_CAP: usize = 10;

/// Qualifiers appended to the company name; the bare name is always probed first.
const NEWS_QUALIFIERS: [&str; 3] = ["orders", "contracts", "business news"];

pub const MSG_NEWS_SKIPPED: &str = "⚠️ GNews API key not configured - skipping news";
pub const MSG_COMPLETED: &str = "✅ Research completed!";

/// A primary strategy and the one tried only when it errors.
#[derive(Clone)]
pub struct FallbackPair {
    label: &'static str,
    start_note: &'static str,
    primary: Arc<dyn SourceFetcher>,
    fallback: Arc<dyn SourceFetcher>,
}

impl FallbackPair {
    pub fn new(
        label: &'static str,
        start_note: &'static str,
        primary: Arc<dyn SourceFetcher>,
        fallback: Arc<dyn SourceFetcher>,
    ) -> Self {
        Self {
            label,
            start_note,
            primary,
            fallback,
        }
    }

    async fn run(&self, query: &str) -> (Vec<String>, SourceResult) {
        let mut log = vec![self.start_note.to_string()];
        let first = self.primary.fetch(query).await;
        if !first.is_error() {
            return (log, first);
        }

        debug!(
            target: "research",
            primary = self.primary.name(),
            fallback = self.fallback.name(),
            "primary failed, escalating"
        );
        counter!("source_fallbacks_total", "source" => first.kind().as_str()).increment(1);
        log.push(format!(
            "⚠️ {} primary method failed, trying alternative...",
            self.label
        ));
        (log, self.fallback.fetch(query).await)
    }
}

pub struct Researcher {
    wikipedia: FallbackPair,
    web_search: FallbackPair,
    /// `None` when no news key is configured: the source is skipped, never called.
    news: Option<Arc<dyn SourceFetcher>>,
}

impl Researcher {
    pub fn new(
        wiki_primary: Arc<dyn SourceFetcher>,
        wiki_fallback: Arc<dyn SourceFetcher>,
        web_primary: Arc<dyn SourceFetcher>,
        web_fallback: Arc<dyn SourceFetcher>,
    ) -> Self {
        Self {
            wikipedia: FallbackPair::new(
                "Wikipedia",
                "📚 Checking Wikipedia...",
                wiki_primary,
                wiki_fallback,
            ),
            web_search: FallbackPair::new(
                "DuckDuckGo",
                "🌐 Searching DuckDuckGo...",
                web_primary,
                web_fallback,
            ),
            news: None,
        }
    }

    pub fn with_news(mut self, news: Arc<dyn SourceFetcher>) -> Self {
        self.news = Some(news);
        self
    }

    /// Wire the real providers from configuration.
    pub fn from_config(cfg: &SourcesConfig) -> Result<Self> {
        let client = http_client(cfg)?;
        let researcher = Self::new(
            Arc::new(WikipediaSearch::new(client.clone(), &cfg.wikipedia_api_url)),
            Arc::new(WikipediaRest::new(client.clone(), &cfg.wikipedia_rest_url)),
            Arc::new(DuckDuckGoHtml::new(
                client.clone(),
                &cfg.duckduckgo_html_url,
                cfg.web_max_results,
            )),
            Arc::new(DuckDuckGoInstant::new(client.clone(), &cfg.duckduckgo_api_url)),
        );
        Ok(match cfg.news_key() {
            Some(key) => researcher.with_news(Arc::new(GNewsProvider::new(
                client,
                &cfg.gnews_url,
                key,
                cfg.news_max_results,
            ))),
            None => researcher,
        })
    }

    pub fn news_enabled(&self) -> bool {
        self.news.is_some()
    }

    /// Research one company. Never fails: source errors end up inside the bundle.
    ///
    /// Each source runs in its own task so a panicking provider only costs its
    /// own slot; the progress log is assembled afterwards in the fixed order
    /// encyclopedia → web search → news.
    pub async fn research(&self, company: &str, fetch_news: bool) -> ResearchBundle {
        let t0 = Instant::now();
        counter!("research_requests_total").increment(1);
        info!(target: "research", %company, fetch_news, "research started");

        let wiki_task = spawn_pair(self.wikipedia.clone(), company);
        let web_task = spawn_pair(self.web_search.clone(), company);
        let news_task = {
            let news = self.news.clone();
            let q = company.to_string();
            tokio::spawn(async move { collect_news(news, &q, fetch_news).await })
        };

        let ((wiki_log, wikipedia), (web_log, web_search), (news_log, news)) = tokio::join!(
            join_isolated(wiki_task, SourceKind::Wikipedia),
            join_isolated(web_task, SourceKind::WebSearch),
            join_isolated(news_task, SourceKind::News),
        );

        let mut updates = Vec::with_capacity(2 + wiki_log.len() + web_log.len() + news_log.len());
        updates.push(format!("🔍 Starting research on {company}..."));
        updates.extend(wiki_log);
        updates.extend(web_log);
        updates.extend(news_log);
        updates.push(MSG_COMPLETED.to_string());

        info!(
            target: "research",
            %company,
            wikipedia_ok = !wikipedia.is_error(),
            web_ok = !web_search.is_error(),
            articles = news.articles().len(),
            ms = t0.elapsed().as_millis() as u64,
            "research finished"
        );

        ResearchBundle {
            updates,
            data: ResearchData {
                wikipedia,
                web_search,
                news,
                company: None,
            },
            company: company.to_string(),
        }
    }
}

type SourceTask = JoinHandle<(Vec<String>, SourceResult)>;

fn spawn_pair(pair: FallbackPair, company: &str) -> SourceTask {
    let q = company.to_string();
    tokio::spawn(async move { pair.run(&q).await })
}

async fn join_isolated(task: SourceTask, kind: SourceKind) -> (Vec<String>, SourceResult) {
    match task.await {
        Ok(out) => out,
        Err(e) => {
            warn!(target: "research", source = kind.as_str(), error = %e, "source task aborted");
            counter!("source_fetch_errors_total", "source" => kind.as_str()).increment(1);
            (Vec::new(), SourceResult::failed(kind, format!("source task failed: {e}")))
        }
    }
}

async fn collect_news(
    news: Option<Arc<dyn SourceFetcher>>,
    company: &str,
    fetch_news: bool,
) -> (Vec<String>, SourceResult) {
    if !fetch_news {
        return (Vec::new(), SourceResult::empty_news());
    }
    let Some(news) = news else {
        return (vec![MSG_NEWS_SKIPPED.to_string()], SourceResult::empty_news());
    };

    let mut log = vec!["📰 Fetching business news from GNews...".to_string()];
    let mut all = Vec::new();
    for q in news_queries(company) {
        match news.fetch(&q).await {
            SourceResult::News(mut articles) => all.append(&mut articles),
            other => {
                debug!(target: "research", query = %q, error = ?other.error(), "news probe skipped");
            }
        }
    }

    let articles = dedup_articles(all, NEWS_CAP);
    histogram!("news_articles_kept").record(articles.len() as f64);
    log.push(format!("✅ Found {} recent news articles", articles.len()));
    (log, SourceResult::News(articles))
}

/// The four probes: bare name, then each business qualifier.
pub fn news_queries(company: &str) -> Vec<String> {
    std::iter::once(company.to_string())
        .chain(NEWS_QUALIFIERS.iter().map(|q| format!("{company} {q}")))
        .collect()
}

/// Drop untitled articles and repeated titles (exact match), keep first-seen
/// order, then cap.
pub fn dedup_articles(articles: Vec<Article>, cap: usize) -> Vec<Article> {
    let mut seen: HashSet<String> = HashSet::new();
    articles
        .into_iter()
        .filter(|a| !a.title.is_empty() && seen.insert(a.title.clone()))
        .take(cap)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn news_queries_are_in_fixed_order() {
        assert_eq!(
            news_queries("Acme"),
            vec![
                "Acme".to_string(),
                "Acme orders".into(),
                "Acme contracts".into(),
                "Acme business news".into()
            ]
        );
    }

    #[test]
    fn dedup_keeps_first_seen_and_caps() {
        let titles = ["a", "b", "a", "", "c", "b", "d"];
        let arts = titles.iter().map(|t| Article::titled(*t)).collect();
        let out = dedup_articles(arts, 3);
        let got: Vec<_> = out.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(got, vec!["a", "b", "c"]);
    }

    #[test]
    fn dedup_is_case_sensitive_exact_match() {
        let arts = vec![Article::titled("Acme"), Article::titled("ACME")];
        assert_eq!(dedup_articles(arts, 10).len(), 2);
    }
}
