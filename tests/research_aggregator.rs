// tests/research_aggregator.rs
//
// Aggregator behaviour with stub fetchers (no network):
// - fetch_news=false → zero articles, log ends with completion
// - primary failure escalates to the fallback (and only then)
// - news probes are merged, deduplicated by title, first-seen order, capped
// - progress log order and the "no key" notice

mod common;

use std::sync::Arc;

use common::{offline_researcher, web_ok, wiki_ok, Fixed, NewsByQuery};
use company_research_assistant::fetch::{SourceKind, SourceResult};
use company_research_assistant::research::{Researcher, MSG_COMPLETED, MSG_NEWS_SKIPPED, NEWS_CAP};

fn failing(kind: SourceKind, msg: &str) -> SourceResult {
    SourceResult::failed(kind, msg)
}

#[tokio::test]
async fn no_news_requested_means_empty_news_and_completion_last() {
    let cases = [
        (wiki_ok("Acme"), web_ok()),
        (
            failing(SourceKind::Wikipedia, "down"),
            failing(SourceKind::WebSearch, "down"),
        ),
    ];
    for (wiki, web) in cases {
        let r = Researcher::new(
            Fixed::new("wp", wiki.clone()),
            Fixed::new("wf", wiki),
            Fixed::new("dp", web.clone()),
            Fixed::new("df", web),
        )
        .with_news(NewsByQuery::new(&[("Acme", vec!["should not appear"])]));

        let bundle = r.research("Acme", false).await;
        assert!(bundle.data.news.articles().is_empty());
        assert!(!bundle.data.news.is_error());
        assert_eq!(bundle.updates.last().map(String::as_str), Some(MSG_COMPLETED));
        assert_eq!(bundle.company, "Acme");
    }
}

#[tokio::test]
async fn wikipedia_fallback_result_replaces_primary_error() {
    let primary = Fixed::new("wp", failing(SourceKind::Wikipedia, "primary broke"));
    let fallback = Fixed::new("wf", wiki_ok("Acme_Corp"));
    let r = Researcher::new(
        primary.clone(),
        fallback.clone(),
        Fixed::new("dp", web_ok()),
        Fixed::new("df", web_ok()),
    );

    let bundle = r.research("Acme", false).await;
    assert_eq!(primary.calls(), 1);
    assert_eq!(fallback.calls(), 1);
    assert!(!bundle.data.wikipedia.is_error());
    assert_eq!(bundle.data.wikipedia.wiki_summary(), Some("Acme_Corp is a company."));
    assert!(bundle
        .updates
        .iter()
        .any(|u| u == "⚠️ Wikipedia primary method failed, trying alternative..."));
}

#[tokio::test]
async fn fallback_error_is_reported_when_both_fail() {
    let r = Researcher::new(
        Fixed::new("wp", failing(SourceKind::Wikipedia, "primary broke")),
        Fixed::new("wf", failing(SourceKind::Wikipedia, "fallback broke")),
        Fixed::new("dp", failing(SourceKind::WebSearch, "blocked")),
        Fixed::new("df", failing(SourceKind::WebSearch, "instant down")),
    );

    let bundle = r.research("Acme", false).await;
    assert_eq!(bundle.data.wikipedia.error(), Some("fallback broke"));
    assert_eq!(bundle.data.web_search.error(), Some("instant down"));
}

#[tokio::test]
async fn fallback_is_not_called_when_primary_succeeds() {
    let fallback = Fixed::new("wf", wiki_ok("Other"));
    let web_fallback = Fixed::new("df", web_ok());
    let r = Researcher::new(
        Fixed::new("wp", wiki_ok("Acme")),
        fallback.clone(),
        Fixed::new("dp", web_ok()),
        web_fallback.clone(),
    );
    let bundle = r.research("Acme", false).await;
    assert_eq!(fallback.calls(), 0);
    assert_eq!(web_fallback.calls(), 0);
    assert!(!bundle.updates.iter().any(|u| u.contains("primary method failed")));
}

#[tokio::test]
async fn news_probes_merge_dedup_and_cap() {
    let news = NewsByQuery::new(&[
        ("Acme", vec!["a1", "a2", "a3", "a4"]),
        ("Acme orders", vec!["a2", "o1", "o2", "a1"]),
        ("Acme contracts", vec!["c1", "o1", "c2", "c3"]),
        ("Acme business news", vec!["b1", "b2", "b3", "c1"]),
    ]);
    let r = offline_researcher().with_news(news.clone());

    let bundle = r.research("Acme", true).await;
    let titles: Vec<&str> = bundle
        .data
        .news
        .articles()
        .iter()
        .map(|a| a.title.as_str())
        .collect();
    assert_eq!(
        titles,
        vec!["a1", "a2", "a3", "a4", "o1", "o2", "c1", "c2", "c3", "b1"]
    );
    assert_eq!(titles.len(), NEWS_CAP);
    assert_eq!(
        *news.seen.lock().unwrap(),
        vec!["Acme", "Acme orders", "Acme contracts", "Acme business news"]
    );
}

#[tokio::test]
async fn failed_news_probes_are_skipped() {
    let news = NewsByQuery::new(&[("Acme contracts", vec!["only one"])]);
    let r = offline_researcher().with_news(news);
    let bundle = r.research("Acme", true).await;
    assert_eq!(bundle.data.news.articles().len(), 1);
    assert!(bundle
        .updates
        .iter()
        .any(|u| u == "✅ Found 1 recent news articles"));
}

#[tokio::test]
async fn progress_log_has_canonical_order() {
    let news = NewsByQuery::new(&[("Acme", vec!["x"])]);
    let r = Researcher::new(
        Fixed::new("wp", failing(SourceKind::Wikipedia, "nope")),
        Fixed::new("wf", wiki_ok("Acme")),
        Fixed::new("dp", web_ok()),
        Fixed::new("df", web_ok()),
    )
    .with_news(news);

    let bundle = r.research("Acme", true).await;
    assert_eq!(
        bundle.updates,
        vec![
            "🔍 Starting research on Acme...",
            "📚 Checking Wikipedia...",
            "⚠️ Wikipedia primary method failed, trying alternative...",
            "🌐 Searching DuckDuckGo...",
            "📰 Fetching business news from GNews...",
            "✅ Found 1 recent news articles",
            MSG_COMPLETED,
        ]
    );
}

#[tokio::test]
async fn missing_news_key_is_announced_and_news_empty() {
    let r = offline_researcher();
    assert!(!r.news_enabled());
    let bundle = r.research("Acme", true).await;
    assert!(bundle.updates.iter().any(|u| u == MSG_NEWS_SKIPPED));
    assert!(bundle.data.news.articles().is_empty());
    assert_eq!(bundle.updates.last().map(String::as_str), Some(MSG_COMPLETED));
}

struct Panicking;

#[async_trait::async_trait]
impl company_research_assistant::fetch::SourceFetcher for Panicking {
    async fn fetch(&self, _query: &str) -> SourceResult {
        panic!("provider bug");
    }
    fn name(&self) -> &'static str {
        "panicking"
    }
}

#[tokio::test]
async fn panicking_source_does_not_take_siblings_down() {
    let r = Researcher::new(
        Arc::new(Panicking),
        Fixed::new("wf", wiki_ok("Acme")),
        Fixed::new("dp", web_ok()),
        Fixed::new("df", web_ok()),
    );
    let bundle = r.research("Acme", false).await;
    assert!(bundle.data.wikipedia.is_error());
    assert_eq!(bundle.data.wikipedia.kind(), SourceKind::Wikipedia);
    assert_eq!(bundle.data.web_search.hits().len(), 1);
    assert_eq!(bundle.updates.last().map(String::as_str), Some(MSG_COMPLETED));
}
