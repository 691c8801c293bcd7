// src/fetch/providers/duckduckgo.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::fetch::{settle, SearchHit, SourceFetcher, SourceKind, SourceResult};

static RE_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#)
        .expect("title regex")
});
static RE_SNIPPET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a[^>]*class="result__snippet"[^>]*>(.*?)</a>"#).expect("snippet regex")
});
static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

/// Strip tags, decode entities, collapse whitespace.
fn clean_fragment(s: &str) -> String {
    let no_tags = RE_TAGS.replace_all(s, "");
    let decoded = html_escape::decode_html_entities(&no_tags);
    RE_WS.replace_all(&decoded, " ").trim().to_string()
}

/// DuckDuckGo wraps result links in a redirect carrying the target in `uddg`.
fn unwrap_redirect(href: &str) -> String {
    let href = html_escape::decode_html_entities(href).to_string();
    if !href.contains("uddg=") {
        return href;
    }
    reqwest::Url::parse("https://duckduckgo.com")
        .and_then(|base| base.join(&href))
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(href)
}

/// Extract `{title, body, href}` entries from the HTML results page, in page order.
///
/// A result's snippet is the first `result__snippet` between its title anchor
/// and the next title anchor; results without one get an empty body.
pub fn parse_results_html(html: &str, max: usize) -> Vec<SearchHit> {
    let titles: Vec<_> = RE_TITLE.captures_iter(html).collect();

    titles
        .iter()
        .enumerate()
        .filter_map(|(i, cap)| {
            let whole = cap.get(0)?;
            let href = unwrap_redirect(cap.get(1)?.as_str());
            let title = clean_fragment(cap.get(2)?.as_str());
            if title.is_empty() {
                return None;
            }
            let block_end = titles
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(html.len(), |m| m.start());
            let body = RE_SNIPPET
                .captures(&html[whole.end()..block_end])
                .and_then(|c| c.get(1))
                .map(|m| clean_fragment(m.as_str()))
                .unwrap_or_default();
            Some(SearchHit { title, body, href })
        })
        .take(max)
        .collect()
}

/// Primary web-search strategy: general text search over the HTML endpoint.
pub struct DuckDuckGoHtml {
    client: reqwest::Client,
    url: String,
    max_results: usize,
}

impl DuckDuckGoHtml {
    pub fn new(client: reqwest::Client, url: impl Into<String>, max_results: usize) -> Self {
        Self {
            client,
            url: url.into(),
            max_results,
        }
    }

    async fn try_fetch(&self, query: &str) -> Result<Vec<SearchHit>> {
        let html = self
            .client
            .get(&self.url)
            .query(&[("q", query)])
            .send()
            .await
            .context("duckduckgo html request")?
            .error_for_status()
            .context("duckduckgo html status")?
            .text()
            .await
            .context("reading duckduckgo html body")?;

        let hits = parse_results_html(&html, self.max_results);
        // An unparseable page is usually an anti-bot interstitial, not "no results".
        if hits.is_empty() {
            bail!("no search results could be parsed");
        }
        Ok(hits)
    }
}

#[async_trait]
impl SourceFetcher for DuckDuckGoHtml {
    async fn fetch(&self, query: &str) -> SourceResult {
        let res = self.try_fetch(query).await;
        settle(SourceKind::WebSearch, self.name(), res, SourceResult::WebSearch)
    }

    fn name(&self) -> &'static str {
        "duckduckgo-html"
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
}

/// Fallback web-search strategy: the instant-answer API, folded into one entry.
pub struct DuckDuckGoInstant {
    client: reqwest::Client,
    url: String,
}

impl DuckDuckGoInstant {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn try_fetch(&self, query: &str) -> Result<Vec<SearchHit>> {
        let answer: InstantAnswer = self
            .client
            .get(&self.url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .context("duckduckgo instant-answer request")?
            .error_for_status()
            .context("duckduckgo instant-answer status")?
            .json()
            .await
            .context("decoding duckduckgo instant answer")?;

        let body = if answer.abstract_text.trim().is_empty() {
            "No summary available".to_string()
        } else {
            answer.abstract_text
        };
        Ok(vec![SearchHit {
            title: answer.heading,
            body,
            href: answer.abstract_url,
        }])
    }
}

#[async_trait]
impl SourceFetcher for DuckDuckGoInstant {
    async fn fetch(&self, query: &str) -> SourceResult {
        let res = self.try_fetch(query).await;
        settle(SourceKind::WebSearch, self.name(), res, SourceResult::WebSearch)
    }

    fn name(&self) -> &'static str {
        "duckduckgo-instant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    const PAGE: &str = r#"
<div class="result">
  <h2><a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.acme.com%2F&amp;rut=abc">Acme <b>Corp</b> &amp; Co</a></h2>
  <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">Acme makes   <b>anvils</b>.</a>
</div>
<div class="result">
  <h2><a rel="nofollow" class="result__a" href="https://example.org/acme">Acme on Example</a></h2>
  <a class="result__snippet" href="https://example.org/acme">Second snippet</a>
</div>
"#;

    #[test]
    fn parses_titles_snippets_and_unwraps_redirects() {
        let hits = parse_results_html(PAGE, 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Acme Corp & Co");
        assert_eq!(hits[0].body, "Acme makes anvils.");
        assert_eq!(hits[0].href, "https://www.acme.com/");
        assert_eq!(hits[1].href, "https://example.org/acme");
    }

    #[test]
    fn result_without_snippet_does_not_borrow_the_next_one() {
        let page = r#"
<div class="result result--ad">
  <h2><a class="result__a" href="https://first.example/">First</a></h2>
</div>
<div class="result">
  <h2><a class="result__a" href="https://second.example/">Second</a></h2>
  <a class="result__snippet" href="https://second.example/">Snippet of second</a>
</div>
"#;
        let hits = parse_results_html(page, 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "First");
        assert_eq!(hits[0].body, "");
        assert_eq!(hits[1].title, "Second");
        assert_eq!(hits[1].body, "Snippet of second");
    }

    #[test]
    fn respects_result_cap() {
        assert_eq!(parse_results_html(PAGE, 1).len(), 1);
    }

    #[tokio::test]
    async fn blocked_page_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/html/");
                then.status(200).body("<html>Please verify you are human</html>");
            })
            .await;

        let f = DuckDuckGoHtml::new(reqwest::Client::new(), server.url("/html/"), 5);
        let r = f.fetch("Acme").await;
        assert!(r.is_error());
        assert_eq!(r.kind(), SourceKind::WebSearch);
    }

    #[tokio::test]
    async fn instant_answer_uses_placeholder_for_missing_abstract() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/")
                    .query_param("q", "Acme")
                    .query_param("format", "json");
                then.status(200).json_body(json!({
                    "Heading": "Acme",
                    "AbstractText": "",
                    "AbstractURL": ""
                }));
            })
            .await;

        let f = DuckDuckGoInstant::new(reqwest::Client::new(), server.url("/"));
        let r = f.fetch("Acme").await;
        assert_eq!(
            r.hits(),
            &[SearchHit {
                title: "Acme".into(),
                body: "No summary available".into(),
                href: String::new(),
            }]
        );
    }
}
