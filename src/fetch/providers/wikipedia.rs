// src/fetch/providers/wikipedia.rs
//! Encyclopedia strategies: MediaWiki action API (primary) and the REST
//! summary endpoint (fallback).

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::fetch::{settle, truncate_summary, SourceFetcher, SourceKind, SourceResult, WikiSummary};

/// How many disambiguation candidates are quoted in the error message.
const AMBIGUITY_DETAIL_MAX: usize = 5;

#[derive(Debug, Deserialize)]
struct SearchResp {
    query: Option<SearchQuery>,
}
#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchEntry>,
}
#[derive(Debug, Deserialize)]
struct SearchEntry {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PagesResp {
    query: Option<PagesQuery>,
}
#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<Page>,
}
#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    fullurl: Option<String>,
    #[serde(default)]
    pageprops: Option<PageProps>,
}
#[derive(Debug, Deserialize)]
struct PageProps {
    disambiguation: Option<serde_json::Value>,
}
#[derive(Debug, Deserialize)]
struct ParseResp {
    parse: Option<ParsedPage>,
}
#[derive(Debug, Deserialize)]
struct ParsedPage {
    #[serde(default)]
    text: String,
}

static RE_LI_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<li\b([^>]*)>"#).expect("li regex"));
static RE_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<a\s([^>]*)>(.*?)</a>"#).expect("anchor regex"));
static RE_HREF: Lazy<Regex> = Lazy::new(|| Regex::new(r#"href="([^"]*)""#).expect("href regex"));
static RE_TITLE_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"title="([^"]*)""#).expect("title regex"));
static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));

/// First article link of every list item, in document order. Table-of-contents
/// items and red links are skipped.
pub fn disambiguation_options(html: &str) -> Vec<String> {
    let opens: Vec<_> = RE_LI_OPEN.captures_iter(html).collect();
    let mut out: Vec<String> = Vec::new();
    for (i, cap) in opens.iter().enumerate() {
        let (Some(whole), Some(attrs)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        if attrs.as_str().contains("tocsection") {
            continue;
        }
        let next = opens
            .get(i + 1)
            .and_then(|c| c.get(0))
            .map_or(html.len(), |m| m.start());
        let item = &html[whole.end()..next];
        let item = item.find("</li>").map_or(item, |end| &item[..end]);

        let Some(anchor) = RE_ANCHOR.captures(item) else {
            continue;
        };
        let attrs = anchor.get(1).map_or("", |m| m.as_str());
        let href = RE_HREF
            .captures(attrs)
            .and_then(|c| c.get(1))
            .map_or("", |m| m.as_str());
        if !href.starts_with("/wiki/") || href.contains("redlink=1") {
            continue;
        }
        let title = RE_TITLE_ATTR
            .captures(attrs)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| {
                RE_TAGS
                    .replace_all(anchor.get(2).map_or("", |m| m.as_str()), "")
                    .into_owned()
            });
        let title = html_escape::decode_html_entities(title.trim()).into_owned();
        if !title.is_empty() && !out.contains(&title) {
            out.push(title);
        }
    }
    out
}

enum PageLookup {
    Found(WikiSummary),
    Ambiguous { title: String, options: Vec<String> },
}

/// Primary strategy: free-text search, top hit, page extract.
pub struct WikipediaSearch {
    client: reqwest::Client,
    api_url: String,
}

impl WikipediaSearch {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    async fn query<T: for<'de> Deserialize<'de>>(&self, params: &[(&str, &str)]) -> Result<T> {
        let resp = self
            .client
            .get(&self.api_url)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await
            .context("wikipedia api request")?
            .error_for_status()
            .context("wikipedia api status")?;
        resp.json::<T>().await.context("decoding wikipedia api response")
    }

    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let resp: SearchResp = self
            .query(&[
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", "10"),
                ("srprop", ""),
            ])
            .await?;
        Ok(resp
            .query
            .map(|q| q.search.into_iter().map(|e| e.title).collect())
            .unwrap_or_default())
    }

    async fn lookup_page(&self, title: &str) -> Result<PageLookup> {
        let resp: PagesResp = self
            .query(&[
                ("prop", "extracts|info|pageprops"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("inprop", "url"),
                ("ppprop", "disambiguation"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;
        let page = resp
            .query
            .and_then(|q| q.pages.into_iter().next())
            .ok_or_else(|| anyhow!("Page id \"{title}\" does not match any pages"))?;
        if page.missing || page.invalid {
            bail!("Page id \"{title}\" does not match any pages");
        }

        let ambiguous = page
            .pageprops
            .as_ref()
            .is_some_and(|p| p.disambiguation.is_some());
        if ambiguous {
            let options = self.candidates(&page.title).await?;
            return Ok(PageLookup::Ambiguous {
                title: page.title,
                options,
            });
        }

        let summary = page.extract.unwrap_or_default();
        let url = page.fullurl.unwrap_or_default();
        Ok(PageLookup::Found(WikiSummary {
            title: page.title,
            summary: truncate_summary(summary.trim()),
            url,
            note: None,
        }))
    }

    /// Candidates of a disambiguation page as listed on the rendered page.
    async fn candidates(&self, title: &str) -> Result<Vec<String>> {
        let resp: ParseResp = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "parse"),
                ("format", "json"),
                ("formatversion", "2"),
                ("prop", "text"),
                ("redirects", "1"),
                ("page", title),
            ])
            .send()
            .await
            .context("wikipedia parse request")?
            .error_for_status()
            .context("wikipedia parse status")?
            .json()
            .await
            .context("decoding wikipedia parse response")?;
        Ok(resp
            .parse
            .map(|p| disambiguation_options(&p.text))
            .unwrap_or_default())
    }

    async fn try_fetch(&self, query: &str) -> Result<WikiSummary> {
        let top = self
            .search(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No Wikipedia page found"))?;

        let (title, options) = match self.lookup_page(&top).await? {
            PageLookup::Found(page) => return Ok(page),
            PageLookup::Ambiguous { title, options } => (title, options),
        };

        let detail = format!(
            "\"{title}\" may refer to: {}",
            options
                .iter()
                .take(AMBIGUITY_DETAIL_MAX)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
        let Some(first) = options.first() else {
            bail!("Disambiguation error: {detail}");
        };

        tracing::debug!(target: "fetch", from = %title, to = %first, "wikipedia disambiguation retry");
        match self.lookup_page(first).await {
            Ok(PageLookup::Found(mut page)) => {
                page.note = Some(format!("Disambiguated from {query} to {first}"));
                Ok(page)
            }
            _ => bail!("Disambiguation error: {detail}"),
        }
    }
}

#[async_trait]
impl SourceFetcher for WikipediaSearch {
    async fn fetch(&self, query: &str) -> SourceResult {
        let res = self.try_fetch(query).await;
        settle(SourceKind::Wikipedia, self.name(), res, SourceResult::Wikipedia)
    }

    fn name(&self) -> &'static str {
        "wikipedia-search"
    }
}

#[derive(Debug, Deserialize)]
struct RestSummary {
    #[serde(default)]
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    content_urls: Option<ContentUrls>,
}
#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<DesktopUrls>,
}
#[derive(Debug, Deserialize)]
struct DesktopUrls {
    page: Option<String>,
}

/// Fallback strategy: REST summary keyed by the underscore-joined title.
pub struct WikipediaRest {
    client: reqwest::Client,
    base_url: String,
}

impl WikipediaRest {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn summary_url(&self, query: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("invalid wikipedia rest url {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("wikipedia rest url cannot take a path"))?
            .pop_if_empty()
            .push(&query.trim().replace(' ', "_"));
        Ok(url)
    }

    async fn try_fetch(&self, query: &str) -> Result<WikiSummary> {
        let url = self.summary_url(query)?;
        let body: RestSummary = self
            .client
            .get(url)
            .send()
            .await
            .context("wikipedia rest request")?
            .error_for_status()
            .context("wikipedia rest status")?
            .json()
            .await
            .context("decoding wikipedia rest summary")?;

        let summary = body
            .extract
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "No Wikipedia summary found.".to_string());
        let url = body
            .content_urls
            .and_then(|c| c.desktop)
            .and_then(|d| d.page)
            .unwrap_or_default();
        Ok(WikiSummary {
            title: body.title,
            summary: truncate_summary(&summary),
            url,
            note: None,
        })
    }
}

#[async_trait]
impl SourceFetcher for WikipediaRest {
    async fn fetch(&self, query: &str) -> SourceResult {
        let res = self.try_fetch(query).await;
        settle(SourceKind::Wikipedia, self.name(), res, SourceResult::Wikipedia)
    }

    fn name(&self) -> &'static str {
        "wikipedia-rest"
    }
}
