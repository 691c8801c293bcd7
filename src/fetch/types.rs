// src/fetch/types.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Which external provider a result came from.
///
/// The serialized names are the field names used in the `data` bundle, so the
/// web-search source keeps its provider name (`duckduckgo`) on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "wikipedia")]
    Wikipedia,
    #[serde(rename = "duckduckgo")]
    WebSearch,
    #[serde(rename = "news", alias = "gnews")]
    News,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Wikipedia => "wikipedia",
            SourceKind::WebSearch => "duckduckgo",
            SourceKind::News => "news",
        }
    }
}

/// Encyclopedia payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WikiSummary {
    pub title: String,
    pub summary: String,
    pub url: String,
    /// Set when a disambiguation page forced a substitution.
    pub note: Option<String>,
}

/// Missing and `null` both read as the empty string.
pub(crate) fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub href: String,
}

/// A news article. Only `title` is interpreted; every other provider field is
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Article {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            extra: Map::new(),
        }
    }
}

/// Outcome of one fetch against one source: either a complete payload for its
/// kind, or an error record. Never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireResult", into = "WireResult")]
pub enum SourceResult {
    Wikipedia(WikiSummary),
    WebSearch(Vec<SearchHit>),
    News(Vec<Article>),
    Failed { source: SourceKind, error: String },
}

impl SourceResult {
    pub fn failed(source: SourceKind, error: impl Into<String>) -> Self {
        SourceResult::Failed {
            source,
            error: error.into(),
        }
    }

    pub fn empty_news() -> Self {
        SourceResult::News(Vec::new())
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            SourceResult::Wikipedia(_) => SourceKind::Wikipedia,
            SourceResult::WebSearch(_) => SourceKind::WebSearch,
            SourceResult::News(_) => SourceKind::News,
            SourceResult::Failed { source, .. } => *source,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SourceResult::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SourceResult::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn wiki_summary(&self) -> Option<&str> {
        match self {
            SourceResult::Wikipedia(w) => Some(w.summary.as_str()),
            _ => None,
        }
    }

    pub fn hits(&self) -> &[SearchHit] {
        match self {
            SourceResult::WebSearch(h) => h,
            _ => &[],
        }
    }

    pub fn articles(&self) -> &[Article] {
        match self {
            SourceResult::News(a) => a,
            _ => &[],
        }
    }
}

/// Flat JSON shape shared by every source kind. Deserialization is lenient:
/// a client echoing a bundle back with fields missing still yields a result.
#[derive(Debug, Default, Serialize, Deserialize)]
struct WireResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<SourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    results: Option<Vec<SearchHit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    articles: Option<Vec<Article>>,
}

impl From<WireResult> for SourceResult {
    fn from(w: WireResult) -> Self {
        let kind = w.source.unwrap_or(if w.results.is_some() {
            SourceKind::WebSearch
        } else if w.articles.is_some() {
            SourceKind::News
        } else {
            SourceKind::Wikipedia
        });

        if let Some(error) = w.error {
            return SourceResult::failed(kind, error);
        }

        match kind {
            SourceKind::Wikipedia => SourceResult::Wikipedia(WikiSummary {
                title: w.title.unwrap_or_default(),
                summary: w.summary.unwrap_or_default(),
                url: w.url.unwrap_or_default(),
                note: w.note,
            }),
            SourceKind::WebSearch => SourceResult::WebSearch(w.results.unwrap_or_default()),
            SourceKind::News => SourceResult::News(w.articles.unwrap_or_default()),
        }
    }
}

impl From<SourceResult> for WireResult {
    fn from(r: SourceResult) -> Self {
        let source = Some(r.kind());
        match r {
            SourceResult::Wikipedia(w) => WireResult {
                source,
                title: Some(w.title),
                summary: Some(w.summary),
                url: Some(w.url),
                note: w.note,
                ..Default::default()
            },
            SourceResult::WebSearch(results) => WireResult {
                source,
                results: Some(results),
                ..Default::default()
            },
            SourceResult::News(articles) => WireResult {
                source,
                articles: Some(articles),
                ..Default::default()
            },
            SourceResult::Failed { error, .. } => WireResult {
                source,
                error: Some(error),
                ..Default::default()
            },
        }
    }
}

fn missing_wikipedia() -> SourceResult {
    SourceResult::failed(SourceKind::Wikipedia, "not provided")
}

fn missing_web_search() -> SourceResult {
    SourceResult::failed(SourceKind::WebSearch, "not provided")
}

/// One result per source kind: the `data` part of a research response, and
/// the value kept in the research cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchData {
    #[serde(default = "missing_wikipedia")]
    pub wikipedia: SourceResult,
    #[serde(rename = "duckduckgo", default = "missing_web_search")]
    pub web_search: SourceResult,
    #[serde(default = "SourceResult::empty_news")]
    pub news: SourceResult,
    /// Patched in by callers reusing a cached entry; the aggregator never sets it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl Default for ResearchData {
    fn default() -> Self {
        Self {
            wikipedia: missing_wikipedia(),
            web_search: missing_web_search(),
            news: SourceResult::empty_news(),
            company: None,
        }
    }
}

/// Full research response: progress narrative + data + echoed company name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchBundle {
    pub updates: Vec<String>,
    pub data: ResearchData,
    pub company: String,
}
