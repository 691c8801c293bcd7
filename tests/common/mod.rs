// tests/common/mod.rs
//
// Stub fetchers and a wired router shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::Request,
    Router,
};
use serde_json::Value;
use tower::ServiceExt as _;

use company_research_assistant::api::{self, AppState};
use company_research_assistant::fetch::{
    Article, SearchHit, SourceFetcher, SourceKind, SourceResult, WikiSummary,
};
use company_research_assistant::llm::DynLlmClient;
use company_research_assistant::research::Researcher;

pub const BODY_LIMIT: usize = 1024 * 1024;

/// Always returns the same result; counts calls.
pub struct Fixed {
    name: &'static str,
    result: SourceResult,
    calls: AtomicUsize,
}

impl Fixed {
    pub fn new(name: &'static str, result: SourceResult) -> Arc<Self> {
        Arc::new(Self {
            name,
            result,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for Fixed {
    async fn fetch(&self, _query: &str) -> SourceResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
    fn name(&self) -> &'static str {
        self.name
    }
}

/// News stub answering per exact query; unknown queries yield an error.
pub struct NewsByQuery {
    answers: HashMap<String, Vec<&'static str>>,
    pub seen: std::sync::Mutex<Vec<String>>,
}

impl NewsByQuery {
    pub fn new(answers: &[(&str, Vec<&'static str>)]) -> Arc<Self> {
        Arc::new(Self {
            answers: answers
                .iter()
                .map(|(q, titles)| (q.to_string(), titles.clone()))
                .collect(),
            seen: std::sync::Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SourceFetcher for NewsByQuery {
    async fn fetch(&self, query: &str) -> SourceResult {
        self.seen.lock().unwrap().push(query.to_string());
        match self.answers.get(query) {
            Some(titles) => SourceResult::News(titles.iter().map(|t| Article::titled(*t)).collect()),
            None => SourceResult::failed(SourceKind::News, "HTTP 500"),
        }
    }
    fn name(&self) -> &'static str {
        "news-stub"
    }
}

pub fn wiki_ok(title: &str) -> SourceResult {
    SourceResult::Wikipedia(WikiSummary {
        title: title.to_string(),
        summary: format!("{title} is a company."),
        url: format!("https://en.wikipedia.org/wiki/{title}"),
        note: None,
    })
}

pub fn web_ok() -> SourceResult {
    SourceResult::WebSearch(vec![SearchHit {
        title: "Acme Corp".into(),
        body: "Official site".into(),
        href: "https://acme.example".into(),
    }])
}

/// Researcher whose sources all succeed without network.
pub fn offline_researcher() -> Researcher {
    Researcher::new(
        Fixed::new("wiki-primary", wiki_ok("Acme")),
        Fixed::new("wiki-fallback", wiki_ok("Acme")),
        Fixed::new("web-primary", web_ok()),
        Fixed::new("web-fallback", web_ok()),
    )
}

pub fn test_router(llm: DynLlmClient) -> Router {
    api::router(AppState::new(offline_researcher(), llm))
}

pub async fn post_json(app: &Router, uri: &str, body: &str) -> Value {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request");
    let resp = app.clone().oneshot(req).await.expect("router response");
    assert!(resp.status().is_success(), "{uri} should be 2xx, got {}", resp.status());
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn get_json(app: &Router, uri: &str) -> Value {
    let req = Request::get(uri).body(Body::empty()).expect("build request");
    let resp = app.clone().oneshot(req).await.expect("router response");
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
