// tests/api_cache.rs
//
// Research cache behaviour through the router:
// - "Acme" then "acme" overwrite one case-insensitive key
// - a chat message mentioning the company sees research_available = true
// - the cached bundle reaches the chat prompt with the company patched in

mod common;

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use common::{offline_researcher, post_json};
use company_research_assistant::api::{self, AppState};
use company_research_assistant::cache::{InMemoryStore, ResearchStore};
use company_research_assistant::llm::{LlmClient, StaticClient};

/// Records every prompt it receives.
#[derive(Default)]
struct Recorder {
    prompts: Mutex<Vec<String>>,
}

impl LlmClient for Recorder {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Box::pin(async { Ok("noted".to_string()) })
    }
    fn provider_name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test]
async fn case_variants_share_one_entry_and_chat_sees_it() {
    let store = Arc::new(InMemoryStore::new());
    let state = AppState::new(offline_researcher(), Arc::new(StaticClient::new("ok")))
        .with_store(store.clone());
    let app = api::router(state);

    post_json(&app, "/api/research", r#"{"company":"Acme","fetch_news":false}"#).await;
    post_json(&app, "/api/research", r#"{"company":"acme","fetch_news":false}"#).await;
    assert_eq!(store.len(), 1);
    assert_eq!(store.keys(), vec!["acme".to_string()]);

    let chat = post_json(
        &app,
        "/api/chat",
        r#"{"message":"What does ACME sell?","conversation_history":[]}"#,
    )
    .await;
    assert_eq!(chat["research_available"], true);
    assert_eq!(chat["response"], "ok");

    let chat = post_json(&app, "/api/chat", r#"{"message":"What about Globex?"}"#).await;
    assert_eq!(chat["research_available"], false);
}

#[tokio::test]
async fn cached_research_is_quoted_in_chat_prompt() {
    let llm = Arc::new(Recorder::default());
    let app = api::router(AppState::new(offline_researcher(), llm.clone()));

    post_json(&app, "/api/research", r#"{"company":"Acme","fetch_news":false}"#).await;
    post_json(
        &app,
        "/api/chat",
        r#"{"message":"summarize acme","conversation_history":[{"role":"user","content":"hi"}]}"#,
    )
    .await;

    let prompts = llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("RESEARCH DATA FOR ACME"), "{}", prompts[0]);
    assert!(prompts[0].contains("Acme is a company."));
    assert!(prompts[0].contains("summarize acme"));
}
