// src/api.rs
//! HTTP surface. Every handler answers 200 with a JSON body; failures are
//! reported inside the body in the shape the UI already renders.

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::agent::{self, PlanOutcome};
use crate::cache::{InMemoryStore, ResearchStore};
use crate::fetch::{ResearchBundle, ResearchData};
use crate::intent::{self, CompanyNameExtractor, KeywordExtractor};
use crate::llm::DynLlmClient;
use crate::prompt::ChatTurn;
use crate::research::Researcher;
use crate::telemetry::anon_hash;

#[derive(Clone)]
pub struct AppState {
    pub researcher: Arc<Researcher>,
    pub llm: DynLlmClient,
    pub store: Arc<dyn ResearchStore>,
    pub extractor: Arc<dyn CompanyNameExtractor>,
}

impl AppState {
    /// In-memory cache and the keyword extractor; swap either with the builders.
    pub fn new(researcher: Researcher, llm: DynLlmClient) -> Self {
        Self {
            researcher: Arc::new(researcher),
            llm,
            store: Arc::new(InMemoryStore::new()),
            extractor: Arc::new(KeywordExtractor),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ResearchStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn CompanyNameExtractor>) -> Self {
        self.extractor = extractor;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/research", post(research))
        .route("/api/chat", post(chat))
        .route("/api/generate-account-plan", post(generate_account_plan))
        .route("/api/intent", post(classify_intent))
        .layer(CatchPanicLayer::custom(on_panic))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn on_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(target: "api", %detail, "handler panicked");
    (StatusCode::OK, Json(json!({ "error": format!("Internal error: {detail}") }))).into_response()
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Company Research Assistant API is running" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

// ---- research ----

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ResearchRequest {
    company: String,
    #[serde(default = "default_true")]
    fetch_news: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ResearchReply {
    Bundle(ResearchBundle),
    Failed {
        updates: Vec<String>,
        data: Map<String, Value>,
        company: String,
    },
}

impl ResearchReply {
    fn failed(msg: impl std::fmt::Display, company: &str) -> Self {
        ResearchReply::Failed {
            updates: vec![format!("Error: {msg}")],
            data: Map::new(),
            company: company.to_string(),
        }
    }
}

async fn research(
    State(state): State<AppState>,
    payload: Result<Json<ResearchRequest>, JsonRejection>,
) -> Json<ResearchReply> {
    let ResearchRequest {
        company,
        fetch_news,
    } = match payload {
        Ok(Json(req)) => req,
        Err(rej) => {
            warn!(target: "api", error = %rej.body_text(), "bad research request");
            return Json(ResearchReply::failed(rej.body_text(), ""));
        }
    };

    let researcher = state.researcher.clone();
    let query = company.clone();
    let task = tokio::spawn(async move { researcher.research(&query, fetch_news).await });
    match task.await {
        Ok(bundle) => {
            state.store.put(&bundle.company, bundle.data.clone());
            Json(ResearchReply::Bundle(bundle))
        }
        Err(e) => {
            warn!(target: "api", %company, error = %e, "research task failed");
            Json(ResearchReply::failed(e, &company))
        }
    }
}

// ---- chat ----

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    conversation_history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
struct ChatReply {
    response: String,
    research_available: bool,
}

impl ChatReply {
    fn failed(msg: impl std::fmt::Display) -> Self {
        Self {
            response: format!("Sorry, I encountered an error: {msg}"),
            research_available: false,
        }
    }
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ChatReply> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rej) => {
            warn!(target: "api", error = %rej.body_text(), "bad chat request");
            return Json(ChatReply::failed(rej.body_text()));
        }
    };

    let research = state.store.find_mentioned(&req.message).map(|(key, mut data)| {
        data.company = Some(key);
        data
    });
    let research_available = research.is_some();
    info!(
        target: "api",
        msg_id = %anon_hash(&req.message),
        research_available,
        "chat request"
    );

    let llm = state.llm.clone();
    let task = tokio::spawn(async move {
        agent::generate_chat_response(
            llm.as_ref(),
            &req.message,
            &req.conversation_history,
            research.as_ref(),
        )
        .await
    });
    match task.await {
        Ok(response) => Json(ChatReply {
            response,
            research_available,
        }),
        Err(e) => {
            warn!(target: "api", error = %e, "chat task failed");
            Json(ChatReply::failed(e))
        }
    }
}

// ---- account plan ----

#[derive(Debug, Deserialize)]
struct PlanRequest {
    company: String,
    #[serde(default)]
    research_data: ResearchData,
}

fn plan_failed(msg: impl std::fmt::Display) -> PlanOutcome {
    PlanOutcome::error(format!("Failed to generate account plan: {msg}"))
}

async fn generate_account_plan(
    State(state): State<AppState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Json<PlanOutcome> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rej) => {
            warn!(target: "api", error = %rej.body_text(), "bad plan request");
            return Json(plan_failed(rej.body_text()));
        }
    };

    let llm = state.llm.clone();
    let company = req.company.clone();
    let task = tokio::spawn(async move {
        agent::generate_account_plan(llm.as_ref(), &req.company, &req.research_data).await
    });
    match task.await {
        Ok(outcome) => Json(outcome),
        Err(e) => {
            warn!(target: "api", %company, error = %e, "plan task failed");
            Json(plan_failed(e))
        }
    }
}

// ---- intent ----

#[derive(Debug, Deserialize)]
struct IntentRequest {
    message: String,
}

#[derive(Debug, Default, Serialize)]
struct IntentReply {
    company: Option<String>,
    research_request: bool,
    account_plan_request: bool,
}

async fn classify_intent(
    State(state): State<AppState>,
    payload: Result<Json<IntentRequest>, JsonRejection>,
) -> Json<IntentReply> {
    let Ok(Json(req)) = payload else {
        return Json(IntentReply::default());
    };
    Json(IntentReply {
        company: state.extractor.extract(&req.message),
        research_request: intent::is_research_request(&req.message),
        account_plan_request: intent::is_account_plan_request(&req.message),
    })
}
