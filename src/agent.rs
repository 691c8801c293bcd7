// src/agent.rs
//! Plan and chat generation: prompt → model → (parse). Every failure comes
//! back as data so handlers can always answer with a renderable body.

use std::time::Instant;

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::fetch::ResearchData;
use crate::llm::LlmClient;
use crate::plan::{self, AccountPlan};
use crate::prompt::{self, ChatTurn};
use crate::telemetry::anon_hash;

pub const MSG_PLAN_NOT_CONFIGURED: &str = "Gemini API key not configured";
pub const MSG_PLAN_EMPTY: &str = "Failed to generate account plan";
pub const MSG_CHAT_NOT_CONFIGURED: &str =
    "Gemini API key not configured. Please check your .env file.";
pub const MSG_CHAT_EMPTY: &str = "I apologize, but I couldn't generate a response.";

/// Either the six-section plan or `{"error": ...}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanOutcome {
    Plan(AccountPlan),
    Error { error: String },
}

impl PlanOutcome {
    pub fn error(msg: impl Into<String>) -> Self {
        PlanOutcome::Error { error: msg.into() }
    }

    pub fn plan(&self) -> Option<&AccountPlan> {
        match self {
            PlanOutcome::Plan(p) => Some(p),
            PlanOutcome::Error { .. } => None,
        }
    }
}

fn record(task: &'static str, outcome: &'static str, t0: Instant) {
    counter!("llm_requests_total", "task" => task, "outcome" => outcome).increment(1);
    histogram!("llm_duration_ms", "task" => task).record(t0.elapsed().as_secs_f64() * 1_000.0);
}

pub async fn generate_account_plan(
    client: &dyn LlmClient,
    company: &str,
    data: &ResearchData,
) -> PlanOutcome {
    if !client.is_configured() {
        return PlanOutcome::error(MSG_PLAN_NOT_CONFIGURED);
    }

    let t0 = Instant::now();
    let prompt = prompt::plan_prompt(company, data);
    match client.generate(&prompt).await {
        Ok(text) if text.trim().is_empty() => {
            warn!(target: "llm", provider = client.provider_name(), %company, "empty plan reply");
            record("plan", "empty", t0);
            PlanOutcome::error(MSG_PLAN_EMPTY)
        }
        Ok(text) => {
            record("plan", "ok", t0);
            info!(target: "llm", provider = client.provider_name(), %company, chars = text.len(), "plan generated");
            PlanOutcome::Plan(plan::parse(&text))
        }
        Err(e) => {
            warn!(target: "llm", provider = client.provider_name(), %company, error = %format!("{e:#}"), "plan generation failed");
            record("plan", "error", t0);
            PlanOutcome::error(format!("Account plan generation failed: {e:#}"))
        }
    }
}

pub async fn generate_chat_response(
    client: &dyn LlmClient,
    message: &str,
    history: &[ChatTurn],
    data: Option<&ResearchData>,
) -> String {
    if !client.is_configured() {
        return MSG_CHAT_NOT_CONFIGURED.to_string();
    }

    let t0 = Instant::now();
    let msg_id = anon_hash(message);
    let prompt = prompt::chat_prompt(message, history, data);
    match client.generate(&prompt).await {
        Ok(text) if text.trim().is_empty() => {
            record("chat", "empty", t0);
            warn!(target: "llm", %msg_id, "empty chat reply");
            MSG_CHAT_EMPTY.to_string()
        }
        Ok(text) => {
            record("chat", "ok", t0);
            info!(target: "llm", %msg_id, with_research = data.is_some(), "chat answered");
            text
        }
        Err(e) => {
            record("chat", "error", t0);
            warn!(target: "llm", %msg_id, error = %format!("{e:#}"), "chat generation failed");
            format!("I encountered an error: {e:#}")
        }
    }
}
