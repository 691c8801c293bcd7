// tests/e2e_plan.rs
//
// research("Acme") → generate-account-plan("Acme", <that data>) through the
// router, with a static model reply. The plan must equal the parse of the reply.

mod common;

use std::sync::Arc;

use common::{post_json, test_router};
use company_research_assistant::llm::StaticClient;
use company_research_assistant::plan::{self, AccountPlan};

const REPLY: &str = "EXECUTIVE SUMMARY:\nAcme sells anvils.\n\n\
COMPANY OVERVIEW:\nFounded 1949, HQ in Arizona.\n\n\
KEY CONTACTS:\nHead of Procurement.\n\n\
STRENGTHS & WEAKNESSES:\nBrand recall; product safety record.\n\n\
OPPORTUNITIES & RISKS:\nDesert logistics; litigation.\n\n\
ENGAGEMENT PLAN:\nOffer a safety audit pilot.\n";

#[tokio::test]
async fn research_then_plan_yields_parsed_reply() {
    let app = test_router(Arc::new(StaticClient::new(REPLY)));

    let bundle = post_json(&app, "/api/research", r#"{"company":"Acme","fetch_news":false}"#).await;
    let data = bundle["data"].clone();
    assert!(data.is_object());

    let body = serde_json::json!({"company": "Acme", "research_data": data});
    let got = post_json(&app, "/api/generate-account-plan", &body.to_string()).await;
    let got: AccountPlan = serde_json::from_value(got).expect("six-key plan");

    assert_eq!(got, plan::parse(REPLY));
    assert_eq!(got.executive_summary, "Acme sells anvils.");
    assert_eq!(got.engagement_plan, "Offer a safety audit pilot.");
}

#[tokio::test]
async fn plan_accepts_partial_research_data() {
    let app = test_router(Arc::new(StaticClient::new(REPLY)));
    let body = r#"{"company":"Acme","research_data":{"wikipedia":{"error":"x"}}}"#;
    let got = post_json(&app, "/api/generate-account-plan", body).await;
    assert_eq!(got["key_contacts"], "Head of Procurement.");
}

#[tokio::test]
async fn plan_tolerates_null_fields_in_echoed_research() {
    let app = test_router(Arc::new(StaticClient::new(REPLY)));
    let body = serde_json::json!({
        "company": "Acme",
        "research_data": {
            "news": {"source": "news", "articles": [{"title": null, "url": "u"}]},
            "duckduckgo": {"source": "duckduckgo", "results": [{"title": null, "body": "b", "href": null}]}
        }
    });
    let got = post_json(&app, "/api/generate-account-plan", &body.to_string()).await;
    assert!(got.get("error").is_none(), "{got}");
    assert_eq!(got["executive_summary"], "Acme sells anvils.");
}
