use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<Option<PrometheusHandle>> = OnceCell::new();

/// Install the Prometheus recorder once per process. Returns `None` when some
/// other recorder already owns the global slot.
pub fn install() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                describe();
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(error = %e, "prometheus recorder not installed");
                None
            }
        })
        .clone()
}

fn describe() {
    describe_counter!("research_requests_total", "Research invocations.");
    describe_counter!(
        "source_fetch_errors_total",
        "Provider calls that ended in an error record."
    );
    describe_counter!(
        "source_fallbacks_total",
        "Primary strategy failures that escalated to the fallback."
    );
    describe_histogram!(
        "news_articles_kept",
        "Articles kept after merging and deduplicating news probes."
    );
    describe_counter!("llm_requests_total", "Model calls by task and outcome.");
    describe_histogram!("llm_duration_ms", "Model call latency in milliseconds.");
}

/// Router exposing `/metrics` in the Prometheus exposition format.
pub fn router(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let h = handle.clone();
            async move { h.render() }
        }),
    )
}
