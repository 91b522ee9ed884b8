//! Prometheus metrics bootstrap.

use std::sync::OnceLock;

use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static PROMETHEUS: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder and describe domain metrics.
///
/// The recorder is process-global, so repeated calls return the same handle.
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS.get_or_init(install).clone()
}

fn install() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    describe_counter!(
        "prompt_chat_turns_total",
        "Completed chat turns (user input answered and persisted)"
    );
    describe_counter!(
        "prompt_prompts_delivered_total",
        "Conversations that reached the delivered state"
    );
    describe_counter!(
        "prompt_sessions_reset_total",
        "Sessions deleted through the reset endpoint"
    );
    describe_counter!("http_requests_total", "HTTP requests by method/path/status");

    handle
}
