//! Prometheus metrics setup and metric definitions

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> PrometheusHandle {
    // SMTP sessions run up to the relay timeout, so the buckets reach past
    // the HTTP-typical range.
    let buckets = vec![
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .expect("failed to set histogram buckets")
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Register metric descriptions and emit initial zero values so Prometheus
/// output includes HELP/TYPE lines from startup.
pub fn describe_metrics() {
    describe_counter!(
        "mail_relay_http_requests_total",
        "Total number of HTTP requests"
    );
    describe_histogram!(
        "mail_relay_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "mail_relay_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    describe_counter!(
        "mail_relay_submissions_total",
        "Form submissions by outcome (sent/spam/invalid/failed)"
    );
    describe_histogram!(
        "mail_relay_delivery_duration_seconds",
        "Time spent in a single SMTP delivery attempt"
    );

    for outcome in ["sent", "spam", "invalid", "failed"] {
        counter!("mail_relay_submissions_total", "outcome" => outcome).absolute(0);
    }
    gauge!("mail_relay_http_requests_in_flight").set(0.0);
}
