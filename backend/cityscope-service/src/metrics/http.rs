use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, HistogramVec};

lazy_static! {
    /// Request latency by method, matched route pattern and status code.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "cityscope_http_request_duration_seconds",
        "HTTP request duration segmented by method, route and status",
        &["method", "route", "status"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("failed to register cityscope_http_request_duration_seconds");
}
