use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, Span, field, info, info_span};
use uuid::Uuid;

use crate::api::AppState;

/// Window and result count of a served list query.
///
/// Set as a response extension by the list handler and picked up by
/// [`logging_middleware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListStats {
    pub offset: usize,
    pub limit: usize,
    pub returned: usize,
}

/// Prometheus text exposition.
///
/// # Endpoint
/// `GET /api/metrics`
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Per-request span plus one `http_request_finished` event.
///
/// List queries additionally record their window and result count on the
/// span and in the `query_results_returned` histogram.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = req.method().clone();
    // Matched route keeps label cardinality bounded; /thumbs has none.
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or("unmatched", MatchedPath::as_str)
        .to_string();

    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %method,
        path = %req.uri().path(),
        query = req.uri().query().unwrap_or_default(),
        route = %route,
        status = field::Empty,
        offset = field::Empty,
        limit = field::Empty,
        results = field::Empty,
    );

    async move {
        let response = next.run(req).await;
        let status = response.status();
        let elapsed = start.elapsed();

        let span = Span::current();
        span.record("status", status.as_u16());

        let stats = response.extensions().get::<ListStats>().copied();
        if let Some(stats) = stats {
            span.record("offset", stats.offset);
            span.record("limit", stats.limit);
            span.record("results", stats.returned);
            metrics::histogram!("query_results_returned").record(stats.returned as f64);
        }

        let labels = [
            ("method", method.to_string()),
            ("path", route),
            ("status", status.as_u16().to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        info!(
            event = "http_request_finished",
            duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            outcome = outcome(status.as_u16()),
            results = stats.map(|s| s.returned),
            "Request finished"
        );

        response
    }
    .instrument(span)
    .await
}

const fn outcome(status: u16) -> &'static str {
    match status {
        500.. => "error",
        400..500 => "client_error",
        _ => "success",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_buckets() {
        assert_eq!(outcome(200), "success");
        assert_eq!(outcome(304), "success");
        assert_eq!(outcome(400), "client_error");
        assert_eq!(outcome(404), "client_error");
        assert_eq!(outcome(500), "error");
        assert_eq!(outcome(503), "error");
    }
}
