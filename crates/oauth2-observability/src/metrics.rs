use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
};
use std::time::Duration;

/// Prometheus collectors for the token endpoint.
///
/// Cloning is cheap: collectors are reference counted and share the same registry.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    pub http_requests_total: IntCounter,
    pub http_requests_total_by_route: IntCounterVec,
    pub http_request_duration_seconds: Histogram,
    pub http_request_duration_seconds_by_route: HistogramVec,

    /// Tokens issued, labelled by grant type.
    pub oauth_token_issued_total: IntCounterVec,
    /// Token requests rejected, labelled by RFC 6749 error code.
    pub oauth_token_rejected_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total number of HTTP requests")?;
        let http_requests_total_by_route = IntCounterVec::new(
            Opts::new(
                "http_requests_by_route_total",
                "HTTP requests by method, route and status",
            ),
            &["method", "route", "status"],
        )?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_request_duration_seconds_by_route = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_by_route_seconds",
                "HTTP request latency by method, route and status",
            ),
            &["method", "route", "status"],
        )?;
        let oauth_token_issued_total = IntCounterVec::new(
            Opts::new("oauth_token_issued_total", "Access tokens issued"),
            &["grant_type"],
        )?;
        let oauth_token_rejected_total = IntCounterVec::new(
            Opts::new("oauth_token_rejected_total", "Token requests rejected"),
            &["error"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_requests_total_by_route.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_request_duration_seconds_by_route.clone()))?;
        registry.register(Box::new(oauth_token_issued_total.clone()))?;
        registry.register(Box::new(oauth_token_rejected_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_requests_total_by_route,
            http_request_duration_seconds,
            http_request_duration_seconds_by_route,
            oauth_token_issued_total,
            oauth_token_rejected_total,
        })
    }

    /// Record one finished HTTP request.
    pub fn observe_http_request(
        &self,
        method: &str,
        route: &str,
        status: u16,
        elapsed: Duration,
    ) {
        let status = status.to_string();
        let labels = [method, route, status.as_str()];
        let seconds = elapsed.as_secs_f64();

        self.http_requests_total.inc();
        self.http_request_duration_seconds.observe(seconds);
        self.http_requests_total_by_route
            .with_label_values(&labels)
            .inc();
        self.http_request_duration_seconds_by_route
            .with_label_values(&labels)
            .observe(seconds);
    }

    pub fn record_token_issued(&self, grant_type: &str) {
        self.oauth_token_issued_total
            .with_label_values(&[grant_type])
            .inc();
    }

    pub fn record_token_rejected(&self, error_code: &str) {
        self.oauth_token_rejected_total
            .with_label_values(&[error_code])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_counters_are_exported() {
        let metrics = Metrics::new().unwrap();
        metrics.record_token_issued("password");
        metrics.record_token_rejected("invalid_request");

        let text = String::from_utf8(crate::encode_prometheus_text(&metrics.registry).unwrap())
            .unwrap();
        assert!(text.contains(r#"oauth_token_issued_total{grant_type="password"} 1"#));
        assert!(text.contains(r#"oauth_token_rejected_total{error="invalid_request"} 1"#));
    }

    #[test]
    fn http_requests_are_labelled_by_route_and_status() {
        let metrics = Metrics::new().unwrap();
        metrics.observe_http_request("POST", "/oauth/token", 200, Duration::from_millis(12));
        metrics.observe_http_request("POST", "/oauth/token", 400, Duration::from_millis(3));
        metrics.observe_http_request("POST", "/oauth/token", 200, Duration::from_millis(5));

        assert_eq!(metrics.http_requests_total.get(), 3);
        assert_eq!(
            metrics
                .http_requests_total_by_route
                .with_label_values(&["POST", "/oauth/token", "200"])
                .get(),
            2
        );
        assert_eq!(metrics.http_request_duration_seconds.get_sample_count(), 3);
    }
}
