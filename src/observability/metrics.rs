//! Metrics collection and Prometheus export module.
//!
//! This module provides:
//! - Rate limiting for the metrics listener
//! - Authentication for metrics endpoints
//! - Prometheus metrics server setup
//! - Metrics recording functions for HTTP, database, import and cache activity

use anyhow::Result;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use parking_lot::Mutex;
use sqlx::PgPool;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

use crate::observability_config::ObservabilityConfig;

/// Simple rate limiter for HTTP requests
#[derive(Debug)]
pub struct RateLimiter {
    requests: Mutex<HashMap<String, Vec<Instant>>>,
    max_requests: u32,
    window_secs: u64,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            max_requests,
            window_secs,
        }
    }

    /// Check if request is allowed for the given IP
    pub fn is_allowed(&self, ip: &str) -> bool {
        let now = Instant::now();
        let window = Duration::from_secs(self.window_secs);

        let mut requests = self.requests.lock();

        // Drop timestamps outside the window, and clients left with none
        requests.retain(|_, times| {
            times.retain(|&time| now.duration_since(time) < window);
            !times.is_empty()
        });

        let client_requests = requests.entry(ip.to_string()).or_default();
        if client_requests.len() >= self.max_requests as usize {
            return false;
        }

        client_requests.push(now);
        true
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.requests.lock().len()
    }
}

/// Check a bearer token against `METRICS_AUTH_TOKEN`
///
/// No token configured means no authentication (development).
pub fn check_auth_header(authorization: Option<&str>) -> bool {
    let expected_token = match std::env::var("METRICS_AUTH_TOKEN") {
        Ok(token) if !token.is_empty() => token,
        _ => return true,
    };

    authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected_token)
}

/// Check authentication token from Authorization header
pub fn check_auth(req: &hyper::Request<hyper::body::Incoming>) -> bool {
    let header = req
        .headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok());
    check_auth_header(header)
}

/// Check request size limit
pub fn check_request_size(req: &hyper::Request<hyper::body::Incoming>) -> bool {
    const MAX_REQUEST_SIZE: u64 = 1024 * 1024; // 1MB limit

    if let Some(content_length) = req.headers().get("content-length") {
        if let Ok(size_str) = content_length.to_str() {
            if let Ok(size) = size_str.parse::<u64>() {
                return size <= MAX_REQUEST_SIZE;
            }
        }
        return false; // Invalid content-length header
    }

    true // No content-length header (GET requests)
}

/// Initialize metrics collection with Prometheus exporter and configuration
pub fn init_metrics_with_config(config: &ObservabilityConfig) -> Result<PrometheusHandle> {
    let builder = PrometheusBuilder::new();
    let handle = builder.install_recorder()?;

    tracing::info!(
        metrics_enabled = %config.enable_metrics_export,
        "Metrics collection initialized"
    );
    Ok(handle)
}

fn text_response(status: hyper::StatusCode, body: impl Into<String>) -> hyper::Response<String> {
    let mut response = hyper::Response::new(body.into());
    *response.status_mut() = status;
    response
}

async fn route_metrics_request(
    req: hyper::Request<hyper::body::Incoming>,
    metrics_handle: PrometheusHandle,
    db_pool: Option<PgPool>,
) -> hyper::Response<String> {
    if !check_request_size(&req) {
        return text_response(hyper::StatusCode::PAYLOAD_TOO_LARGE, "Request too large");
    }

    if !check_auth(&req) {
        let mut response = text_response(hyper::StatusCode::UNAUTHORIZED, "Unauthorized");
        response.headers_mut().insert(
            "www-authenticate",
            hyper::header::HeaderValue::from_static("Bearer"),
        );
        return response;
    }

    match (req.method(), req.uri().path()) {
        (&hyper::Method::GET, "/metrics") => {
            let mut response = text_response(hyper::StatusCode::OK, metrics_handle.render());
            response.headers_mut().insert(
                "content-type",
                hyper::header::HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
            );
            response
        }
        (&hyper::Method::GET, "/health/live") => text_response(hyper::StatusCode::OK, "OK"),
        (&hyper::Method::GET, "/health/ready") => {
            match super::health_checks::perform_readiness_checks(db_pool.as_ref()).await {
                Ok(()) => text_response(hyper::StatusCode::OK, "OK"),
                Err(e) => text_response(
                    hyper::StatusCode::SERVICE_UNAVAILABLE,
                    format!("NOT READY: {}", e),
                ),
            }
        }
        _ => text_response(hyper::StatusCode::NOT_FOUND, "Not Found"),
    }
}

/// Start metrics server with health checks
pub async fn start_metrics_server_with_health_checks(
    metrics_handle: PrometheusHandle,
    port: u16,
    db_pool: Option<PgPool>,
) -> Result<()> {
    // Localhost only unless explicitly configured
    let bind_all = std::env::var("METRICS_BIND_ALL_INTERFACES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    let addr = if bind_all {
        SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port)
    } else {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    };

    tracing::info!(
        "Starting metrics server with health checks on {} (bind_all: {})",
        addr,
        bind_all
    );

    // 10 requests per minute per IP
    let rate_limiter = Arc::new(RateLimiter::new(10, 60));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Metrics server listening on {}", addr);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    let metrics_handle = metrics_handle.clone();
                    let db_pool = db_pool.clone();
                    let rate_limiter = rate_limiter.clone();

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = hyper::service::service_fn(
                            move |req: hyper::Request<hyper::body::Incoming>| {
                                let metrics_handle = metrics_handle.clone();
                                let db_pool = db_pool.clone();
                                let allowed = rate_limiter.is_allowed(&peer_addr.ip().to_string());
                                async move {
                                    if !allowed {
                                        return Ok::<_, std::convert::Infallible>(text_response(
                                            hyper::StatusCode::TOO_MANY_REQUESTS,
                                            "Rate limit exceeded",
                                        ));
                                    }
                                    Ok(route_metrics_request(req, metrics_handle, db_pool).await)
                                }
                            },
                        );

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await
                        {
                            tracing::error!(
                                error = %err,
                                peer = %peer_addr,
                                "Error serving metrics connection"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, address = %addr, "Error accepting metrics connection");
                }
            }
        }
    });

    Ok(())
}

/// Record database operation metrics
pub fn record_db_metrics(operation: &str, duration: Duration) {
    let operation = operation.to_string();
    metrics::counter!("db_operations_total", "operation" => operation.clone()).increment(1);
    metrics::histogram!("db_operation_duration_seconds", "operation" => operation)
        .record(duration.as_secs_f64());
}

/// Record HTTP request metrics
pub fn record_request_metrics(method: &str, route: &str, status: u16, duration: Duration) {
    let method = method.to_string();
    let route = route.to_string();
    let status = status.to_string();
    metrics::counter!("http_requests_total", "method" => method, "route" => route.clone(), "status" => status)
        .increment(1);
    metrics::histogram!("http_request_duration_seconds", "route" => route)
        .record(duration.as_secs_f64());
}

/// Record health check metrics
pub fn record_health_check_metrics(check_type: &str, success: bool, duration: Duration) {
    let check_type = check_type.to_string();
    metrics::counter!("health_checks_total", "type" => check_type.clone(), "result" => if success { "success" } else { "failure" }.to_string()).increment(1);
    metrics::histogram!("health_check_duration_seconds", "type" => check_type.clone())
        .record(duration.as_secs_f64());
    metrics::gauge!("health_check_status", "type" => check_type).set(if success {
        1.0
    } else {
        0.0
    });
}

/// Record error rate metrics
pub fn record_error_metrics(error_type: &str, component: &str) {
    let error_type = error_type.to_string();
    let component = component.to_string();
    metrics::counter!("errors_total", "type" => error_type, "component" => component).increment(1);
}

/// Record the outcome of a meal import run
pub fn record_import_metrics(imported: usize, skipped: usize, failed: bool, duration: Duration) {
    metrics::counter!("meal_import_records_total", "result" => "imported").increment(imported as u64);
    metrics::counter!("meal_import_records_total", "result" => "skipped").increment(skipped as u64);
    metrics::counter!("meal_import_runs_total", "result" => if failed { "failure" } else { "success" })
        .increment(1);
    metrics::histogram!("meal_import_duration_seconds").record(duration.as_secs_f64());
}

/// Record a meal cache lookup
pub fn record_cache_lookup(hit: bool) {
    metrics::counter!("meal_cache_lookups_total", "result" => if hit { "hit" } else { "miss" })
        .increment(1);
}

/// Record a failed best-effort cache write
pub fn record_cache_populate_failure() {
    metrics::counter!("meal_cache_populate_failures_total").increment(1);
}

/// Record application startup time
pub fn record_startup_metrics(duration: Duration) {
    metrics::histogram!("startup_duration_seconds").record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_blocks_after_limit() {
        let limiter = RateLimiter::new(2, 60);
        assert!(limiter.is_allowed("10.0.0.1"));
        assert!(limiter.is_allowed("10.0.0.1"));
        assert!(!limiter.is_allowed("10.0.0.1"));

        // Separate budget per client
        assert!(limiter.is_allowed("10.0.0.2"));
    }

    #[test]
    fn test_rate_limiter_forgets_idle_clients() {
        let limiter = RateLimiter::new(5, 0);
        assert!(limiter.is_allowed("10.0.0.1"));
        assert!(limiter.is_allowed("10.0.0.2"));

        // With an empty window every earlier request has aged out
        assert!(limiter.is_allowed("10.0.0.3"));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_recording_without_recorder_does_not_panic() {
        record_db_metrics("select_recipe", Duration::from_millis(3));
        record_request_metrics("GET", "/v1/recipes", 200, Duration::from_millis(12));
        record_import_metrics(10, 2, false, Duration::from_millis(40));
        record_cache_lookup(true);
        record_cache_populate_failure();
        record_error_metrics("database", "recipes");
    }
}
