//! Request metrics for the HTTP surface
//!
//! Requests are labelled by route template (`/api/posts/like/{id}`), never by
//! the concrete path, and by status class.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGauge, TextEncoder};
use std::rc::Rc;
use std::time::Instant;

const UNMATCHED_ROUTE: &str = "unmatched";

lazy_static::lazy_static! {
    static ref REQUESTS: IntCounterVec = prometheus::register_int_counter_vec!(
        "microblog_http_requests_total",
        "HTTP requests by method, route and status class",
        &["method", "route", "status"]
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref LATENCY: HistogramVec = prometheus::register_histogram_vec!(
        "microblog_http_request_duration_seconds",
        "HTTP request latency by method and route",
        &["method", "route"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref IN_FLIGHT: IntGauge = prometheus::register_int_gauge!(
        "microblog_http_requests_in_flight",
        "HTTP requests currently being served"
    ).expect("Prometheus metrics registration should succeed at startup");
}

fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

/// Records request count, latency and in-flight requests
pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = MetricsService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsService {
            inner: Rc::new(service),
        }))
    }
}

pub struct MetricsService<S> {
    inner: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(inner);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let inner = self.inner.clone();
        let method = req.method().as_str().to_owned();
        let route = req
            .match_pattern()
            .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

        IN_FLIGHT.inc();
        let started = Instant::now();

        Box::pin(async move {
            let result = inner.call(req).await;
            IN_FLIGHT.dec();

            let status = match &result {
                Ok(res) => res.status(),
                Err(e) => e.as_response_error().status_code(),
            };

            LATENCY
                .with_label_values(&[&method, &route])
                .observe(started.elapsed().as_secs_f64());
            REQUESTS
                .with_label_values(&[&method, &route, status_class(status)])
                .inc();

            result
        })
    }
}

/// Render the default registry in the Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_class() {
        assert_eq!(status_class(StatusCode::CREATED), "2xx");
        assert_eq!(status_class(StatusCode::NOT_FOUND), "4xx");
        assert_eq!(status_class(StatusCode::SERVICE_UNAVAILABLE), "5xx");
    }
}
