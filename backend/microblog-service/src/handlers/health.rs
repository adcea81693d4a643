/// Liveness and metrics endpoints
use crate::state::AppState;
use actix_web::{web, HttpResponse};

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.health.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "microblog-service",
            "version": env!("CARGO_PKG_VERSION"),
        })),
        Err(e) => {
            tracing::error!(error = %e, "health check database ping failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": "microblog-service",
            }))
        }
    }
}

pub async fn metrics() -> HttpResponse {
    match actix_middleware::render_metrics() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            tracing::error!(error = %e, "failed to render metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}
