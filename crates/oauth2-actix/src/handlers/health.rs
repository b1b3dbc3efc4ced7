use actix_web::{web, HttpResponse, Result};

use oauth2_observability::Metrics;
use oauth2_ports::DynStorage;

/// Prometheus scrape endpoint
pub async fn metrics(metrics: web::Data<Metrics>) -> Result<HttpResponse> {
    let buffer = oauth2_observability::encode_prometheus_text(&metrics.registry)
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer))
}

/// Health check endpoint; reports 503 when storage is unreachable.
pub async fn health(db: web::Data<DynStorage>) -> Result<HttpResponse> {
    db.healthcheck()
        .await
        .map_err(actix_web::error::ErrorServiceUnavailable)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "oauth2_ropc",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "checks": {
            "database": "ok"
        }
    })))
}
