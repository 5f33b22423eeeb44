/// Service banner, liveness and readiness endpoints
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use std::time::Instant;

/// Dependencies probed by the readiness check
#[derive(Clone, Default)]
pub struct ReadinessProbe {
    /// Absent when the in-memory store is in use
    pub db_pool: Option<PgPool>,
}

#[derive(Serialize)]
struct ComponentCheck {
    name: &'static str,
    healthy: bool,
    message: String,
    latency_ms: u64,
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "CityScope API is running!",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth",
            "posts": "/api/posts",
            "users": "/api/users"
        }
    }))
}

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "cityscope-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn readiness(probe: Option<web::Data<ReadinessProbe>>) -> HttpResponse {
    let mut checks = Vec::new();

    if let Some(pool) = probe.as_ref().and_then(|p| p.db_pool.clone()) {
        let start = Instant::now();
        let result = sqlx::query("SELECT 1").execute(&pool).await;
        let latency_ms = start.elapsed().as_millis() as u64;
        checks.push(match result {
            Ok(_) => ComponentCheck {
                name: "postgresql",
                healthy: true,
                message: "PostgreSQL connection successful".to_string(),
                latency_ms,
            },
            Err(e) => ComponentCheck {
                name: "postgresql",
                healthy: false,
                message: format!("PostgreSQL connection failed: {}", e),
                latency_ms,
            },
        });
    }

    let ready = checks.iter().all(|c| c.healthy);
    let body = serde_json::json!({
        "ready": ready,
        "checks": checks,
        "timestamp": Utc::now().to_rfc3339(),
    });

    if ready {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
