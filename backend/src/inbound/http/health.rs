//! Health endpoints: store health, liveness and readiness checks.
//!
//! `/health` and `/health/ready` ping the contact store through the query
//! port; `/health/live` only reports that the process is serving requests.
//! Health responses are never cached.

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::inbound::http::state::HttpState;

/// Body returned by `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    #[schema(example = "healthy")]
    pub status: String,
}

fn check_response(store_ok: bool) -> HttpResponse {
    let mut response = if store_ok {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };

    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

async fn store_reachable(state: &HttpState) -> bool {
    match state.contacts_query.check_store().await {
        Ok(()) => true,
        Err(error) => {
            warn!(error = %error, "health check could not reach the contact store");
            false
        }
    }
}

/// Store health. Return 200 `healthy` when the contact store answers and 503 `unhealthy` otherwise.
#[utoipa::path(
    get,
    path = "/health",
    tags = ["health"],
    responses(
        (status = 200, description = "Contact store reachable", body = HealthReport),
        (status = 503, description = "Contact store unreachable", body = HealthReport)
    )
)]
#[get("/health")]
pub async fn health(state: web::Data<HttpState>) -> HttpResponse {
    let (mut response, status) = if store_reachable(&state).await {
        (HttpResponse::Ok(), "healthy")
    } else {
        (HttpResponse::ServiceUnavailable(), "unhealthy")
    };

    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(HealthReport {
            status: status.to_owned(),
        })
}

/// Readiness check. Return 200 when the contact store answers; return 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (
            status = 405,
            description = "Method not allowed; only GET is supported"
        ),
        (status = 503, description = "Contact store unreachable")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HttpState>) -> HttpResponse {
    check_response(store_reachable(&state).await)
}

/// Liveness check. Return 200 while the process serves requests.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is alive"),
        (
            status = 405,
            description = "Method not allowed; only GET is supported"
        )
    )
)]
#[get("/health/live")]
pub async fn live() -> HttpResponse {
    check_response(true)
}
