use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tidyquote_core::audit::AuditEvent;
use tidyquote_core::cpq::RateCatalog;

use crate::state::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub checked_at: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health)).route("/audit", get(audit_events))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    event_type: Option<String>,
}

/// Recent audit events, oldest first.
pub async fn audit_events(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Json<Vec<AuditEvent>> {
    Json(match query.event_type.as_deref() {
        Some(event_type) => state.audit.events_of_type(event_type),
        None => state.audit.events(),
    })
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = catalog_check(&state.catalog);
    let ready = catalog.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "tidyquote-server runtime initialized".to_string(),
        },
        catalog,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn catalog_check(catalog: &RateCatalog) -> HealthCheck {
    match catalog.tier_coverage() {
        Ok(coverage) if coverage.is_complete() => {
            HealthCheck { status: "ready", detail: coverage.describe() }
        }
        Ok(coverage) => HealthCheck { status: "degraded", detail: coverage.describe() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("rate catalog unreadable: {error}") }
        }
    }
}
