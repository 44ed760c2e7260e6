use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tidyquote_core::cpq::PricingResult;
use tidyquote_core::domain::quote::{
    Quote, QuoteDraft, QuoteId, QuotePatch, QuoteRequest, QuoteStatus,
};
use tracing::info;

use crate::api::{ApiJson, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quotes", get(list_quotes).post(create_quote))
        .route("/quotes/recent", get(recent_quotes))
        .route("/quotes/preview", post(preview_quote))
        .route("/quotes/{id}", get(get_quote).patch(update_quote).delete(delete_quote))
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteListQuery {
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    currency: String,
    #[serde(flatten)]
    result: PricingResult,
}

async fn list_quotes(
    State(state): State<AppState>,
    Query(query): Query<QuoteListQuery>,
) -> ApiResult<Json<Vec<Quote>>> {
    let quotes = match query.status.as_deref() {
        Some(raw) => state.quotes.get_by_status(raw.parse::<QuoteStatus>()?)?,
        None => state.quotes.get_all()?,
    };
    Ok(Json(quotes))
}

async fn recent_quotes(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<Vec<Quote>>> {
    Ok(Json(state.quotes.get_recent(query.limit)?))
}

async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Quote>> {
    Ok(Json(state.quotes.get_by_id(id.parse::<QuoteId>()?)?))
}

async fn create_quote(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<QuoteDraft>,
) -> ApiResult<(StatusCode, Json<Quote>)> {
    let quote = state.quotes.create(&draft)?;
    info!(
        event_name = "http.quote.created",
        quote_id = %quote.id,
        linked = quote.prospect_id.is_some(),
        "quote submitted"
    );
    Ok((StatusCode::CREATED, Json(quote)))
}

async fn update_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<QuotePatch>,
) -> ApiResult<Json<Quote>> {
    Ok(Json(state.quotes.update(id.parse::<QuoteId>()?, &patch)?))
}

async fn delete_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Quote>> {
    Ok(Json(state.quotes.delete(id.parse::<QuoteId>()?)?))
}

async fn preview_quote(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<QuoteRequest>,
) -> ApiResult<Json<PreviewResponse>> {
    let result = state.quotes.preview(&request)?;
    Ok(Json(PreviewResponse { currency: state.currency.clone(), result }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use rust_decimal::Decimal;

    use crate::api::test_support::{money, seeded_app, send, send_raw};

    fn submission() -> serde_json::Value {
        json!({
            "customerName": "Dana Reyes",
            "customerEmail": "dana@example.com",
            "squareFootage": 1500,
            "serviceFrequency": "weekly",
            "addOns": ["pethaircleanup"]
        })
    }

    #[tokio::test]
    async fn post_quote_returns_created_priced_quote() {
        let (app, state) = seeded_app();

        let (status, body) = send(&app, Method::POST, "/quotes", Some(submission())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "pending");
        assert_eq!(money(&body["basePrice"]), Decimal::new(120, 0));
        assert_eq!(money(&body["totalPrice"]), Decimal::new(13050, 2));
        assert!(body["prospectId"].is_u64());
        assert_eq!(state.audit.events_of_type("bridge.linked").len(), 1);
    }

    #[tokio::test]
    async fn post_quote_without_required_fields_is_bad_request() {
        let (app, _) = seeded_app();

        let (status, body) =
            send(&app, Method::POST, "/quotes", Some(json!({ "customerName": "Dana" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["message"].as_str().expect("message");
        assert!(message.contains("customerEmail"), "{message}");
        assert!(body["correlationId"].is_string());
    }

    #[tokio::test]
    async fn unreadable_bodies_render_as_json_errors() {
        let (app, state) = seeded_app();

        let (status, body) = send_raw(&app, Method::POST, "/quotes", "{\"customerName\": ").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["correlationId"].is_string(), "{body}");
        assert!(body["message"].as_str().expect("message").contains("request body rejected"));

        let mut fortnightly = submission();
        fortnightly["serviceFrequency"] = json!("fortnightly");
        let (status, body) = send(&app, Method::POST, "/quotes/preview", Some(fortnightly)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["correlationId"].is_string(), "{body}");

        assert!(state.quotes.get_all().expect("quotes").is_empty());
    }

    #[tokio::test]
    async fn patch_quote_reprices_and_keeps_untouched_fields() {
        let (app, _) = seeded_app();
        let (_, created) = send(&app, Method::POST, "/quotes", Some(submission())).await;
        let id = created["id"].as_u64().expect("id");

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/quotes/{id}"),
            Some(json!({ "squareFootage": 2500 })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id);
        assert_eq!(money(&body["basePrice"]), Decimal::new(160, 0));
        assert_eq!(body["customerName"], "Dana Reyes");
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids() {
        let (app, _) = seeded_app();

        let (status, _) = send(&app, Method::GET, "/quotes/42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, Method::PATCH, "/quotes/abc", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().expect("message").contains("Quote ID"));

        let (status, _) = send(&app, Method::DELETE, "/quotes/42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_filters_by_status_and_recent_limits() {
        let (app, _) = seeded_app();
        for _ in 0..3 {
            send(&app, Method::POST, "/quotes", Some(submission())).await;
        }

        let (status, body) = send(&app, Method::GET, "/quotes?status=pending", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(3));

        let (_, body) = send(&app, Method::GET, "/quotes?status=accepted", None).await;
        assert_eq!(body.as_array().map(Vec::len), Some(0));

        let (status, _) = send(&app, Method::GET, "/quotes?status=lost", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, Method::GET, "/quotes/recent?limit=2", None).await;
        assert_eq!(body.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn delete_is_hard() {
        let (app, _) = seeded_app();
        let (_, created) = send(&app, Method::POST, "/quotes", Some(submission())).await;
        let uri = format!("/quotes/{}", created["id"]);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn preview_reports_degradations_without_storing() {
        let (app, state) = seeded_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/quotes/preview",
            Some(json!({ "squareFootage": 1500, "serviceFrequency": "oneTime", "addOns": ["gutters"] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currency"], "USD");
        assert_eq!(money(&body["quote"]["totalPrice"]), Decimal::new(120, 0));
        let codes = body["degradations"]
            .as_array()
            .expect("degradations")
            .iter()
            .map(|item| item["kind"].as_str().unwrap_or_default().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(codes, vec!["unmatched_add_on", "no_frequency_discount"]);
        assert!(state.quotes.get_all().expect("quotes").is_empty());
    }
}
