use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tidyquote_core::domain::rate::{RateCategory, RateDraft, RateEntry, RateId, RatePatch};

use crate::api::{ApiJson, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rates", get(list_rates).post(create_rate))
        .route("/rates/tiers", get(list_tiers))
        .route("/rates/{id}", get(get_rate).patch(update_rate).delete(delete_rate))
}

#[derive(Debug, Default, Deserialize)]
pub struct RateListQuery {
    category: Option<String>,
    /// Include inactive rates; only honoured without a category filter.
    #[serde(default)]
    all: bool,
}

async fn list_rates(
    State(state): State<AppState>,
    Query(query): Query<RateListQuery>,
) -> ApiResult<Json<Vec<RateEntry>>> {
    let rates = match query.category.as_deref() {
        Some(raw) => state.catalog.get_by_category(raw.parse::<RateCategory>()?)?,
        None if query.all => state.catalog.get_all()?,
        None => state.catalog.snapshot()?.entries().to_vec(),
    };
    Ok(Json(rates))
}

async fn list_tiers(State(state): State<AppState>) -> ApiResult<Json<Vec<RateEntry>>> {
    Ok(Json(state.catalog.get_square_footage_tiers()?))
}

async fn get_rate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RateEntry>> {
    Ok(Json(state.catalog.get_by_id(id.parse::<RateId>()?)?))
}

async fn create_rate(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<RateDraft>,
) -> ApiResult<(StatusCode, Json<RateEntry>)> {
    Ok((StatusCode::CREATED, Json(state.catalog.create(&draft)?)))
}

async fn update_rate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<RatePatch>,
) -> ApiResult<Json<RateEntry>> {
    Ok(Json(state.catalog.update(id.parse::<RateId>()?, &patch)?))
}

async fn delete_rate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RateEntry>> {
    Ok(Json(state.catalog.delete(id.parse::<RateId>()?)?))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use rust_decimal::Decimal;
    use serde_json::json;

    use crate::api::test_support::{money, seeded_app, send, send_raw};

    fn len(body: &serde_json::Value) -> usize {
        body.as_array().map(Vec::len).unwrap_or_default()
    }

    #[tokio::test]
    async fn lists_active_rates_by_category() {
        let (app, _) = seeded_app();

        let (status, body) = send(&app, Method::GET, "/rates", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(len(&body), 11);

        let (_, body) = send(&app, Method::GET, "/rates?category=discount", None).await;
        assert_eq!(len(&body), 3);
        assert_eq!(body[0]["category"], "discount");

        let (status, _) = send(&app, Method::GET, "/rates?category=bundle", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tiers_come_back_in_ascending_order() {
        let (app, _) = seeded_app();

        let (_, body) = send(&app, Method::GET, "/rates/tiers", None).await;

        let mins = body
            .as_array()
            .expect("tiers")
            .iter()
            .map(|tier| tier["minSqFt"].as_i64().unwrap_or(-1))
            .collect::<Vec<_>>();
        assert_eq!(mins, vec![0, 1_000, 2_000, 3_000]);
    }

    #[tokio::test]
    async fn create_requires_category_fields() {
        let (app, _) = seeded_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/rates",
            Some(json!({ "category": "surcharge", "name": "Oven Clean" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().expect("message").contains("surchargeValue"));

        let (status, body) = send(
            &app,
            Method::POST,
            "/rates",
            Some(json!({
                "category": "surcharge",
                "name": "Oven Clean",
                "surchargeType": "fixed",
                "surchargeValue": "30"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 12);
        assert_eq!(body["isActive"], true);
        assert_eq!(money(&body["surchargeValue"]), Decimal::new(30, 0));
    }

    #[tokio::test]
    async fn new_surcharge_prices_immediately() {
        let (app, _) = seeded_app();
        send(
            &app,
            Method::POST,
            "/rates",
            Some(json!({
                "category": "surcharge",
                "name": "Oven Clean",
                "surchargeType": "fixed",
                "surchargeValue": "30"
            })),
        )
        .await;

        let (_, body) = send(
            &app,
            Method::POST,
            "/quotes/preview",
            Some(json!({ "squareFootage": 500, "addOns": ["ovenclean"] })),
        )
        .await;
        assert_eq!(money(&body["quote"]["totalPrice"]), Decimal::new(110, 0));
    }

    #[tokio::test]
    async fn patch_rejects_fields_from_another_category() {
        let (app, _) = seeded_app();

        let (status, body) =
            send(&app, Method::PATCH, "/rates/1", Some(json!({ "discountValue": "5" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().expect("message").contains("discountValue"));

        let (status, body) =
            send(&app, Method::PATCH, "/rates/1", Some(json!({ "basePrice": "85" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(money(&body["basePrice"]), Decimal::new(85, 0));
    }

    #[tokio::test]
    async fn delete_deactivates_but_keeps_the_rate() {
        let (app, _) = seeded_app();

        let (status, body) = send(&app, Method::DELETE, "/rates/5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isActive"], false);

        let (_, active) = send(&app, Method::GET, "/rates", None).await;
        assert_eq!(len(&active), 10);
        let (_, everything) = send(&app, Method::GET, "/rates?all=true", None).await;
        assert_eq!(len(&everything), 11);

        let (status, body) = send(&app, Method::GET, "/rates/5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isActive"], false);
    }

    #[tokio::test]
    async fn unknown_rate_is_not_found() {
        let (app, _) = seeded_app();

        let (status, body) = send(&app, Method::GET, "/rates/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Rate with ID 999 not found");

        let (status, _) = send(&app, Method::DELETE, "/rates/x", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_rate_body_is_a_json_bad_request() {
        let (app, _) = seeded_app();

        let (status, body) = send_raw(&app, Method::POST, "/rates", "not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["correlationId"].is_string(), "{body}");
        assert!(body["message"].as_str().expect("message").contains("request body rejected"));
    }
}
