// HTTP API - condo listing and review endpoints over the services in AppState

pub mod listings;
pub mod reviews;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::{app_state::AppState, error::AppResult, models::Page};

/// Build the full application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Listings
        .route(
            "/api/condos",
            get(listings::search_listings_handler).post(listings::create_listing_handler),
        )
        .route("/api/condos/popular", get(listings::popular_listings_handler))
        .route(
            "/api/condos/recalculate-reviews",
            post(listings::recalculate_reviews_handler),
        )
        .route(
            "/api/condos/{id}",
            get(listings::get_listing_handler)
                .put(listings::update_listing_handler)
                .delete(listings::delete_listing_handler),
        )
        // Reviews
        .route("/api/reviews", post(reviews::submit_review_handler))
        .route("/api/reviews/condo/{id}", get(reviews::listing_reviews_handler))
        .route("/api/reviews/user/condo/{id}", get(reviews::my_review_handler))
        .route(
            "/api/reviews/{id}",
            get(reviews::get_review_handler)
                .put(reviews::update_review_handler)
                .delete(reviews::delete_review_handler),
        )
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    request_id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.db.health_check().await?;
    Ok(Json(json!({"status": "ok"})))
}

/// Lenient integer query parameter: anything unparsable counts as absent.
pub(crate) fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Render a page under a collection key, e.g. `{"condos": [...], "page": 1, "pages": 3, "total": 25}`.
pub(crate) fn page_json<T: serde::Serialize>(key: &str, page: Page<T>) -> Value {
    let mut body = json!({
        "page": page.page,
        "pages": page.pages,
        "total": page.total,
    });
    body[key] = json!(page.items);
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageRequest;

    #[test]
    fn test_parse_int_is_lenient() {
        assert_eq!(parse_int(Some("3")), Some(3));
        assert_eq!(parse_int(Some(" 12 ")), Some(12));
        assert_eq!(parse_int(Some("abc")), None);
        assert_eq!(parse_int(None), None);
    }

    #[test]
    fn test_page_json_shape() {
        let page = Page::new(vec![1, 2], PageRequest { page: 2, limit: 2 }, 5);
        let body = page_json("reviews", page);
        assert_eq!(body["reviews"], json!([1, 2]));
        assert_eq!(body["page"], 2);
        assert_eq!(body["pages"], 3);
        assert_eq!(body["total"], 5);
    }
}
