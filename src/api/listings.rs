use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    api::{page_json, parse_int},
    app_state::AppState,
    core::ListingId,
    error::AppResult,
    infrastructure::middleware::AdminVc,
    models::{Listing, ListingInput, ListingPatch, ListingQuery},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSearchParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

pub async fn search_listings_handler(
    State(state): State<AppState>,
    Query(params): Query<ListingSearchParams>,
) -> AppResult<Json<Value>> {
    let query = ListingQuery {
        search: params.search,
        min_price: parse_int(params.min_price.as_deref()),
        max_price: parse_int(params.max_price.as_deref()),
    };
    let page = state
        .listings
        .search_listings(
            query,
            parse_int(params.page.as_deref()),
            parse_int(params.limit.as_deref()),
        )
        .await?;
    Ok(Json(page_json("condos", page)))
}

pub async fn popular_listings_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let condos = state.listings.popular_listings().await?;
    Ok(Json(json!({ "condos": condos })))
}

pub async fn get_listing_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<i64>,
) -> AppResult<Json<Listing>> {
    let listing = state.listings.get_listing(ListingId::new(id)).await?;
    Ok(Json(listing))
}

pub async fn create_listing_handler(
    State(state): State<AppState>,
    viewer: AdminVc,
    Json(input): Json<ListingInput>,
) -> AppResult<(StatusCode, Json<Listing>)> {
    let listing = state.listings.create_listing(&viewer, input).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

pub async fn update_listing_handler(
    State(state): State<AppState>,
    viewer: AdminVc,
    AxumPath(id): AxumPath<i64>,
    Json(patch): Json<ListingPatch>,
) -> AppResult<Json<Listing>> {
    let listing = state
        .listings
        .update_listing(&viewer, ListingId::new(id), patch)
        .await?;
    Ok(Json(listing))
}

pub async fn delete_listing_handler(
    State(state): State<AppState>,
    viewer: AdminVc,
    AxumPath(id): AxumPath<i64>,
) -> AppResult<Json<Value>> {
    state.listings.delete_listing(&viewer, ListingId::new(id)).await?;
    Ok(Json(json!({ "message": "Condo removed" })))
}

pub async fn recalculate_reviews_handler(
    State(state): State<AppState>,
    viewer: AdminVc,
) -> AppResult<Json<Value>> {
    let updated = state.listings.recalculate_all(&viewer).await?;
    Ok(Json(json!({
        "message": "Review counts recalculated successfully",
        "updated": updated
    })))
}
