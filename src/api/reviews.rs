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
    core::{ListingId, ReviewId},
    error::{AppError, AppResult},
    infrastructure::middleware::Vc,
    models::{CategoryRatingsInput, Review, ReviewInput},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewRequest {
    pub condo_id: Option<i64>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
    pub recommend: Option<bool>,
    pub category_ratings: Option<CategoryRatingsInput>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    pub rating: Option<i64>,
    pub comment: Option<String>,
    pub recommend: Option<bool>,
    pub category_ratings: Option<CategoryRatingsInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

pub async fn submit_review_handler(
    State(state): State<AppState>,
    viewer: Vc,
    Json(req): Json<SubmitReviewRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (Some(condo_id), Some(rating)) = (req.condo_id, req.rating) else {
        return Err(AppError::BadRequest(
            "Condo ID and rating are required".to_string(),
        ));
    };

    let input = ReviewInput {
        rating,
        comment: req.comment,
        recommend: req.recommend,
        category_ratings: req.category_ratings,
    };
    let outcome = state
        .reviews
        .submit_review(&viewer, ListingId::new(condo_id), input)
        .await?;

    let (status, message) = if outcome.is_created() {
        (StatusCode::CREATED, "Review added successfully")
    } else {
        (StatusCode::OK, "Review updated successfully")
    };
    Ok((
        status,
        Json(json!({ "message": message, "review": outcome.review() })),
    ))
}

pub async fn listing_reviews_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<i64>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Value>> {
    let page = state
        .reviews
        .reviews_for_listing(
            ListingId::new(id),
            parse_int(params.page.as_deref()),
            parse_int(params.limit.as_deref()),
        )
        .await?;
    Ok(Json(page_json("reviews", page)))
}

pub async fn my_review_handler(
    State(state): State<AppState>,
    viewer: Vc,
    AxumPath(id): AxumPath<i64>,
) -> AppResult<Json<Value>> {
    let review = state
        .reviews
        .review_by_viewer(&viewer, ListingId::new(id))
        .await?;
    Ok(Json(json!({ "review": review })))
}

pub async fn get_review_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<i64>,
) -> AppResult<Json<Review>> {
    let review = state.reviews.get_review(ReviewId::new(id)).await?;
    Ok(Json(review))
}

pub async fn update_review_handler(
    State(state): State<AppState>,
    viewer: Vc,
    AxumPath(id): AxumPath<i64>,
    Json(req): Json<UpdateReviewRequest>,
) -> AppResult<Json<Value>> {
    let rating = req
        .rating
        .ok_or_else(|| AppError::BadRequest("Rating is required".to_string()))?;

    let input = ReviewInput {
        rating,
        comment: req.comment,
        recommend: req.recommend,
        category_ratings: req.category_ratings,
    };
    let review = state
        .reviews
        .update_review(&viewer, ReviewId::new(id), input)
        .await?;
    Ok(Json(json!({ "message": "Review updated successfully", "review": review })))
}

pub async fn delete_review_handler(
    State(state): State<AppState>,
    viewer: Vc,
    AxumPath(id): AxumPath<i64>,
) -> AppResult<Json<Value>> {
    let deleted = state.reviews.delete_review(&viewer, ReviewId::new(id)).await?;
    Ok(Json(json!({
        "message": "Review deleted successfully",
        "updatedCondo": deleted.listing_summary
    })))
}
