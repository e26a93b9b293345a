mod common;

use common::*;
use condo_reviews::{app_state::AppState, config::Config, infrastructure::SqliteDatabase};
use std::sync::Arc;
use tempfile::TempDir;

fn file_config(dir: &TempDir) -> Config {
    let url = format!("sqlite://{}/nested/reviews.db", dir.path().display());
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some(url.clone()),
        "DATABASE_MAX_CONNECTIONS" => Some("4".to_string()),
        _ => None,
    })
    .unwrap()
}

#[tokio::test]
async fn test_aggregate_survives_restart() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir);

    let listing_id = {
        let state = AppState::new(config.clone()).await.unwrap();
        let listing = state
            .listings
            .create_listing(&admin(), listing_input("Persistent Place"))
            .await
            .unwrap();
        state.reviews.submit_review(&user(1), listing.id, rating(5)).await.unwrap();
        state.reviews.submit_review(&user(2), listing.id, rating(2)).await.unwrap();
        listing.id
    };

    let db = SqliteDatabase::connect(&config.database.url, config.database.max_connections)
        .await
        .unwrap();
    let state = AppState::with_database(Arc::new(db), config);

    let listing = state.listings.get_listing(listing_id).await.unwrap();
    assert_eq!(listing.review_count, 2);
    assert_eq!(listing.average_rating, 3.5);

    let page = state
        .reviews
        .reviews_for_listing(listing_id, None, None)
        .await
        .unwrap();
    assert_eq!(page.total, 2);
}
