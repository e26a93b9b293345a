#![allow(dead_code)]

use std::sync::Arc;

use condo_reviews::{
    app_state::AppState,
    config::{Config, MissingListingPolicy},
    core::{ListingId, UserId},
    infrastructure::{SqliteDatabase, ViewerContext},
    models::{Listing, ListingInput, RatingSummary, ReviewInput},
};
use tempfile::TempDir;

pub struct TestApp {
    pub db: Arc<SqliteDatabase>,
    pub state: AppState,
}

pub fn test_config(policy: MissingListingPolicy) -> Config {
    let mut config = Config::from_lookup(|_| None).expect("default config");
    config.ratings.missing_listing = policy;
    config
}

pub async fn setup() -> TestApp {
    setup_with_policy(MissingListingPolicy::Ignore).await
}

pub async fn setup_with_policy(policy: MissingListingPolicy) -> TestApp {
    let db = Arc::new(SqliteDatabase::new_in_memory().await.expect("in-memory db"));
    let state = AppState::with_database(db.clone(), test_config(policy));
    TestApp { db, state }
}

/// File-backed database behind a multi-connection pool, so concurrent
/// requests really overlap inside SQLite.
pub async fn setup_file(dir: &TempDir) -> TestApp {
    let url = format!("sqlite://{}/reviews.db", dir.path().display());
    let db = Arc::new(SqliteDatabase::connect(&url, 5).await.expect("file db"));
    let state = AppState::with_database(db.clone(), test_config(MissingListingPolicy::Ignore));
    TestApp { db, state }
}

/// Derive the aggregate afresh from the stored reviews of a listing.
pub async fn derived_summary(app: &TestApp, listing_id: ListingId) -> RatingSummary {
    let mut ratings = Vec::new();
    let mut page = 1;
    loop {
        let reviews = app
            .state
            .reviews
            .reviews_for_listing(listing_id, Some(page), Some(50))
            .await
            .expect("list reviews");
        ratings.extend(reviews.items.iter().map(|r| i64::from(r.rating.value())));
        if page >= i64::from(reviews.pages) {
            break;
        }
        page += 1;
    }
    RatingSummary::from_ratings(ratings)
}

pub fn admin() -> ViewerContext {
    ViewerContext::admin(UserId::new(1))
}

pub fn user(id: i64) -> ViewerContext {
    ViewerContext::user(UserId::new(id))
}

pub fn listing_input(name: &str) -> ListingInput {
    ListingInput {
        name: name.to_string(),
        address: format!("{} Taft Avenue, Manila", name.len()),
        description: format!("{} is a short walk from campus", name),
        ..Default::default()
    }
}

pub async fn seed_listing(app: &TestApp, name: &str) -> Listing {
    app.state
        .listings
        .create_listing(&admin(), listing_input(name))
        .await
        .expect("create listing")
}

pub fn rating(value: i64) -> ReviewInput {
    ReviewInput {
        rating: value,
        comment: Some(format!("Rated {}", value)),
        ..Default::default()
    }
}
