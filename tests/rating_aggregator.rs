mod common;

use common::*;
use chrono::Utc;
use condo_reviews::{
    config::MissingListingPolicy,
    core::{ListingId, ReviewId, UserId},
    error::AppError,
    infrastructure::DatabaseInterface,
    models::{RatingSummary, Review},
    services::RatingAggregator,
};
use tempfile::TempDir;

#[tokio::test]
async fn test_zero_reviews_yields_zero_aggregate() {
    let app = setup().await;
    let listing = seed_listing(&app, "Archer Tower").await;

    let summary = app.state.aggregator.recompute(listing.id).await.unwrap();
    assert_eq!(summary, Some(RatingSummary::EMPTY));

    let stored = app.state.listings.get_listing(listing.id).await.unwrap();
    assert_eq!(stored.average_rating, 0.0);
    assert_eq!(stored.review_count, 0);
}

#[tokio::test]
async fn test_mean_of_reviews() {
    let app = setup().await;
    let listing = seed_listing(&app, "Green Residences").await;

    for (uid, value) in [(10, 5), (11, 3), (12, 4)] {
        app.state
            .reviews
            .submit_review(&user(uid), listing.id, rating(value))
            .await
            .unwrap();
    }

    let stored = app.state.listings.get_listing(listing.id).await.unwrap();
    assert_eq!(stored.review_count, 3);
    assert_eq!(stored.average_rating, 4.0);
}

#[tokio::test]
async fn test_non_integer_average_is_kept() {
    let app = setup().await;
    let listing = seed_listing(&app, "One Archers Place").await;

    app.state.reviews.submit_review(&user(20), listing.id, rating(1)).await.unwrap();
    app.state.reviews.submit_review(&user(21), listing.id, rating(2)).await.unwrap();

    let stored = app.state.listings.get_listing(listing.id).await.unwrap();
    assert_eq!(stored.average_rating, 1.5);
    assert_eq!(stored.review_count, 2);
}

#[tokio::test]
async fn test_recompute_is_idempotent() {
    let app = setup().await;
    let listing = seed_listing(&app, "Torre Lorenzo").await;
    app.state.reviews.submit_review(&user(30), listing.id, rating(4)).await.unwrap();
    app.state.reviews.submit_review(&user(31), listing.id, rating(5)).await.unwrap();

    let first = app.state.aggregator.recompute(listing.id).await.unwrap();
    let after_first = app.state.listings.get_listing(listing.id).await.unwrap();
    let second = app.state.aggregator.recompute(listing.id).await.unwrap();
    let after_second = app.state.listings.get_listing(listing.id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(after_first.average_rating, after_second.average_rating);
    assert_eq!(after_first.review_count, after_second.review_count);
    assert_eq!(after_second.average_rating, 4.5);
}

#[tokio::test]
async fn test_delete_last_review_returns_to_zero() {
    let app = setup().await;
    let listing = seed_listing(&app, "Taft Suites").await;
    let outcome = app
        .state
        .reviews
        .submit_review(&user(40), listing.id, rating(3))
        .await
        .unwrap();

    let stored = app.state.listings.get_listing(listing.id).await.unwrap();
    assert_eq!(stored.review_count, 1);

    let deleted = app
        .state
        .reviews
        .delete_review(&user(40), outcome.review().id)
        .await
        .unwrap();
    assert_eq!(deleted.listing_summary, Some(RatingSummary::EMPTY));

    let stored = app.state.listings.get_listing(listing.id).await.unwrap();
    assert_eq!(stored.average_rating, 0.0);
    assert_eq!(stored.review_count, 0);
}

#[tokio::test]
async fn test_duplicate_create_does_not_double_count() {
    let app = setup().await;
    let listing = seed_listing(&app, "Vito Cruz Lofts").await;

    app.state
        .reviews
        .create_review(&user(50), listing.id, rating(5))
        .await
        .unwrap();
    let err = app
        .state
        .reviews
        .create_review(&user(50), listing.id, rating(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let page = app
        .state
        .reviews
        .reviews_for_listing(listing.id, None, None)
        .await
        .unwrap();
    assert_eq!(page.total, 1);

    let stored = app.state.listings.get_listing(listing.id).await.unwrap();
    assert_eq!(stored.review_count, 1);
    assert_eq!(stored.average_rating, 5.0);
}

#[tokio::test]
async fn test_missing_listing_ignored_by_default() {
    let app = setup().await;
    let result = app.state.aggregator.recompute(ListingId::new(424242)).await.unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_missing_listing_rejected_when_configured() {
    let app = setup_with_policy(MissingListingPolicy::Reject).await;
    let err = app
        .state
        .aggregator
        .recompute(ListingId::new(424242))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_storage_failure_is_propagated() {
    let app = setup().await;
    let listing = seed_listing(&app, "Dormitel").await;

    app.db.close().await;

    let err = app.state.aggregator.recompute(listing.id).await.unwrap_err();
    assert!(matches!(err, AppError::StorageError(_)));
}

#[tokio::test]
async fn test_recompute_all_repairs_drifted_aggregates() {
    let app = setup().await;
    let first = seed_listing(&app, "Bloomfield").await;
    let second = seed_listing(&app, "Estrada Homes").await;
    app.state.reviews.submit_review(&user(60), first.id, rating(2)).await.unwrap();
    app.state.reviews.submit_review(&user(61), first.id, rating(4)).await.unwrap();

    // A review written straight to storage skips the hooks and leaves the
    // cached aggregate stale
    let content = rating(5).validate().unwrap();
    let stray = Review::new(ReviewId::new(9_001), first.id, UserId::new(62), content, Utc::now());
    app.db.insert_review(&stray).await.unwrap();
    let stale = app.state.listings.get_listing(first.id).await.unwrap();
    assert_eq!(stale.review_count, 2);

    let updated = app
        .state
        .listings
        .recalculate_all(&admin())
        .await
        .unwrap();
    assert_eq!(updated, 2);

    let repaired = app.state.listings.get_listing(first.id).await.unwrap();
    assert_eq!(repaired.review_count, 3);
    assert_eq!(repaired.rating_summary(), derived_summary(&app, first.id).await);

    let second = app.state.listings.get_listing(second.id).await.unwrap();
    assert_eq!(second.rating_summary(), RatingSummary::EMPTY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reviews_settle_on_consistent_aggregate() {
    let dir = TempDir::new().unwrap();
    let app = setup_file(&dir).await;

    let mut listings = Vec::new();
    for i in 0..8 {
        listings.push(seed_listing(&app, &format!("Tower {}", i)).await.id);
    }

    // Every listing gets reviews from several users at once, and recomputes of
    // different listings overlap as well
    let submits = (0..64i64).map(|i| {
        let reviews = app.state.reviews.clone();
        let listing_id = listings[(i % 8) as usize];
        tokio::spawn(async move {
            reviews
                .submit_review(&user(100 + i), listing_id, rating(1 + (i % 5)))
                .await
        })
    });
    let results = futures::future::join_all(submits).await;
    let failures: Vec<_> = results
        .into_iter()
        .map(|joined| joined.unwrap())
        .filter_map(Result::err)
        .collect();
    assert!(failures.is_empty(), "failed submissions: {:?}", failures);

    for listing_id in listings {
        let stored = app.state.listings.get_listing(listing_id).await.unwrap();
        let expected = derived_summary(&app, listing_id).await;
        assert_eq!(stored.review_count, 8);
        assert_eq!(stored.rating_summary(), expected);
    }
}

#[tokio::test]
async fn test_aggregator_is_usable_standalone() {
    let app = setup().await;
    let listing = seed_listing(&app, "Standalone").await;
    app.state.reviews.submit_review(&user(70), listing.id, rating(5)).await.unwrap();

    let aggregator = RatingAggregator::new(app.db.clone(), MissingListingPolicy::Reject);
    assert_eq!(aggregator.missing_listing_policy(), MissingListingPolicy::Reject);
    let summary = aggregator.recompute(listing.id).await.unwrap().unwrap();
    assert_eq!(summary.review_count, 1);
    assert_eq!(summary.average_rating, 5.0);
}
