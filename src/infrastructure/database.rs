// Database Interface - storage operations for listings, reviews and the listing rating aggregate

use crate::core::{ListingId, ReviewId, UserId};
use crate::error::AppResult;
use crate::models::{Listing, ListingQuery, PageRequest, RatingSummary, Review};
use async_trait::async_trait;

/// Storage seam used by the services. Every failure surfaces as
/// `AppError::StorageError`, except unique-constraint violations which become
/// `AppError::Conflict` and reviews pointing at a missing listing which become
/// `AppError::NotFound`.
#[async_trait]
pub trait DatabaseInterface: Send + Sync {
    async fn health_check(&self) -> AppResult<()>;

    // Listing operations
    async fn create_listing(&self, listing: &Listing) -> AppResult<()>;
    async fn get_listing(&self, id: ListingId) -> AppResult<Option<Listing>>;
    /// Writes the descriptive fields only; the aggregate columns are untouched.
    async fn update_listing(&self, listing: &Listing) -> AppResult<bool>;
    /// Deletes the listing together with every review attached to it.
    async fn delete_listing(&self, id: ListingId) -> AppResult<bool>;
    /// Newest first. Returns the page of listings and the total match count.
    async fn search_listings(
        &self,
        query: &ListingQuery,
        page: PageRequest,
    ) -> AppResult<(Vec<Listing>, i64)>;
    /// Most reviewed first, ties broken by newest.
    async fn popular_listings(&self, limit: u32) -> AppResult<Vec<Listing>>;
    async fn listing_ids(&self) -> AppResult<Vec<ListingId>>;

    // Review operations
    async fn insert_review(&self, review: &Review) -> AppResult<()>;
    async fn update_review(&self, review: &Review) -> AppResult<bool>;
    async fn delete_review(&self, id: ReviewId) -> AppResult<bool>;
    async fn get_review(&self, id: ReviewId) -> AppResult<Option<Review>>;
    async fn find_review_by_author(
        &self,
        listing_id: ListingId,
        user_id: UserId,
    ) -> AppResult<Option<Review>>;
    /// Most recently posted first.
    async fn reviews_for_listing(
        &self,
        listing_id: ListingId,
        page: PageRequest,
    ) -> AppResult<(Vec<Review>, i64)>;
    async fn latest_review_for_listing(&self, listing_id: ListingId) -> AppResult<Option<Review>>;

    /// Recompute both aggregate columns of a listing from its reviews in a
    /// single statement. Returns what was stored, or `None` when no listing has
    /// this id.
    async fn refresh_rating_summary(
        &self,
        listing_id: ListingId,
    ) -> AppResult<Option<RatingSummary>>;
}
