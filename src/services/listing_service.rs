// Listing Service - condo listing management, search and the popular shelf

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::PaginationConfig;
use crate::core::{IdGenerator, ListingId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::DatabaseInterface;
use crate::infrastructure::viewer::ViewerContext;
use crate::models::{
    Listing, ListingInput, ListingPatch, ListingQuery, Page, PageRequest, PopularListing,
    RecentReview,
};
use crate::services::rating_aggregator::RatingAggregator;

pub const POPULAR_LIMIT: u32 = 6;

#[derive(Clone)]
pub struct ListingService {
    db: Arc<dyn DatabaseInterface>,
    ids: Arc<IdGenerator>,
    aggregator: Arc<RatingAggregator>,
    pagination: PaginationConfig,
}

impl ListingService {
    pub fn new(
        db: Arc<dyn DatabaseInterface>,
        ids: Arc<IdGenerator>,
        aggregator: Arc<RatingAggregator>,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            db,
            ids,
            aggregator,
            pagination,
        }
    }

    pub async fn create_listing(
        &self,
        viewer: &ViewerContext,
        input: ListingInput,
    ) -> AppResult<Listing> {
        viewer.require_admin()?;

        let listing = input.into_listing(
            ListingId::new(self.ids.next_id()),
            viewer.user_id,
            Utc::now(),
        )?;
        self.db.create_listing(&listing).await?;

        info!(listing_id = %listing.id, name = %listing.name, "listing created");
        Ok(listing)
    }

    pub async fn get_listing(&self, id: ListingId) -> AppResult<Listing> {
        self.db
            .get_listing(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Condo not found".to_string()))
    }

    pub async fn update_listing(
        &self,
        viewer: &ViewerContext,
        id: ListingId,
        patch: ListingPatch,
    ) -> AppResult<Listing> {
        viewer.require_admin()?;

        let mut listing = self.get_listing(id).await?;
        patch.apply(&mut listing)?;

        if !self.db.update_listing(&listing).await? {
            return Err(AppError::NotFound("Condo not found".to_string()));
        }
        info!(listing_id = %id, "listing updated");

        // Re-read so the aggregate reflects any review written meanwhile
        self.get_listing(id).await
    }

    /// Delete a listing along with its reviews.
    pub async fn delete_listing(&self, viewer: &ViewerContext, id: ListingId) -> AppResult<()> {
        viewer.require_admin()?;

        if !self.db.delete_listing(id).await? {
            return Err(AppError::NotFound("Condo not found".to_string()));
        }
        info!(listing_id = %id, "listing removed");
        Ok(())
    }

    pub async fn search_listings(
        &self,
        query: ListingQuery,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> AppResult<Page<Listing>> {
        if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
            if min > max {
                return Err(AppError::BadRequest(
                    "minPrice cannot be greater than maxPrice".to_string(),
                ));
            }
        }

        let request = PageRequest::from_query(page, limit, &self.pagination);
        let (listings, total) = self.db.search_listings(&query, request).await?;
        Ok(Page::new(listings, request, total))
    }

    /// The most reviewed listings, each with its latest review when one exists.
    pub async fn popular_listings(&self) -> AppResult<Vec<PopularListing>> {
        let listings = self.db.popular_listings(POPULAR_LIMIT).await?;

        let mut popular = Vec::with_capacity(listings.len());
        for listing in listings {
            // A failed review lookup degrades to a listing without a teaser
            let recent_review = match self.db.latest_review_for_listing(listing.id).await {
                Ok(review) => review.map(|r| RecentReview {
                    comment: r.comment,
                    user_id: r.user_id,
                }),
                Err(e) => {
                    warn!(listing_id = %listing.id, error = %e, "failed to fetch recent review");
                    None
                }
            };
            popular.push(PopularListing {
                listing,
                recent_review,
            });
        }
        Ok(popular)
    }

    /// Rebuild every listing's aggregate from its reviews.
    pub async fn recalculate_all(&self, viewer: &ViewerContext) -> AppResult<usize> {
        viewer.require_admin()?;
        self.aggregator.recompute_all().await
    }
}
