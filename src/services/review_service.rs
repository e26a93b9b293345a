// Review Service - review create/update/delete and reads
// Every committed write is followed by the registered review hooks before returning

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::config::PaginationConfig;
use crate::core::{IdGenerator, ListingId, ReviewId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::DatabaseInterface;
use crate::infrastructure::viewer::ViewerContext;
use crate::models::{Page, PageRequest, RatingSummary, Review, ReviewContent, ReviewInput};
use crate::services::review_hooks::{ReviewHookRegistry, ReviewMutation, ReviewOperation};

/// Result of a submit: the viewer's first review of the listing, or a rewrite of it
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(Review),
    Updated(Review),
}

impl SubmitOutcome {
    pub fn review(&self) -> &Review {
        match self {
            SubmitOutcome::Created(review) | SubmitOutcome::Updated(review) => review,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, SubmitOutcome::Created(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeletedReview {
    pub review: Review,
    /// The listing's aggregate after the delete, if the listing still exists
    pub listing_summary: Option<RatingSummary>,
}

#[derive(Clone)]
pub struct ReviewService {
    db: Arc<dyn DatabaseInterface>,
    ids: Arc<IdGenerator>,
    hooks: ReviewHookRegistry,
    pagination: PaginationConfig,
}

impl ReviewService {
    pub fn new(
        db: Arc<dyn DatabaseInterface>,
        ids: Arc<IdGenerator>,
        hooks: ReviewHookRegistry,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            db,
            ids,
            hooks,
            pagination,
        }
    }

    /// Create the viewer's review of a listing, or rewrite it if one already exists.
    pub async fn submit_review(
        &self,
        viewer: &ViewerContext,
        listing_id: ListingId,
        input: ReviewInput,
    ) -> AppResult<SubmitOutcome> {
        let content = input.validate()?;
        self.ensure_listing(listing_id).await?;

        if let Some(existing) = self.db.find_review_by_author(listing_id, viewer.user_id).await? {
            return self.rewrite(existing, content).await;
        }

        let review = Review::new(
            ReviewId::new(self.ids.next_id()),
            listing_id,
            viewer.user_id,
            content.clone(),
            Utc::now(),
        );
        match self.persist_create(&review).await {
            Ok(()) => Ok(SubmitOutcome::Created(review)),
            // A concurrent submit by the same viewer inserted first
            Err(AppError::Conflict(_)) => {
                let existing = self
                    .db
                    .find_review_by_author(listing_id, viewer.user_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;
                self.rewrite(existing, content).await
            }
            Err(e) => Err(e),
        }
    }

    /// Strict create. Fails with `Conflict` if the viewer already reviewed this listing.
    pub async fn create_review(
        &self,
        viewer: &ViewerContext,
        listing_id: ListingId,
        input: ReviewInput,
    ) -> AppResult<Review> {
        let content = input.validate()?;
        self.ensure_listing(listing_id).await?;

        let review = Review::new(
            ReviewId::new(self.ids.next_id()),
            listing_id,
            viewer.user_id,
            content,
            Utc::now(),
        );
        self.persist_create(&review).await?;
        Ok(review)
    }

    /// Rewrite a review. Only its author may do this.
    pub async fn update_review(
        &self,
        viewer: &ViewerContext,
        review_id: ReviewId,
        input: ReviewInput,
    ) -> AppResult<Review> {
        let content = input.validate()?;
        let mut review = self.get_review(review_id).await?;

        if review.user_id != viewer.user_id {
            return Err(AppError::Forbidden(
                "Not authorized to update this review".to_string(),
            ));
        }

        review.apply(content, Utc::now());
        self.persist_update(&review).await?;
        Ok(review)
    }

    /// Remove a review. Its author and admins may do this.
    pub async fn delete_review(
        &self,
        viewer: &ViewerContext,
        review_id: ReviewId,
    ) -> AppResult<DeletedReview> {
        let review = self.get_review(review_id).await?;

        if review.user_id != viewer.user_id && !viewer.is_admin() {
            return Err(AppError::Forbidden(
                "Not authorized to delete this review".to_string(),
            ));
        }

        if !self.db.delete_review(review_id).await? {
            return Err(AppError::NotFound("Review not found".to_string()));
        }
        info!(%review_id, listing_id = %review.listing_id, "review deleted");

        self.hooks
            .notify(&ReviewMutation {
                review_id,
                listing_id: review.listing_id,
                operation: ReviewOperation::Delete,
            })
            .await?;

        let listing_summary = self
            .db
            .get_listing(review.listing_id)
            .await?
            .map(|listing| listing.rating_summary());

        Ok(DeletedReview {
            review,
            listing_summary,
        })
    }

    pub async fn get_review(&self, review_id: ReviewId) -> AppResult<Review> {
        self.db
            .get_review(review_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Review not found".to_string()))
    }

    /// Reviews of a listing, most recent first.
    pub async fn reviews_for_listing(
        &self,
        listing_id: ListingId,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> AppResult<Page<Review>> {
        let request = PageRequest::from_query(page, limit, &self.pagination);
        let (reviews, total) = self.db.reviews_for_listing(listing_id, request).await?;
        Ok(Page::new(reviews, request, total))
    }

    /// The viewer's own review of a listing, if any.
    pub async fn review_by_viewer(
        &self,
        viewer: &ViewerContext,
        listing_id: ListingId,
    ) -> AppResult<Option<Review>> {
        self.db.find_review_by_author(listing_id, viewer.user_id).await
    }

    async fn ensure_listing(&self, listing_id: ListingId) -> AppResult<()> {
        match self.db.get_listing(listing_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Condo not found".to_string())),
        }
    }

    async fn rewrite(
        &self,
        mut existing: Review,
        content: ReviewContent,
    ) -> AppResult<SubmitOutcome> {
        existing.apply(content, Utc::now());
        self.persist_update(&existing).await?;
        Ok(SubmitOutcome::Updated(existing))
    }

    async fn persist_create(&self, review: &Review) -> AppResult<()> {
        // The listing can disappear between the existence check and the insert
        self.db.insert_review(review).await.map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound("Condo not found".to_string()),
            other => other,
        })?;
        info!(
            review_id = %review.id,
            listing_id = %review.listing_id,
            user_id = %review.user_id,
            rating = review.rating.value(),
            "review created"
        );

        self.hooks
            .notify(&ReviewMutation {
                review_id: review.id,
                listing_id: review.listing_id,
                operation: ReviewOperation::Create,
            })
            .await
    }

    async fn persist_update(&self, review: &Review) -> AppResult<()> {
        if !self.db.update_review(review).await? {
            return Err(AppError::NotFound("Review not found".to_string()));
        }
        info!(
            review_id = %review.id,
            listing_id = %review.listing_id,
            rating = review.rating.value(),
            "review updated"
        );

        self.hooks
            .notify(&ReviewMutation {
                review_id: review.id,
                listing_id: review.listing_id,
                operation: ReviewOperation::Update,
            })
            .await
    }
}
