// Rating Aggregator - keeps a listing's averageRating/reviewCount in step with its reviews

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::MissingListingPolicy;
use crate::core::ListingId;
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::DatabaseInterface;
use crate::models::RatingSummary;
use crate::services::review_hooks::{ReviewMutation, ReviewMutationHook};

const LOCK_STRIPES: usize = 64;

/// Recomputes the cached aggregate of a listing from its full review set.
///
/// Recomputes of the same listing are serialized through a striped lock, and
/// the storage layer derives and writes both fields in one statement, so a
/// listing never shows one field updated without the other.
pub struct RatingAggregator {
    db: Arc<dyn DatabaseInterface>,
    missing_listing: MissingListingPolicy,
    stripes: Vec<Mutex<()>>,
}

impl RatingAggregator {
    pub fn new(db: Arc<dyn DatabaseInterface>, missing_listing: MissingListingPolicy) -> Self {
        Self {
            db,
            missing_listing,
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn missing_listing_policy(&self) -> MissingListingPolicy {
        self.missing_listing
    }

    fn stripe(&self, listing_id: ListingId) -> &Mutex<()> {
        let index = listing_id.value().rem_euclid(LOCK_STRIPES as i64) as usize;
        &self.stripes[index]
    }

    /// Returns the summary that was written, or `None` when the listing does not
    /// exist and the policy is `Ignore`.
    pub async fn recompute(&self, listing_id: ListingId) -> AppResult<Option<RatingSummary>> {
        let _guard = self.stripe(listing_id).lock().await;

        let Some(summary) = self.db.refresh_rating_summary(listing_id).await? else {
            return match self.missing_listing {
                MissingListingPolicy::Ignore => {
                    debug!(%listing_id, "listing not found, skipping rating recompute");
                    Ok(None)
                }
                MissingListingPolicy::Reject => Err(AppError::NotFound(format!(
                    "Condo {} not found",
                    listing_id
                ))),
            };
        };

        info!(
            %listing_id,
            average_rating = summary.average_rating,
            review_count = summary.review_count,
            "updated listing rating"
        );
        Ok(Some(summary))
    }

    /// Recompute every listing. Returns how many listings were updated.
    pub async fn recompute_all(&self) -> AppResult<usize> {
        let ids = self.db.listing_ids().await?;
        let mut updated = 0;
        for id in ids {
            // A listing deleted mid-walk is not an error here whatever the policy
            match self.recompute(id).await {
                Ok(Some(_)) => updated += 1,
                Ok(None) | Err(AppError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        info!(updated, "recalculated ratings for all listings");
        Ok(updated)
    }
}

#[async_trait]
impl ReviewMutationHook for RatingAggregator {
    async fn after_mutation(&self, mutation: &ReviewMutation) -> AppResult<()> {
        self.recompute(mutation.listing_id).await.map(|_| ())
    }

    fn name(&self) -> &str {
        "rating_aggregator"
    }
}
