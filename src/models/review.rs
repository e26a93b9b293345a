use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{ListingId, ReviewId, UserId};
use crate::error::{AppError, AppResult};
use crate::models::rating::Rating;

/// Optional per-aspect scores, each 1 to 5 when present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRatings {
    pub cleanliness: Option<Rating>,
    pub location: Option<Rating>,
    pub amenities: Option<Rating>,
    pub value_for_money: Option<Rating>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub listing_id: ListingId,
    pub user_id: UserId,
    pub rating: Rating,
    pub comment: Option<String>,
    pub recommend: Option<bool>,
    pub category_ratings: CategoryRatings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn new(
        id: ReviewId,
        listing_id: ListingId,
        user_id: UserId,
        content: ReviewContent,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            listing_id,
            user_id,
            rating: content.rating,
            comment: content.comment,
            recommend: content.recommend,
            category_ratings: content.category_ratings,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the user-editable content in place.
    pub fn apply(&mut self, content: ReviewContent, now: DateTime<Utc>) {
        self.rating = content.rating;
        self.comment = content.comment;
        self.recommend = content.recommend;
        self.category_ratings = content.category_ratings;
        self.updated_at = now;
    }
}

/// Validated review content, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewContent {
    pub rating: Rating,
    pub comment: Option<String>,
    pub recommend: Option<bool>,
    pub category_ratings: CategoryRatings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRatingsInput {
    pub cleanliness: Option<i64>,
    pub location: Option<i64>,
    pub amenities: Option<i64>,
    pub value_for_money: Option<i64>,
}

/// Raw review fields as submitted by a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub rating: i64,
    pub comment: Option<String>,
    pub recommend: Option<bool>,
    pub category_ratings: Option<CategoryRatingsInput>,
}

impl ReviewInput {
    pub fn validate(self) -> AppResult<ReviewContent> {
        let rating = Rating::new(self.rating).map_err(AppError::Validation)?;

        let categories = self.category_ratings.unwrap_or_default();
        let category = |name: &str, value: Option<i64>| -> AppResult<Option<Rating>> {
            value
                .map(|v| {
                    Rating::new(v).map_err(|e| AppError::Validation(format!("{}: {}", name, e)))
                })
                .transpose()
        };

        Ok(ReviewContent {
            rating,
            comment: self
                .comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            recommend: self.recommend,
            category_ratings: CategoryRatings {
                cleanliness: category("cleanliness", categories.cleanliness)?,
                location: category("location", categories.location)?,
                amenities: category("amenities", categories.amenities)?,
                value_for_money: category("valueForMoney", categories.value_for_money)?,
            },
        })
    }
}
