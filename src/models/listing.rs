use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{ListingId, UserId};
use crate::error::{AppError, AppResult};
use crate::models::rating::RatingSummary;

pub const DEFAULT_IMAGE: &str = "../images/default-condo.jpg";
pub const MAX_GALLERY_IMAGES: usize = 4;

pub fn default_gallery() -> Vec<String> {
    (1..=MAX_GALLERY_IMAGES)
        .map(|i| format!("../images/default-gallery-{}.jpg", i))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// A condo listing. `average_rating` and `review_count` are a cache of the
/// listing's reviews and are only ever written by the rating aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub name: String,
    pub address: String,
    pub description: String,
    pub image: String,
    pub gallery: Vec<String>,
    pub amenities: Vec<String>,
    /// Distance from the university in metres
    pub distance: f64,
    pub price: Option<i64>,
    pub contact_info: ContactInfo,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub average_rating: f64,
    pub review_count: i64,
}

impl Listing {
    pub fn rating_summary(&self) -> RatingSummary {
        RatingSummary {
            average_rating: self.average_rating,
            review_count: self.review_count,
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        if self.address.trim().is_empty() {
            return Err(AppError::Validation("Address is required".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::Validation("Description is required".to_string()));
        }
        if self.gallery.len() > MAX_GALLERY_IMAGES {
            return Err(AppError::Validation(format!(
                "Gallery cannot have more than {} images",
                MAX_GALLERY_IMAGES
            )));
        }
        if !self.distance.is_finite() || self.distance < 0.0 {
            return Err(AppError::Validation(
                "Distance must be a non-negative number".to_string(),
            ));
        }
        if matches!(self.price, Some(p) if p < 0) {
            return Err(AppError::Validation("Price cannot be negative".to_string()));
        }
        Ok(())
    }
}

/// Admin-supplied fields for a new listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingInput {
    pub name: String,
    pub address: String,
    pub description: String,
    pub image: Option<String>,
    pub gallery: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    pub distance: Option<f64>,
    pub price: Option<i64>,
    pub contact_info: Option<ContactInfo>,
}

impl ListingInput {
    pub fn into_listing(
        self,
        id: ListingId,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Listing> {
        let listing = Listing {
            id,
            name: self.name.trim().to_string(),
            address: self.address,
            description: self.description,
            image: self.image.unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
            gallery: self.gallery.unwrap_or_else(default_gallery),
            amenities: self.amenities.unwrap_or_default(),
            distance: self.distance.unwrap_or(0.0),
            price: self.price,
            contact_info: self.contact_info.unwrap_or_default(),
            created_by,
            created_at: now,
            average_rating: 0.0,
            review_count: 0,
        };
        listing.validate()?;
        Ok(listing)
    }
}

/// Partial update of a listing's descriptive fields. Absent fields are left as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub gallery: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    pub distance: Option<f64>,
    pub price: Option<i64>,
    pub contact_info: Option<ContactInfo>,
}

impl ListingPatch {
    pub fn apply(self, listing: &mut Listing) -> AppResult<()> {
        // Empty strings keep the current value
        if let Some(name) = self.name.filter(|s| !s.trim().is_empty()) {
            listing.name = name.trim().to_string();
        }
        if let Some(address) = self.address.filter(|s| !s.trim().is_empty()) {
            listing.address = address;
        }
        if let Some(description) = self.description.filter(|s| !s.trim().is_empty()) {
            listing.description = description;
        }
        if let Some(image) = self.image.filter(|s| !s.trim().is_empty()) {
            listing.image = image;
        }
        if let Some(gallery) = self.gallery {
            listing.gallery = gallery;
        }
        if let Some(amenities) = self.amenities {
            listing.amenities = amenities;
        }
        if let Some(distance) = self.distance {
            listing.distance = distance;
        }
        if self.price.is_some() {
            listing.price = self.price;
        }
        if let Some(contact_info) = self.contact_info {
            listing.contact_info = contact_info;
        }
        listing.validate()
    }
}

/// Search filters for the listing index.
#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentReview {
    pub comment: Option<String>,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularListing {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_review: Option<RecentReview>,
}
