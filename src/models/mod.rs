// Domain models - listings, reviews and the aggregate derived from them

pub mod listing;
pub mod pagination;
pub mod rating;
pub mod review;

pub use listing::{ContactInfo, Listing, ListingInput, ListingPatch, ListingQuery, PopularListing, RecentReview};
pub use pagination::{Page, PageRequest};
pub use rating::{Rating, RatingSummary};
pub use review::{CategoryRatings, CategoryRatingsInput, Review, ReviewContent, ReviewInput};
