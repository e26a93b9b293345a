// Services - business logic above the storage layer

pub mod listing_service;
pub mod rating_aggregator;
pub mod review_hooks;
pub mod review_service;

pub use listing_service::ListingService;
pub use rating_aggregator::RatingAggregator;
pub use review_hooks::{ReviewHookRegistry, ReviewMutation, ReviewMutationHook, ReviewOperation};
pub use review_service::{DeletedReview, ReviewService, SubmitOutcome};
