use std::sync::Arc;

use crate::{
    config::Config,
    core::IdGenerator,
    error::AppResult,
    infrastructure::{DatabaseInterface, SqliteDatabase},
    services::{ListingService, RatingAggregator, ReviewHookRegistry, ReviewService},
};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseInterface>,
    pub aggregator: Arc<RatingAggregator>,
    pub listings: ListingService,
    pub reviews: ReviewService,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let database =
            SqliteDatabase::connect(&config.database.url, config.database.max_connections).await?;
        Ok(Self::with_database(Arc::new(database), config))
    }

    /// Wire services over an already opened database.
    pub fn with_database(db: Arc<dyn DatabaseInterface>, config: Config) -> Self {
        let ids = Arc::new(IdGenerator::new(config.ids.node_id));
        let aggregator = Arc::new(RatingAggregator::new(
            db.clone(),
            config.ratings.missing_listing,
        ));

        // The aggregator is the single place listing ratings get recomputed
        let mut hooks = ReviewHookRegistry::new();
        hooks.register(aggregator.clone());

        let listings = ListingService::new(
            db.clone(),
            ids.clone(),
            aggregator.clone(),
            config.pagination,
        );
        let reviews = ReviewService::new(db.clone(), ids, hooks, config.pagination);

        Self {
            db,
            aggregator,
            listings,
            reviews,
            config,
        }
    }
}
