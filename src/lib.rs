// Condo Reviews - listing and review backend with review-driven rating aggregation

// Core types and primitives
pub mod core;

// Domain models
pub mod models;

// Storage and request identity
pub mod infrastructure;

// Business logic: listings, reviews, rating aggregation
pub mod services;

// HTTP surface
pub mod api;

// Common utilities
pub mod app_state;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use app_state::AppState;
pub use error::{AppError, AppResult};
