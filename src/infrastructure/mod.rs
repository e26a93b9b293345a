// Infrastructure - storage and request identity

pub mod database;
pub mod middleware;
pub mod sqlite_database;
pub mod viewer;

pub use database::DatabaseInterface;
pub use sqlite_database::SqliteDatabase;
pub use viewer::{ViewerContext, ViewerRole};
