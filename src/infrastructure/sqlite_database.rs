use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    QueryBuilder, Row,
};
use std::path::Path;
use std::str::FromStr;

use crate::core::{ListingId, ReviewId, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::DatabaseInterface;
use crate::models::{
    CategoryRatings, ContactInfo, Listing, ListingQuery, PageRequest, Rating, RatingSummary,
    Review,
};

const LISTING_COLUMNS: &str = "id, name, address, description, image, gallery, amenities, distance, price, contact_info, created_by, created_at, average_rating, review_count";
const REVIEW_COLUMNS: &str = "id, listing_id, user_id, rating, comment, recommend, cleanliness, location, amenities, value_for_money, created_at, updated_at";

/// SQLite implementation of the database interface
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (creating if needed) the database at `url` and make sure the schema exists.
    pub async fn connect(url: &str, max_connections: u32) -> AppResult<Self> {
        ensure_parent_dir(url)?;

        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::ConfigurationError(format!("Invalid DATABASE_URL '{}': {}", url, e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to connect to {}: {}", url, e)))?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    /// Single-connection in-memory database. The connection is never recycled,
    /// otherwise the data would vanish with it.
    pub async fn new_in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            AppError::StorageError(format!("Failed to build in-memory SQLite options: {}", e))
        })?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    /// Close every pooled connection. Subsequent calls fail with a storage error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Create tables and indexes if they don't exist yet
    pub async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listings (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                description TEXT NOT NULL,
                image TEXT NOT NULL,
                gallery TEXT NOT NULL,
                amenities TEXT NOT NULL,
                distance REAL NOT NULL DEFAULT 0,
                price INTEGER,
                contact_info TEXT NOT NULL,
                created_by INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                average_rating REAL NOT NULL DEFAULT 0,
                review_count INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::StorageError(format!("Failed to create listings table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY,
                listing_id INTEGER NOT NULL REFERENCES listings(id) ON DELETE CASCADE,
                user_id INTEGER NOT NULL,
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                comment TEXT,
                recommend INTEGER,
                cleanliness INTEGER,
                location INTEGER,
                amenities INTEGER,
                value_for_money INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE (user_id, listing_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::StorageError(format!("Failed to create reviews table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_listing ON reviews(listing_id, updated_at DESC)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to create reviews index: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_popularity ON listings(review_count DESC, created_at DESC)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to create listings index: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl DatabaseInterface for SqliteDatabase {
    async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::StorageError(format!("Database health check failed: {}", e)))?;
        Ok(())
    }

    async fn create_listing(&self, listing: &Listing) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO listings (id, name, address, description, image, gallery, amenities, distance, price, contact_info, created_by, created_at, average_rating, review_count) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(listing.id.value())
        .bind(&listing.name)
        .bind(&listing.address)
        .bind(&listing.description)
        .bind(&listing.image)
        .bind(to_json(&listing.gallery)?)
        .bind(to_json(&listing.amenities)?)
        .bind(listing.distance)
        .bind(listing.price)
        .bind(to_json(&listing.contact_info)?)
        .bind(listing.created_by.value())
        .bind(listing.created_at.timestamp_millis())
        .bind(listing.average_rating)
        .bind(listing.review_count)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_sqlx(&format!("Listing {}", listing.id), e))?;
        Ok(())
    }

    async fn get_listing(&self, id: ListingId) -> AppResult<Option<Listing>> {
        let row = sqlx::query(&format!("SELECT {} FROM listings WHERE id = ?", LISTING_COLUMNS))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to get listing {}: {}", id, e)))?;

        row.as_ref().map(listing_from_row).transpose()
    }

    async fn update_listing(&self, listing: &Listing) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE listings SET name = ?, address = ?, description = ?, image = ?, gallery = ?, amenities = ?, distance = ?, price = ?, contact_info = ? WHERE id = ?",
        )
        .bind(&listing.name)
        .bind(&listing.address)
        .bind(&listing.description)
        .bind(&listing.image)
        .bind(to_json(&listing.gallery)?)
        .bind(to_json(&listing.amenities)?)
        .bind(listing.distance)
        .bind(listing.price)
        .bind(to_json(&listing.contact_info)?)
        .bind(listing.id.value())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::StorageError(format!("Failed to update listing {}: {}", listing.id, e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_listing(&self, id: ListingId) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query("DELETE FROM reviews WHERE listing_id = ?")
            .bind(id.value())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to delete reviews of listing {}: {}", id, e))
            })?;

        let result = sqlx::query("DELETE FROM listings WHERE id = ?")
            .bind(id.value())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to delete listing {}: {}", id, e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to commit listing delete: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn search_listings(
        &self,
        query: &ListingQuery,
        page: PageRequest,
    ) -> AppResult<(Vec<Listing>, i64)> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM listings WHERE 1 = 1");
        push_listing_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to count listings: {}", e)))?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM listings WHERE 1 = 1",
            LISTING_COLUMNS
        ));
        push_listing_filters(&mut qb, query);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        qb.push_bind(page.limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to search listings: {}", e)))?;

        let listings = rows.iter().map(listing_from_row).collect::<AppResult<Vec<_>>>()?;
        Ok((listings, total))
    }

    async fn popular_listings(&self, limit: u32) -> AppResult<Vec<Listing>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM listings ORDER BY review_count DESC, created_at DESC, id DESC LIMIT ?",
            LISTING_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::StorageError(format!("Failed to get popular listings: {}", e)))?;

        rows.iter().map(listing_from_row).collect()
    }

    async fn listing_ids(&self) -> AppResult<Vec<ListingId>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM listings ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to list listing ids: {}", e)))?;
        Ok(ids.into_iter().map(ListingId::new).collect())
    }

    async fn insert_review(&self, review: &Review) -> AppResult<()> {
        let categories = &review.category_ratings;
        sqlx::query(
            "INSERT INTO reviews (id, listing_id, user_id, rating, comment, recommend, cleanliness, location, amenities, value_for_money, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(review.id.value())
        .bind(review.listing_id.value())
        .bind(review.user_id.value())
        .bind(i64::from(review.rating))
        .bind(review.comment.as_deref())
        .bind(review.recommend)
        .bind(categories.cleanliness.map(i64::from))
        .bind(categories.location.map(i64::from))
        .bind(categories.amenities.map(i64::from))
        .bind(categories.value_for_money.map(i64::from))
        .bind(review.created_at.timestamp_millis())
        .bind(review.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::from_sqlx(
                &format!(
                    "Review of listing {} by user {}",
                    review.listing_id, review.user_id
                ),
                e,
            )
        })?;
        Ok(())
    }

    async fn update_review(&self, review: &Review) -> AppResult<bool> {
        let categories = &review.category_ratings;
        let result = sqlx::query(
            "UPDATE reviews SET rating = ?, comment = ?, recommend = ?, cleanliness = ?, location = ?, amenities = ?, value_for_money = ?, updated_at = ? WHERE id = ?",
        )
        .bind(i64::from(review.rating))
        .bind(review.comment.as_deref())
        .bind(review.recommend)
        .bind(categories.cleanliness.map(i64::from))
        .bind(categories.location.map(i64::from))
        .bind(categories.amenities.map(i64::from))
        .bind(categories.value_for_money.map(i64::from))
        .bind(review.updated_at.timestamp_millis())
        .bind(review.id.value())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::StorageError(format!("Failed to update review {}: {}", review.id, e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_review(&self, id: ReviewId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to delete review {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_review(&self, id: ReviewId) -> AppResult<Option<Review>> {
        let row = sqlx::query(&format!("SELECT {} FROM reviews WHERE id = ?", REVIEW_COLUMNS))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to get review {}: {}", id, e)))?;

        row.as_ref().map(review_from_row).transpose()
    }

    async fn find_review_by_author(
        &self,
        listing_id: ListingId,
        user_id: UserId,
    ) -> AppResult<Option<Review>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM reviews WHERE listing_id = ? AND user_id = ?",
            REVIEW_COLUMNS
        ))
        .bind(listing_id.value())
        .bind(user_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::StorageError(format!(
                "Failed to find review of listing {} by user {}: {}",
                listing_id, user_id, e
            ))
        })?;

        row.as_ref().map(review_from_row).transpose()
    }

    async fn reviews_for_listing(
        &self,
        listing_id: ListingId,
        page: PageRequest,
    ) -> AppResult<(Vec<Review>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE listing_id = ?")
            .bind(listing_id.value())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to count reviews of listing {}: {}", listing_id, e))
            })?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM reviews WHERE listing_id = ? ORDER BY updated_at DESC, id DESC LIMIT ? OFFSET ?",
            REVIEW_COLUMNS
        ))
        .bind(listing_id.value())
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::StorageError(format!("Failed to get reviews of listing {}: {}", listing_id, e))
        })?;

        let reviews = rows.iter().map(review_from_row).collect::<AppResult<Vec<_>>>()?;
        Ok((reviews, total))
    }

    async fn latest_review_for_listing(&self, listing_id: ListingId) -> AppResult<Option<Review>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM reviews WHERE listing_id = ? ORDER BY updated_at DESC, id DESC LIMIT 1",
            REVIEW_COLUMNS
        ))
        .bind(listing_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::StorageError(format!(
                "Failed to get latest review of listing {}: {}",
                listing_id, e
            ))
        })?;

        row.as_ref().map(review_from_row).transpose()
    }

    async fn refresh_rating_summary(
        &self,
        listing_id: ListingId,
    ) -> AppResult<Option<RatingSummary>> {
        // One statement takes the write lock up front, so it waits out other
        // writers instead of failing a read-to-write upgrade
        let row = sqlx::query(
            r#"
            UPDATE listings SET
                review_count = (SELECT COUNT(*) FROM reviews WHERE listing_id = ?1),
                average_rating = COALESCE((SELECT AVG(rating) FROM reviews WHERE listing_id = ?1), 0.0)
            WHERE id = ?1
            RETURNING average_rating, review_count
            "#,
        )
        .bind(listing_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::StorageError(format!(
                "Failed to write rating summary of listing {}: {}",
                listing_id, e
            ))
        })?;

        row.map(|row| -> AppResult<RatingSummary> {
            Ok(RatingSummary {
                average_rating: column(&row, "average_rating")?,
                review_count: column(&row, "review_count")?,
            })
        })
        .transpose()
    }
}

fn push_listing_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &ListingQuery) {
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (name LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" ESCAPE '\\' OR address LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" ESCAPE '\\' OR description LIKE ");
        qb.push_bind(pattern);
        qb.push(" ESCAPE '\\')");
    }
    if let Some(min_price) = query.min_price {
        qb.push(" AND price >= ");
        qb.push_bind(min_price);
    }
    if let Some(max_price) = query.max_price {
        qb.push(" AND price <= ");
        qb.push_bind(max_price);
    }
}

/// Search terms are literal substrings, not LIKE patterns.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn ensure_parent_dir(url: &str) -> AppResult<()> {
    let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::ConfigurationError(format!(
                "Failed to create database directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string(value)
        .map_err(|e| AppError::Internal(format!("Failed to encode column value: {}", e)))
}

fn from_json<T: serde::de::DeserializeOwned>(raw: &str, column: &str) -> AppResult<T> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::StorageError(format!("Corrupt {} column: {}", column, e)))
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> AppResult<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| AppError::StorageError(format!("Failed to read column {}: {}", name, e)))
}

fn timestamp(millis: i64, name: &str) -> AppResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| AppError::StorageError(format!("Invalid timestamp in column {}", name)))
}

fn rating_column(row: &SqliteRow, name: &str) -> AppResult<Option<Rating>> {
    column::<Option<i64>>(row, name)?
        .map(|v| {
            Rating::new(v)
                .map_err(|e| AppError::StorageError(format!("Corrupt {} column: {}", name, e)))
        })
        .transpose()
}

fn listing_from_row(row: &SqliteRow) -> AppResult<Listing> {
    Ok(Listing {
        id: ListingId::new(column(row, "id")?),
        name: column(row, "name")?,
        address: column(row, "address")?,
        description: column(row, "description")?,
        image: column(row, "image")?,
        gallery: from_json(&column::<String>(row, "gallery")?, "gallery")?,
        amenities: from_json(&column::<String>(row, "amenities")?, "amenities")?,
        distance: column(row, "distance")?,
        price: column(row, "price")?,
        contact_info: from_json::<ContactInfo>(&column::<String>(row, "contact_info")?, "contact_info")?,
        created_by: UserId::new(column(row, "created_by")?),
        created_at: timestamp(column(row, "created_at")?, "created_at")?,
        average_rating: column(row, "average_rating")?,
        review_count: column(row, "review_count")?,
    })
}

fn review_from_row(row: &SqliteRow) -> AppResult<Review> {
    let rating = rating_column(row, "rating")?
        .ok_or_else(|| AppError::StorageError("Review without rating".to_string()))?;

    Ok(Review {
        id: ReviewId::new(column(row, "id")?),
        listing_id: ListingId::new(column(row, "listing_id")?),
        user_id: UserId::new(column(row, "user_id")?),
        rating,
        comment: column(row, "comment")?,
        recommend: column(row, "recommend")?,
        category_ratings: CategoryRatings {
            cleanliness: rating_column(row, "cleanliness")?,
            location: rating_column(row, "location")?,
            amenities: rating_column(row, "amenities")?,
            value_for_money: rating_column(row, "value_for_money")?,
        },
        created_at: timestamp(column(row, "created_at")?, "created_at")?,
        updated_at: timestamp(column(row, "updated_at")?, "updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("taft"), "taft");
    }

    #[test]
    fn test_ensure_parent_dir_skips_memory() {
        assert!(ensure_parent_dir("sqlite::memory:").is_ok());
        assert!(ensure_parent_dir("postgres://localhost/db").is_ok());
    }

    #[test]
    fn test_ensure_parent_dir_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("reviews.db");
        let url = format!("sqlite:{}?mode=rwc", db_path.display());
        ensure_parent_dir(&url).unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
