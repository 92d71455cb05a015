//! Favorites repository.

use serde::Serialize;
use sqlx::PgPool;

use techshop_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::favorite::FavoriteRow;

/// Outcome of toggling a favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    Added,
    Removed,
}

/// Repository for the user/product favorite association.
pub struct FavoriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FavoriteRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Remove the favorite if present, otherwise add it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn toggle(&self, user_id: UserId, product_id: ProductId) -> Result<Toggle, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM shop.favorite WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;
        if deleted.rows_affected() > 0 {
            return Ok(Toggle::Removed);
        }

        // A concurrent toggle may have inserted the row first; either way it exists now.
        sqlx::query(
            r"
            INSERT INTO shop.favorite (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await
        .map_err(RepositoryError::from_foreign_key)?;

        Ok(Toggle::Added)
    }

    /// Whether the user has favorited the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contains(&self, user_id: UserId, product_id: ProductId) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM shop.favorite WHERE user_id = $1 AND product_id = $2)",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// The user's favorites, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<FavoriteRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, FavoriteRow>(
            r"
            SELECT f.id AS favorite_id, f.added_at,
                   p.id, p.name, p.slug, p.brand_id, p.category_id, p.description,
                   p.price, p.discount, p.color, p.rating, p.image, p.created_at, p.updated_at
            FROM shop.favorite f
            JOIN shop.product p ON p.id = f.product_id
            WHERE f.user_id = $1
            ORDER BY f.added_at DESC, f.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Number of products the user has favorited.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.favorite WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
