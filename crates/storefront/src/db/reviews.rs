//! Review repository.

use sqlx::PgPool;

use techshop_core::{ProductId, ReviewId, UserId};

use super::RepositoryError;
use super::catalog::refresh_product_rating;
use crate::models::review::{NewReview, ReviewView};

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a product, newest first, with author usernames.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(&self, product_id: ProductId) -> Result<Vec<ReviewView>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewView>(
            r"
            SELECT r.id, u.username, r.rating, r.comment, r.created_at
            FROM shop.review r
            JOIN shop.user u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Insert a review and refresh the product's average rating atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed this
    /// product.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        review: &NewReview,
    ) -> Result<ReviewId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: ReviewId = sqlx::query_scalar(
            r"
            INSERT INTO shop.review (product_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match RepositoryError::from_unique(e, "already reviewed") {
            RepositoryError::Database(e) => RepositoryError::from_foreign_key(e),
            other => other,
        })?;

        let rating = refresh_product_rating(&mut *tx, product_id).await?;
        tx.commit().await?;

        tracing::debug!(%product_id, %id, rating, "Review stored, product rating refreshed");
        Ok(id)
    }
}
