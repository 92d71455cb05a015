//! Cart repository.

use sqlx::PgPool;

use techshop_core::{CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::CartItemRow;

/// Upper bound on the quantity of a single cart line.
pub const MAX_LINE_QUANTITY: i32 = 1000;

/// Select list for cart rows joined with their products.
pub(crate) const CART_ITEM_SELECT: &str = r"
    SELECT ci.id AS cart_item_id, ci.quantity, ci.added_at,
           p.id, p.name, p.slug, p.brand_id, p.category_id, p.description,
           p.price, p.discount, p.color, p.rating, p.image, p.created_at, p.updated_at
    FROM shop.cart_item ci
    JOIN shop.product p ON p.id = ci.product_id
";

/// Repository for per-user cart rows.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart lines, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<CartItemRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(&format!(
            "{CART_ITEM_SELECT} WHERE ci.user_id = $1 ORDER BY ci.added_at, ci.id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Add `quantity` of a product, incrementing an existing line.
    ///
    /// A line never exceeds [`MAX_LINE_QUANTITY`]. Returns the line's new
    /// quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product (or user) doesn't exist.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<i32, RepositoryError> {
        sqlx::query_scalar(
            r"
            INSERT INTO shop.cart_item (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = LEAST(shop.cart_item.quantity + EXCLUDED.quantity, $4)
            RETURNING quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity.clamp(1, MAX_LINE_QUANTITY))
        .bind(MAX_LINE_QUANTITY)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_foreign_key)
    }

    /// Delete one of the user's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist or
    /// belongs to another user.
    pub async fn remove(&self, user_id: UserId, item_id: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_item WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Total quantity across the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_quantity(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM shop.cart_item WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(total)
    }
}
