//! Order repository.
//!
//! Orders are written once at checkout; afterwards only the status, the paid
//! flag and the provider payment id change.

use rust_decimal::Decimal;
use sqlx::PgPool;

use techshop_core::{Discount, OrderId, OrderStatus, ProductId, UserId, pricing};

use super::RepositoryError;
use crate::models::order::{NewOrder, Order, OrderLine, OrderSummary};

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.full_name, o.email, o.phone, o.address, \
     o.status, o.paid, o.payment_id, o.created_at, o.updated_at";

/// Repository for orders and their line items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's cart into an order.
    ///
    /// In one transaction: lock the cart rows, insert the order, copy each
    /// line with the product's current final price, and empty the cart.
    /// Returns `None` without writing anything when the cart is empty.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// committed in that case.
    pub async fn create_from_cart(
        &self,
        user_id: UserId,
        details: &NewOrder,
    ) -> Result<Option<Order>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct CartLine {
            product_id: ProductId,
            quantity: i32,
            price: Decimal,
            discount: Discount,
        }

        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT ci.product_id, ci.quantity, p.price, p.discount
            FROM shop.cart_item ci
            JOIN shop.product p ON p.id = ci.product_id
            WHERE ci.user_id = $1
            ORDER BY ci.added_at, ci.id
            FOR UPDATE OF ci
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Ok(None);
        }

        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO shop.order AS o (user_id, full_name, email, phone, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(&details.full_name)
        .bind(&details.email)
        .bind(&details.phone)
        .bind(&details.address)
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                r"
                INSERT INTO shop.order_item (order_id, product_id, price, quantity)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(pricing::discounted_price(line.price, line.discount))
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM shop.cart_item WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(order))
    }

    /// Get an order only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order o WHERE o.id = $1 AND o.user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Line items of an order with product names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderLine>(
            r"
            SELECT oi.id, oi.order_id, oi.product_id, oi.price, oi.quantity,
                   p.name AS product_name, p.slug AS product_slug
            FROM shop.order_item oi
            JOIN shop.product p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// The user's orders, newest first, with totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummary>(&format!(
            r"
            SELECT {ORDER_COLUMNS},
                   COALESCE(SUM(oi.price * oi.quantity), 0) AS total_cost,
                   COALESCE(SUM(oi.quantity), 0)::BIGINT AS total_quantity
            FROM shop.order o
            LEFT JOIN shop.order_item oi ON oi.order_id = o.id
            WHERE o.user_id = $1
            GROUP BY o.id
            ORDER BY o.created_at DESC, o.id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Number of orders the user has placed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_user(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.order WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Total cost of an order's items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_cost(&self, order_id: OrderId) -> Result<Decimal, RepositoryError> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(price * quantity), 0) FROM shop.order_item WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_one(self.pool)
        .await?;
        Ok(pricing::round_money(total))
    }

    /// Change an order's fulfillment status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.order SET status = $1, updated_at = now() WHERE id = $2")
                .bind(status)
                .bind(id)
                .execute(self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
