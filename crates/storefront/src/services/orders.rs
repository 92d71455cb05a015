//! Order placement and order history.

use sqlx::PgPool;
use thiserror::Error;

use techshop_core::{OrderId, UserId};

use crate::db::{OrderRepository, RepositoryError};
use crate::error::ValidationErrors;
use crate::models::order::{Order, OrderDetail, OrderForm};

/// Errors from placing or reading orders.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Checkout with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// The checkout form failed validation.
    #[error("invalid order form: {0}")]
    Validation(ValidationErrors),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }

    /// Validate the checkout form and convert the user's cart into an order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` for bad form fields (checked before
    /// the cart), `OrderError::EmptyCart` when there is nothing to order.
    #[tracing::instrument(skip(self, form))]
    pub async fn place_order(&self, user_id: UserId, form: &OrderForm) -> Result<Order, OrderError> {
        let details = form.validate().map_err(OrderError::Validation)?;

        let order = self
            .orders
            .create_from_cart(user_id, &details)
            .await?
            .ok_or(OrderError::EmptyCart)?;

        tracing::info!(order_id = %order.id, "Order placed");
        Ok(order)
    }

    /// One of the user's orders with its lines and totals.
    ///
    /// Returns `None` for missing orders and for orders owned by someone else.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn detail_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<OrderDetail>, OrderError> {
        let Some(order) = self.orders.get_for_user(order_id, user_id).await? else {
            return Ok(None);
        };
        let items = self.orders.items(order.id).await?;
        Ok(Some(OrderDetail::new(order, items)))
    }
}
