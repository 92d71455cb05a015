//! Order management.

use techshop_core::{OrderId, OrderStatus};
use techshop_storefront::db::{OrderRepository, RepositoryError};

use super::{CliError, connect};

/// Change an order's fulfillment status.
///
/// # Errors
///
/// Returns an error if the status is unknown or the order doesn't exist.
pub async fn set_status(order_id: i32, status: &str) -> Result<(), CliError> {
    let status: OrderStatus = status
        .parse()
        .map_err(|e: String| CliError::Invalid("status", e))?;

    let pool = connect().await?;
    OrderRepository::new(&pool)
        .set_status(OrderId::new(order_id), status)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CliError::NotFound("order", order_id.to_string()),
            other => other.into(),
        })?;

    tracing::info!(order_id, %status, "Order status updated");
    Ok(())
}
