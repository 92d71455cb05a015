//! Cart route handlers.
//!
//! Every handler requires login. Writes take JSON bodies and answer with
//! small JSON objects the page script reads.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use techshop_core::{CartItemId, ProductId};

use crate::db::carts::MAX_LINE_QUANTITY;
use crate::db::{CartRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: Option<i64>,
}

impl AddToCart {
    /// Requested quantity; absent or non-positive counts as one, and a
    /// line is capped at [`MAX_LINE_QUANTITY`].
    fn quantity(&self) -> i32 {
        self.quantity
            .filter(|q| *q > 0)
            .map_or(1, |q| {
                i32::try_from(q.min(i64::from(MAX_LINE_QUANTITY))).unwrap_or(MAX_LINE_QUANTITY)
            })
    }
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromCart {
    pub cart_item_id: CartItemId,
}

#[derive(Debug, Serialize)]
pub struct CartTotals {
    pub success: bool,
    pub total_price: Decimal,
    pub total_quantity: i64,
}

/// Show the caller's cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Cart>> {
    let rows = CartRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(Cart::from_rows(rows)))
}

/// Add a product, or more of it, to the cart.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<AddToCart>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(payload) = payload?;
    let quantity = CartRepository::new(state.pool())
        .add(user.id, payload.product_id, payload.quantity())
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Product not found".to_string()),
            other => other.into(),
        })?;

    tracing::debug!(product_id = %payload.product_id, quantity, "Cart line updated");
    Ok(Json(json!({ "success": true })))
}

/// Remove one of the caller's cart lines.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<RemoveFromCart>, JsonRejection>,
) -> Result<Json<CartTotals>> {
    let Json(payload) = payload?;
    let carts = CartRepository::new(state.pool());
    carts
        .remove(user.id, payload.cart_item_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Item not found".to_string()),
            other => other.into(),
        })?;

    let cart = Cart::from_rows(carts.list(user.id).await?);
    Ok(Json(CartTotals {
        success: true,
        total_price: cart.total_price,
        total_quantity: cart.total_quantity,
    }))
}

/// Total quantity in the cart, for the header badge.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let count = CartRepository::new(state.pool())
        .total_quantity(user.id)
        .await?;
    Ok(Json(json!({ "count": count })))
}
