//! Order route handlers.
//!
//! Everything except the success page requires login. Orders of other
//! users are reported as missing.

use axum::{
    Form, Json,
    extract::{Path, State, rejection::FormRejection},
    response::Redirect,
};
use serde_json::{Value, json};
use tracing::instrument;

use techshop_core::OrderId;

use crate::db::{CartRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Cart, OrderDetail, OrderForm, OrderSummary};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Checkout summary: the cart about to become an order.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Cart>> {
    let rows = CartRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(Cart::from_rows(rows)))
}

/// Place an order from the cart and continue to payment.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    form: std::result::Result<Form<OrderForm>, FormRejection>,
) -> Result<Redirect> {
    let Form(form) = form?;
    let order = OrderService::new(state.pool())
        .place_order(user.id, &form)
        .await?;
    Ok(Redirect::to(&format!("/payments/start/{}", order.id)))
}

/// Landing page after a completed payment.
pub async fn success(Path(order_id): Path<OrderId>) -> Json<Value> {
    Json(json!({ "order_id": order_id }))
}

/// The caller's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderSummary>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// One of the caller's orders with its items.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_order_detail(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    OrderService::new(state.pool())
        .detail_for_user(order_id, user.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

/// Number of orders the caller has placed.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let count = OrderRepository::new(state.pool())
        .count_for_user(user.id)
        .await?;
    Ok(Json(json!({ "count": count })))
}
