//! PayPal checkout handlers.
//!
//! `start` sends the buyer to PayPal; PayPal sends them back to `success`
//! or `cancel`. Every outcome is a redirect.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use techshop_core::{OrderId, PaymentId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::payments::CheckoutService;
use crate::state::AppState;

/// Query parameters PayPal appends to the return URL.
#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    #[serde(rename = "PayerID")]
    pub payer_id: Option<String>,
}

fn checkout(state: &AppState) -> CheckoutService<'_> {
    let config = state.config();
    CheckoutService::new(
        state.pool(),
        state.paypal(),
        &config.base_url,
        &config.paypal.currency,
    )
}

/// Create a payment for one of the caller's unpaid orders.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn start(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Redirect> {
    let target = checkout(&state).start(user.id, order_id).await?;
    Ok(Redirect::to(&target))
}

/// PayPal return URL after the buyer approved the payment.
#[instrument(skip(state, query))]
pub async fn success(
    State(state): State<AppState>,
    Path(payment_id): Path<PaymentId>,
    Query(query): Query<SuccessQuery>,
) -> Result<Redirect> {
    let target = checkout(&state)
        .success(payment_id, query.payer_id.as_deref())
        .await?;
    Ok(Redirect::to(&target))
}

/// PayPal cancel URL.
#[instrument(skip(state))]
pub async fn cancel(
    State(state): State<AppState>,
    Path(payment_id): Path<PaymentId>,
) -> Result<Redirect> {
    let target = checkout(&state).cancel(payment_id).await?;
    Ok(Redirect::to(&target))
}
