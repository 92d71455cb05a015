//! Newsletter subscription.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use techshop_core::Email;

use crate::db::{RepositoryError, SubscriberRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// Subscribe an email address to the newsletter.
///
/// Only POST is routed, so other methods get 405 from the router.
#[instrument(skip(state, payload))]
pub async fn subscribe(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(payload) = payload?;
    let raw = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;

    let email = Email::normalized(raw)
        .map_err(|_| AppError::BadRequest("Invalid email address".to_string()))?;

    let subscriber_id = SubscriberRepository::new(state.pool())
        .subscribe(&email)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AppError::BadRequest("Already subscribed".to_string()),
            other => other.into(),
        })?;

    tracing::info!(%subscriber_id, "Newsletter subscription added");
    Ok(Json(json!({ "success": true })))
}
