//! Favorites route handlers. All require login.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use techshop_core::ProductId;

use crate::db::favorites::Toggle;
use crate::db::{FavoriteRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::FavoriteView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ToggleFavorite {
    pub product_id: ProductId,
}

#[derive(Debug, Serialize)]
pub struct ToggleResult {
    pub status: Toggle,
}

/// Add the product to favorites, or remove it if already there.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<ToggleFavorite>, JsonRejection>,
) -> Result<Json<ToggleResult>> {
    let Json(payload) = payload?;
    let status = FavoriteRepository::new(state.pool())
        .toggle(user.id, payload.product_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Product not found".to_string()),
            other => other.into(),
        })?;
    Ok(Json(ToggleResult { status }))
}

/// The caller's favorites.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<FavoriteView>>> {
    let favorites = FavoriteRepository::new(state.pool())
        .list(user.id)
        .await?
        .into_iter()
        .map(FavoriteView::from)
        .collect();
    Ok(Json(favorites))
}

/// Number of favorites, for the header badge.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let count = FavoriteRepository::new(state.pool()).count(user.id).await?;
    Ok(Json(json!({ "count": count })))
}
