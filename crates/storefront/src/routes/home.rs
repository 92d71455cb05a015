//! Home page handler.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::db::CatalogRepository;
use crate::error::Result;
use crate::models::{Category, ProductView};
use crate::services::catalog::HOME_NEW_PRODUCTS;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub categories: Vec<Category>,
    pub new_products: Vec<ProductView>,
}

/// Display the home page: every category and the newest products.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Json<HomePage>> {
    let categories = state.categories().get(state.pool()).await?;
    let new_products = CatalogRepository::new(state.pool())
        .newest_products(HOME_NEW_PRODUCTS)
        .await?
        .into_iter()
        .map(ProductView::from)
        .collect();

    Ok(Json(HomePage {
        categories: categories.as_ref().clone(),
        new_products,
    }))
}
