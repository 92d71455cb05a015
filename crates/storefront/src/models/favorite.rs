//! Favorite (wishlist) types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use techshop_core::FavoriteId;

use super::catalog::{Product, ProductView};

/// A favorite row joined with its product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FavoriteRow {
    pub favorite_id: FavoriteId,
    pub added_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub product: Product,
}

#[derive(Debug, Clone, Serialize)]
pub struct FavoriteView {
    pub id: FavoriteId,
    pub product: ProductView,
    pub added_at: DateTime<Utc>,
}

impl From<FavoriteRow> for FavoriteView {
    fn from(row: FavoriteRow) -> Self {
        Self {
            id: row.favorite_id,
            product: row.product.into(),
            added_at: row.added_at,
        }
    }
}
