//! Product route handlers.
//!
//! Listing, filtering and detail. Query strings may repeat `category` and
//! `brand`, so they are read raw rather than through `Query<T>`.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, RawQuery, State},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use techshop_core::{BrandId, CategoryId};

use crate::db::{CatalogRepository, ProductFilter};
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::{Brand, Category, ProductDetail, ProductView};
use crate::services::catalog::{CatalogService, Page};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProductListPage {
    pub products: Vec<ProductView>,
    pub categories: Vec<Category>,
    pub brands: Vec<Brand>,
    pub selected_category_ids: Vec<CategoryId>,
    pub page: Page,
}

#[derive(Debug, Serialize)]
pub struct FilteredProducts {
    pub products: Vec<ProductView>,
}

/// Parsed `key=value` pairs of a query string, in order.
fn query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .into_owned()
            .collect()
    })
    .unwrap_or_default()
}

/// Every non-blank value of `key`, parsed.
fn parse_all<T: FromStr>(pairs: &[(String, String)], key: &str) -> Result<Vec<T>> {
    pairs
        .iter()
        .filter(|(k, v)| k == key && !v.trim().is_empty())
        .map(|(_, v)| {
            v.trim()
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Invalid {key}: {v}")))
        })
        .collect()
}

/// The last non-blank value of `key`, parsed.
fn parse_one<T: FromStr>(pairs: &[(String, String)], key: &str) -> Result<Option<T>> {
    Ok(parse_all(pairs, key)?.pop())
}

fn category_ids(pairs: &[(String, String)]) -> Result<Vec<CategoryId>> {
    Ok(parse_all::<i32>(pairs, "category")?
        .into_iter()
        .map(CategoryId::new)
        .collect())
}

/// Display the product listing, 12 per page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ProductListPage>> {
    let pairs = query_pairs(query.as_deref());
    let selected_category_ids = category_ids(&pairs)?;
    let page_param = pairs
        .iter()
        .rev()
        .find(|(k, _)| k == "page")
        .map(|(_, v)| v.as_str());

    let (products, page) = CatalogService::new(state.pool())
        .product_page(&selected_category_ids, page_param)
        .await?;
    let categories = state.categories().get(state.pool()).await?;
    let brands = CatalogRepository::new(state.pool()).list_brands().await?;

    Ok(Json(ProductListPage {
        products,
        categories: categories.as_ref().clone(),
        brands,
        selected_category_ids,
        page,
    }))
}

/// Filter products by categories, brands and base price range.
#[instrument(skip(state))]
pub async fn filter(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<FilteredProducts>> {
    let pairs = query_pairs(query.as_deref());
    let filter = ProductFilter {
        categories: category_ids(&pairs)?,
        brands: parse_all::<i32>(&pairs, "brand")?
            .into_iter()
            .map(BrandId::new)
            .collect(),
        min_price: parse_one::<Decimal>(&pairs, "min_price")?,
        max_price: parse_one::<Decimal>(&pairs, "max_price")?,
    };

    let products = CatalogRepository::new(state.pool())
        .filter_products(&filter)
        .await?
        .into_iter()
        .map(ProductView::from)
        .collect();

    Ok(Json(FilteredProducts { products }))
}

/// Display a product with related products and reviews.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    CatalogService::new(state.pool())
        .product_detail(&slug, user.map(|u| u.id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_keys_are_collected() {
        let pairs = query_pairs(Some("category=1&category=3&brand=2&page=2"));
        let ids = category_ids(&pairs).unwrap();
        assert_eq!(ids, vec![CategoryId::new(1), CategoryId::new(3)]);
        let brands: Vec<i32> = parse_all(&pairs, "brand").unwrap();
        assert_eq!(brands, vec![2]);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let pairs = query_pairs(Some("category=&min_price=&max_price=500"));
        assert!(category_ids(&pairs).unwrap().is_empty());
        assert_eq!(parse_one::<Decimal>(&pairs, "min_price").unwrap(), None);
        assert_eq!(
            parse_one::<Decimal>(&pairs, "max_price").unwrap(),
            Some(Decimal::from(500))
        );
    }

    #[test]
    fn test_non_numeric_values_are_rejected() {
        let pairs = query_pairs(Some("category=phones"));
        assert!(matches!(category_ids(&pairs), Err(AppError::BadRequest(_))));

        let pairs = query_pairs(Some("min_price=cheap"));
        assert!(parse_one::<Decimal>(&pairs, "min_price").is_err());
    }

    #[test]
    fn test_missing_query() {
        assert!(query_pairs(None).is_empty());
    }
}
