//! Catalog reads: cached categories, pagination and product pages.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, instrument};

use techshop_core::{CategoryId, UserId};

use crate::db::{CatalogRepository, FavoriteRepository, RepositoryError, ReviewRepository};
use crate::models::catalog::{Category, ProductDetail, ProductView};

/// Products per listing page.
pub const PAGE_SIZE: i64 = 12;

/// Newest products shown on the home page.
pub const HOME_NEW_PRODUCTS: i64 = 5;

/// Upper bound on related products shown on a product page.
pub const RELATED_PRODUCTS: i64 = 8;

const CATEGORY_TTL: Duration = Duration::from_secs(60 * 60);

/// Category list cached for an hour.
///
/// Categories change rarely and every page header needs them.
#[derive(Clone)]
pub struct CategoryCache {
    cache: Cache<(), Arc<Vec<Category>>>,
}

impl Default for CategoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(CATEGORY_TTL)
                .build(),
        }
    }

    /// All categories, from cache or the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if loading fails. Failures are not
    /// cached.
    pub async fn get(&self, pool: &PgPool) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(categories) = self.cache.get(&()).await {
            return Ok(categories);
        }

        debug!("Loading categories into cache");
        let categories = Arc::new(CatalogRepository::new(pool).list_categories().await?);
        self.cache.insert((), Arc::clone(&categories)).await;
        Ok(categories)
    }
}

/// Position within a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub number: i64,
    pub num_pages: i64,
    pub per_page: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Page {
    /// Resolve a raw `page` query value against a result count.
    ///
    /// Missing or non-integer values give page 1; values outside the valid
    /// range (including zero and negatives) give the last page. An empty
    /// listing still has one page.
    #[must_use]
    pub fn resolve(raw: Option<&str>, total: i64, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        let total = total.max(0);
        let num_pages = ((total + per_page - 1) / per_page).max(1);

        let number = match raw.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(n)) if (1..=num_pages).contains(&n) => n,
            Some(Ok(_)) => num_pages,
            None | Some(Err(_)) => 1,
        };

        Self {
            number,
            num_pages,
            per_page,
            total,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }

    /// Row offset of the first item on this page.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }
}

/// Product page assembly.
pub struct CatalogService<'a> {
    pool: &'a PgPool,
    catalog: CatalogRepository<'a>,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            catalog: CatalogRepository::new(pool),
        }
    }

    /// One page of products, optionally restricted to categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn product_page(
        &self,
        categories: &[CategoryId],
        page: Option<&str>,
    ) -> Result<(Vec<ProductView>, Page), RepositoryError> {
        let total = self.catalog.count_products(categories).await?;
        let page = Page::resolve(page, total, PAGE_SIZE);
        let products = self
            .catalog
            .list_products(categories, page.per_page, page.offset())
            .await?
            .into_iter()
            .map(ProductView::from)
            .collect();
        Ok((products, page))
    }

    /// Everything shown on a product's page, or `None` for an unknown slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn product_detail(
        &self,
        slug: &str,
        viewer: Option<UserId>,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let Some(product) = self.catalog.get_product_by_slug(slug).await? else {
            return Ok(None);
        };

        let related_products = self
            .catalog
            .related_products(&product, RELATED_PRODUCTS)
            .await?
            .into_iter()
            .map(ProductView::from)
            .collect();
        let reviews = ReviewRepository::new(self.pool)
            .list_for_product(product.id)
            .await?;
        let is_favorite = match viewer {
            Some(user_id) => {
                FavoriteRepository::new(self.pool)
                    .contains(user_id, product.id)
                    .await?
            }
            None => false,
        };

        Ok(Some(ProductDetail {
            product: ProductView::from(product),
            related_products,
            review_count: reviews.len(),
            reviews,
            is_favorite,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_to_first() {
        let page = Page::resolve(None, 30, PAGE_SIZE);
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.offset(), 0);
        assert!(page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn test_page_non_integer_is_first() {
        assert_eq!(Page::resolve(Some("abc"), 30, PAGE_SIZE).number, 1);
        assert_eq!(Page::resolve(Some(""), 30, PAGE_SIZE).number, 1);
    }

    #[test]
    fn test_page_past_end_is_last() {
        let page = Page::resolve(Some("99"), 30, PAGE_SIZE);
        assert_eq!(page.number, 3);
        assert_eq!(page.offset(), 24);
        assert!(!page.has_next);
        assert!(page.has_previous);
    }

    #[test]
    fn test_page_zero_is_last() {
        assert_eq!(Page::resolve(Some("0"), 30, PAGE_SIZE).number, 3);
        assert_eq!(Page::resolve(Some("-2"), 30, PAGE_SIZE).number, 3);
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let page = Page::resolve(Some("4"), 0, PAGE_SIZE);
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(!page.has_next);
    }

    #[test]
    fn test_exact_multiple_of_page_size() {
        let page = Page::resolve(Some("2"), 24, PAGE_SIZE);
        assert_eq!(page.num_pages, 2);
        assert_eq!(page.offset(), 12);
    }
}
