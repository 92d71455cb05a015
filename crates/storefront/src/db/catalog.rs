//! Catalog repository: categories, brands and products.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use techshop_core::{
    BrandId, CategoryId, Discount, ProductColor, ProductId, Rating, Slug, pricing,
};

use super::RepositoryError;
use crate::models::catalog::{Brand, Category, Product};

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.slug, p.brand_id, p.category_id, p.description, \
     p.price, p.discount, p.color, p.rating, p.image, p.created_at, p.updated_at";

/// Criteria for the product filter endpoint. Empty lists match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub categories: Vec<CategoryId>,
    pub brands: Vec<BrandId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: Slug,
    pub brand_id: BrandId,
    pub category_id: CategoryId,
    pub description: String,
    pub price: Decimal,
    pub discount: Discount,
    pub color: ProductColor,
}

/// Repository for catalog reads and admin-style writes.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, image FROM shop.category ORDER BY name, id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// All brands ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_brands(&self) -> Result<Vec<Brand>, RepositoryError> {
        let rows =
            sqlx::query_as::<_, Brand>("SELECT id, name, slug FROM shop.brand ORDER BY name, id")
                .fetch_all(self.pool)
                .await?;
        Ok(rows)
    }

    /// The `limit` most recently created products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn newest_products(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p ORDER BY p.created_at DESC, p.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Count products, optionally restricted to a set of categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_products(&self, categories: &[CategoryId]) -> Result<i64, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.product p WHERE TRUE");
        push_category_filter(&mut qb, categories);
        let count: i64 = qb.build_query_scalar().fetch_one(self.pool).await?;
        Ok(count)
    }

    /// One page of products, newest first, optionally restricted to categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        categories: &[CategoryId],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p WHERE TRUE"
        ));
        push_category_filter(&mut qb, categories);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = qb.build_query_as::<Product>().fetch_all(self.pool).await?;
        Ok(rows)
    }

    /// Products matching every given criterion, newest first.
    ///
    /// Price bounds apply to the base price, inclusive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn filter_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p WHERE TRUE"
        ));
        push_category_filter(&mut qb, &filter.categories);
        if !filter.brands.is_empty() {
            let ids: Vec<i32> = filter.brands.iter().map(BrandId::as_i32).collect();
            qb.push(" AND p.brand_id = ANY(").push_bind(ids).push(")");
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND p.price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND p.price <= ").push_bind(max);
        }
        qb.push(" ORDER BY p.created_at DESC, p.id DESC");

        let rows = qb.build_query_as::<Product>().fetch_all(self.pool).await?;
        Ok(rows)
    }

    /// Look up a product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p WHERE p.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Other products in the same category, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related_products(
        &self,
        product: &Product,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM shop.product p
            WHERE p.category_id = $1 AND p.id <> $2
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $3
            "
        ))
        .bind(product.category_id)
        .bind(product.id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Insert a category, or return the existing one with the same slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_category(&self, name: &str, slug: &Slug) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, Category>(
            r"
            INSERT INTO shop.category (name, slug)
            VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, slug, image
            ",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// Insert a brand, or return the existing one with the same slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_brand(&self, name: &str, slug: &Slug) -> Result<Brand, RepositoryError> {
        let row = sqlx::query_as::<_, Brand>(
            r"
            INSERT INTO shop.brand (name, slug)
            VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, slug
            ",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// Look up a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, image FROM shop.category WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Look up a brand by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_brand_by_slug(&self, slug: &str) -> Result<Option<Brand>, RepositoryError> {
        let row = sqlx::query_as::<_, Brand>("SELECT id, name, slug FROM shop.brand WHERE slug = $1")
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken and
    /// `RepositoryError::NotFound` if the brand or category doesn't exist.
    pub async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(
            r"
            INSERT INTO shop.product AS p
                (name, slug, brand_id, category_id, description, price, discount, color)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING p.id, p.name, p.slug, p.brand_id, p.category_id, p.description,
                      p.price, p.discount, p.color, p.rating, p.image, p.created_at, p.updated_at
            ",
        )
        .bind(&new.name)
        .bind(&new.slug)
        .bind(new.brand_id)
        .bind(new.category_id)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.discount)
        .bind(new.color)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match RepositoryError::from_unique(e, "product slug already exists") {
            RepositoryError::Database(e) => RepositoryError::from_foreign_key(e),
            other => other,
        })
    }
}

fn push_category_filter(qb: &mut QueryBuilder<'_, Postgres>, categories: &[CategoryId]) {
    if !categories.is_empty() {
        let ids: Vec<i32> = categories.iter().map(CategoryId::as_i32).collect();
        qb.push(" AND p.category_id = ANY(").push_bind(ids).push(")");
    }
}

/// Recompute a product's average rating from its reviews.
///
/// Runs on the caller's connection so it can share the review insert's
/// transaction. The product row is locked first so concurrent reviews of the
/// same product recompute one after another.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn refresh_product_rating(
    conn: &mut sqlx::PgConnection,
    product_id: ProductId,
) -> Result<f64, RepositoryError> {
    sqlx::query("SELECT 1 FROM shop.product WHERE id = $1 FOR UPDATE")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    let ratings: Vec<Rating> =
        sqlx::query_scalar("SELECT rating FROM shop.review WHERE product_id = $1")
            .bind(product_id)
            .fetch_all(&mut *conn)
            .await?;
    let average = pricing::average_rating(&ratings);

    sqlx::query("UPDATE shop.product SET rating = $1, updated_at = now() WHERE id = $2")
        .bind(average)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    Ok(average)
}
