//! Catalog management: add categories, brands and products.

use rust_decimal::Decimal;

use techshop_core::{Discount, ProductColor, Slug};
use techshop_storefront::db::CatalogRepository;
use techshop_storefront::db::catalog::NewProduct;

use super::{CliError, connect};

/// Arguments for a new product, as given on the command line.
#[derive(Debug, Clone)]
pub struct ProductArgs {
    pub name: String,
    pub slug: Option<String>,
    pub category: String,
    pub brand: String,
    pub price: Decimal,
    pub discount: i64,
    pub color: String,
    pub description: String,
}

/// The given slug, or one derived from the name.
fn slug_for(name: &str, slug: Option<&str>) -> Result<Slug, CliError> {
    match slug {
        Some(raw) => Slug::parse(raw),
        None => Slug::from_name(name),
    }
    .map_err(|e| CliError::Invalid("slug", e.to_string()))
}

/// Add a category, or rename the existing one with the same slug.
///
/// # Errors
///
/// Returns an error if the slug is invalid or the database fails.
pub async fn add_category(name: &str, slug: Option<&str>) -> Result<(), CliError> {
    let slug = slug_for(name, slug)?;
    let pool = connect().await?;
    let category = CatalogRepository::new(&pool).upsert_category(name, &slug).await?;
    tracing::info!(id = %category.id, slug = %category.slug, "Category saved");
    Ok(())
}

/// Add a brand, or rename the existing one with the same slug.
///
/// # Errors
///
/// Returns an error if the slug is invalid or the database fails.
pub async fn add_brand(name: &str, slug: Option<&str>) -> Result<(), CliError> {
    let slug = slug_for(name, slug)?;
    let pool = connect().await?;
    let brand = CatalogRepository::new(&pool).upsert_brand(name, &slug).await?;
    tracing::info!(id = %brand.id, slug = %brand.slug, "Brand saved");
    Ok(())
}

/// Add a product under an existing category and brand, both given by slug.
///
/// # Errors
///
/// Returns an error if an argument is invalid, the category or brand is
/// unknown, or the product slug is taken.
pub async fn add_product(args: ProductArgs) -> Result<(), CliError> {
    let slug = slug_for(&args.name, args.slug.as_deref())?;
    let discount =
        Discount::new(args.discount).map_err(|e| CliError::Invalid("discount", e.to_string()))?;
    let color: ProductColor = args
        .color
        .parse()
        .map_err(|e: String| CliError::Invalid("color", e))?;
    if args.price.is_sign_negative() {
        return Err(CliError::Invalid("price", args.price.to_string()));
    }

    let pool = connect().await?;
    let catalog = CatalogRepository::new(&pool);
    let category = catalog
        .get_category_by_slug(&args.category)
        .await?
        .ok_or_else(|| CliError::NotFound("category", args.category.clone()))?;
    let brand = catalog
        .get_brand_by_slug(&args.brand)
        .await?
        .ok_or_else(|| CliError::NotFound("brand", args.brand.clone()))?;

    let product = catalog
        .create_product(&NewProduct {
            name: args.name,
            slug,
            brand_id: brand.id,
            category_id: category.id,
            description: args.description,
            price: args.price.round_dp(2),
            discount,
            color,
        })
        .await?;

    tracing::info!(
        id = %product.id,
        slug = %product.slug,
        final_price = %product.final_price(),
        "Product created"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_derived_from_name() {
        let slug = slug_for("Galaxy S24 Ultra", None).unwrap();
        assert_eq!(slug.as_str(), "galaxy-s24-ultra");
    }

    #[test]
    fn test_explicit_slug_is_validated() {
        assert!(slug_for("x", Some("Not A Slug")).is_err());
        assert_eq!(slug_for("x", Some("ok-slug")).unwrap().as_str(), "ok-slug");
    }
}
