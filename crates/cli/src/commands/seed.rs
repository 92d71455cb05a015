//! Seed the catalog with demo categories, brands and products.
//!
//! Idempotent: categories and brands are upserted by slug and products whose
//! slug already exists are skipped.

use std::str::FromStr;

use rust_decimal::Decimal;

use techshop_core::{Discount, ProductColor, Slug};
use techshop_storefront::db::CatalogRepository;
use techshop_storefront::db::catalog::NewProduct;

use super::{CliError, connect};

const CATEGORIES: &[&str] = &["Smartphones", "Laptops", "Headphones", "Smartwatches", "Tablets"];

const BRANDS: &[&str] = &["Apple", "Samsung", "Sony", "Xiaomi", "Lenovo"];

struct DemoProduct {
    name: &'static str,
    category: &'static str,
    brand: &'static str,
    price: &'static str,
    discount: i64,
    color: ProductColor,
    description: &'static str,
}

const PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        name: "iPhone 15 Pro",
        category: "Smartphones",
        brand: "Apple",
        price: "999.00",
        discount: 0,
        color: ProductColor::Silver,
        description: "Titanium body, A17 Pro chip, 48 MP camera.",
    },
    DemoProduct {
        name: "Galaxy S24 Ultra",
        category: "Smartphones",
        brand: "Samsung",
        price: "1199.99",
        discount: 10,
        color: ProductColor::Black,
        description: "6.8-inch display with built-in S Pen.",
    },
    DemoProduct {
        name: "Redmi Note 13",
        category: "Smartphones",
        brand: "Xiaomi",
        price: "249.90",
        discount: 15,
        color: ProductColor::Gray,
        description: "AMOLED display and 5000 mAh battery.",
    },
    DemoProduct {
        name: "MacBook Air 13 M3",
        category: "Laptops",
        brand: "Apple",
        price: "1099.00",
        discount: 5,
        color: ProductColor::Gold,
        description: "Fanless laptop with up to 18 hours of battery life.",
    },
    DemoProduct {
        name: "ThinkPad X1 Carbon",
        category: "Laptops",
        brand: "Lenovo",
        price: "2000.00",
        discount: 20,
        color: ProductColor::Black,
        description: "14-inch business ultrabook.",
    },
    DemoProduct {
        name: "WH-1000XM5",
        category: "Headphones",
        brand: "Sony",
        price: "399.99",
        discount: 25,
        color: ProductColor::White,
        description: "Wireless noise cancelling headphones.",
    },
    DemoProduct {
        name: "Galaxy Watch 6",
        category: "Smartwatches",
        brand: "Samsung",
        price: "299.00",
        discount: 0,
        color: ProductColor::Silver,
        description: "Health tracking with sapphire crystal glass.",
    },
    DemoProduct {
        name: "iPad Air",
        category: "Tablets",
        brand: "Apple",
        price: "599.00",
        discount: 10,
        color: ProductColor::Gray,
        description: "11-inch Liquid Retina display, M2 chip.",
    },
];

fn slug(name: &str) -> Result<Slug, CliError> {
    Slug::from_name(name).map_err(|e| CliError::Invalid("slug", e.to_string()))
}

/// Seed the demo catalog.
///
/// # Errors
///
/// Returns an error if the database fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;
    let catalog = CatalogRepository::new(&pool);

    for name in CATEGORIES {
        catalog.upsert_category(name, &slug(name)?).await?;
    }
    for name in BRANDS {
        catalog.upsert_brand(name, &slug(name)?).await?;
    }
    tracing::info!(
        categories = CATEGORIES.len(),
        brands = BRANDS.len(),
        "Categories and brands seeded"
    );

    let mut created = 0_usize;
    for demo in PRODUCTS {
        let product_slug = slug(demo.name)?;
        if catalog
            .get_product_by_slug(product_slug.as_str())
            .await?
            .is_some()
        {
            tracing::debug!(slug = %product_slug, "Product exists, skipping");
            continue;
        }

        let category = catalog
            .get_category_by_slug(slug(demo.category)?.as_str())
            .await?
            .ok_or_else(|| CliError::NotFound("category", demo.category.to_string()))?;
        let brand = catalog
            .get_brand_by_slug(slug(demo.brand)?.as_str())
            .await?
            .ok_or_else(|| CliError::NotFound("brand", demo.brand.to_string()))?;

        catalog
            .create_product(&NewProduct {
                name: demo.name.to_string(),
                slug: product_slug,
                brand_id: brand.id,
                category_id: category.id,
                description: demo.description.to_string(),
                price: Decimal::from_str(demo.price)
                    .map_err(|e| CliError::Invalid("price", e.to_string()))?,
                discount: Discount::new(demo.discount)
                    .map_err(|e| CliError::Invalid("discount", e.to_string()))?,
                color: demo.color,
            })
            .await?;
        created += 1;
    }

    tracing::info!(created, total = PRODUCTS.len(), "Products seeded");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_data_is_consistent() {
        for demo in PRODUCTS {
            assert!(CATEGORIES.contains(&demo.category), "{}", demo.name);
            assert!(BRANDS.contains(&demo.brand), "{}", demo.name);
            assert!(Decimal::from_str(demo.price).is_ok(), "{}", demo.name);
            assert!(Discount::new(demo.discount).is_ok(), "{}", demo.name);
            assert!(slug(demo.name).is_ok(), "{}", demo.name);
        }
    }
}
