//! Catalog types: categories, brands and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use techshop_core::pricing;
use techshop_core::{BrandId, CategoryId, Discount, ProductColor, ProductId, Slug};

use super::review::ReviewView;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    /// Relative media path, if an image was uploaded.
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub slug: Slug,
}

/// A product row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    pub brand_id: BrandId,
    pub category_id: CategoryId,
    pub description: String,
    /// Base price before discount.
    pub price: Decimal,
    pub discount: Discount,
    pub color: ProductColor,
    /// Average review rating, `0.0` when unreviewed.
    pub rating: f64,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price after discount, rounded to cents.
    #[must_use]
    pub fn final_price(&self) -> Decimal {
        pricing::discounted_price(self.price, self.discount)
    }
}

/// A product as rendered in listings, with its computed final price.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub final_price: Decimal,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let final_price = product.final_price();
        Self {
            product,
            final_price,
        }
    }
}

/// Everything the product page shows.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub product: ProductView,
    pub related_products: Vec<ProductView>,
    pub reviews: Vec<ReviewView>,
    pub review_count: usize,
    pub is_favorite: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::str::FromStr;

    use super::*;

    pub(crate) fn product(id: i32, price: &str, discount: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            slug: Slug::parse(&format!("product-{id}")).unwrap(),
            brand_id: BrandId::new(1),
            category_id: CategoryId::new(1),
            description: String::new(),
            price: Decimal::from_str(price).unwrap(),
            discount: Discount::new(discount).unwrap(),
            color: ProductColor::Black,
            rating: 0.0,
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_final_price_applies_discount() {
        let p = product(1, "2000.00", 20);
        assert_eq!(p.final_price(), Decimal::from_str("1600.00").unwrap());
    }

    #[test]
    fn test_product_view_serializes_flat() {
        let view = ProductView::from(product(7, "100.00", 10));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["slug"], "product-7");
        assert_eq!(json["final_price"], "90.00");
        assert_eq!(json["price"], "100.00");
        assert_eq!(json["discount"], 10);
        assert_eq!(json["color"], "black");
    }
}
