//! Shopping cart types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use techshop_core::CartItemId;
use techshop_core::pricing;

use super::catalog::{Product, ProductView};

/// A cart row joined with its product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItemRow {
    pub cart_item_id: CartItemId,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub product: Product,
}

/// One line in the cart with its computed prices.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub product: ProductView,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub added_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartLine {
    fn from(row: CartItemRow) -> Self {
        let product = ProductView::from(row.product);
        let unit_price = product.final_price;
        Self {
            id: row.cart_item_id,
            total_price: pricing::line_total(unit_price, row.quantity),
            unit_price,
            quantity: row.quantity,
            added_at: row.added_at,
            product,
        }
    }
}

/// The caller's cart with totals.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub items: Vec<CartLine>,
    pub total_price: Decimal,
    pub total_quantity: i64,
}

impl Cart {
    #[must_use]
    pub fn from_rows(rows: Vec<CartItemRow>) -> Self {
        let items: Vec<CartLine> = rows.into_iter().map(CartLine::from).collect();
        let (total_price, total_quantity) =
            pricing::sum_totals(items.iter().map(|line| (line.total_price, line.quantity)));
        Self {
            items,
            total_price,
            total_quantity,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::models::catalog::tests::product;

    fn row(id: i32, price: &str, discount: i64, quantity: i32) -> CartItemRow {
        CartItemRow {
            cart_item_id: CartItemId::new(id),
            quantity,
            added_at: Utc::now(),
            product: product(id, price, discount),
        }
    }

    #[test]
    fn test_cart_totals() {
        let cart = Cart::from_rows(vec![row(1, "100.00", 10, 2), row(2, "50.00", 0, 4)]);

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[0].unit_price, Decimal::from_str("90.00").unwrap());
        assert_eq!(cart.items[0].total_price, Decimal::from_str("180.00").unwrap());
        assert_eq!(cart.items[1].total_price, Decimal::from_str("200.00").unwrap());
        assert_eq!(cart.total_price, Decimal::from_str("380.00").unwrap());
        assert_eq!(cart.total_quantity, 6);
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::from_rows(Vec::new());
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_price, Decimal::ZERO);
        assert_eq!(cart.total_quantity, 0);
    }
}
