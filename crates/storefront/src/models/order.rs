//! Order types and checkout form validation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use techshop_core::pricing;
use techshop_core::{Email, OrderId, OrderItemId, OrderStatus, ProductId, Slug, UserId};

use crate::error::ValidationErrors;

const MAX_FULL_NAME_LENGTH: usize = 255;
const MIN_PHONE_LENGTH: usize = 7;
const MAX_PHONE_LENGTH: usize = 20;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    /// `None` once the owning account has been deleted.
    pub user_id: Option<UserId>,
    pub full_name: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
    pub status: OrderStatus,
    pub paid: bool,
    /// Provider payment id of the payment that settled this order.
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order line with the price snapshotted at checkout.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub price: Decimal,
    pub quantity: i32,
}

impl OrderItem {
    #[must_use]
    pub fn cost(&self) -> Decimal {
        pricing::line_total(self.price, self.quantity)
    }
}

/// An order line joined with the product's name for display.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderLine {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: OrderItem,
    pub product_name: String,
    pub product_slug: Slug,
}

/// An order with its totals, for listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub total_cost: Decimal,
    pub total_quantity: i64,
}

/// An order with its lines and totals.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLine>,
    pub total_cost: Decimal,
    pub total_quantity: i64,
}

impl OrderDetail {
    #[must_use]
    pub fn new(order: Order, items: Vec<OrderLine>) -> Self {
        let (total_cost, total_quantity) =
            pricing::sum_totals(items.iter().map(|line| (line.item.cost(), line.item.quantity)));
        Self {
            order,
            items,
            total_cost,
            total_quantity,
        }
    }
}

/// Raw checkout form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// Validated customer and delivery details for a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub full_name: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
}

impl OrderForm {
    /// Validate every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns a map of field name to message when any field is invalid.
    pub fn validate(&self) -> Result<NewOrder, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            errors.add("full_name", "This field is required.");
        } else if full_name.chars().count() > MAX_FULL_NAME_LENGTH {
            errors.add(
                "full_name",
                format!("Ensure this value has at most {MAX_FULL_NAME_LENGTH} characters."),
            );
        }

        let email = if self.email.trim().is_empty() {
            errors.add("email", "This field is required.");
            None
        } else if let Ok(email) = Email::normalized(&self.email) {
            Some(email)
        } else {
            errors.add("email", "Enter a valid email address.");
            None
        };

        let phone = self.phone.trim();
        if phone.is_empty() {
            errors.add("phone", "This field is required.");
        } else if !is_valid_phone(phone) {
            errors.add(
                "phone",
                format!(
                    "Enter a phone number of {MIN_PHONE_LENGTH} to {MAX_PHONE_LENGTH} digits, spaces or +-() characters."
                ),
            );
        }

        let address = self.address.trim();
        if address.is_empty() {
            errors.add("address", "This field is required.");
        }

        match email {
            Some(email) if errors.is_empty() => Ok(NewOrder {
                full_name: full_name.to_owned(),
                email,
                phone: phone.to_owned(),
                address: address.to_owned(),
            }),
            _ => Err(errors),
        }
    }
}

fn is_valid_phone(phone: &str) -> bool {
    (MIN_PHONE_LENGTH..=MAX_PHONE_LENGTH).contains(&phone.chars().count())
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
        && phone.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn valid_form() -> OrderForm {
        OrderForm {
            full_name: "Test User".to_owned(),
            email: "Test@Example.com ".to_owned(),
            phone: "+375291234567".to_owned(),
            address: "Test Address 1".to_owned(),
        }
    }

    #[test]
    fn test_valid_form() {
        let order = valid_form().validate().unwrap();
        assert_eq!(order.full_name, "Test User");
        assert_eq!(order.email.as_str(), "test@example.com");
        assert_eq!(order.phone, "+375291234567");
    }

    #[test]
    fn test_empty_form_reports_every_field() {
        let errors = OrderForm::default().validate().unwrap_err();
        for field in ["full_name", "email", "phone", "address"] {
            assert!(errors.get(field).is_some(), "missing error for {field}");
        }
    }

    #[test]
    fn test_invalid_email() {
        let form = OrderForm {
            email: "not-an-email".to_owned(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.get("email").is_some());
        assert!(errors.get("phone").is_none());
    }

    #[test]
    fn test_phone_rules() {
        assert!(is_valid_phone("+375 (29) 123-45-67"));
        assert!(is_valid_phone("1234567"));
        assert!(!is_valid_phone("123456"));
        assert!(!is_valid_phone("123456789012345678901"));
        assert!(!is_valid_phone("call me maybe"));
        assert!(!is_valid_phone("+-() +-()"));
    }

    #[test]
    fn test_full_name_too_long() {
        let form = OrderForm {
            full_name: "x".repeat(256),
            ..valid_form()
        };
        assert!(form.validate().unwrap_err().get("full_name").is_some());
    }

    #[test]
    fn test_order_detail_totals() {
        let line = |id: i32, price: &str, quantity: i32| OrderLine {
            item: OrderItem {
                id: OrderItemId::new(id),
                order_id: OrderId::new(1),
                product_id: ProductId::new(id),
                price: Decimal::from_str(price).unwrap(),
                quantity,
            },
            product_name: format!("Product {id}"),
            product_slug: Slug::parse(&format!("product-{id}")).unwrap(),
        };
        let order = Order {
            id: OrderId::new(1),
            user_id: Some(UserId::new(1)),
            full_name: "Test User".to_owned(),
            email: Email::parse("test@example.com").unwrap(),
            phone: "1234567".to_owned(),
            address: "Somewhere".to_owned(),
            status: OrderStatus::New,
            paid: false,
            payment_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let detail = OrderDetail::new(order, vec![line(1, "90.00", 2), line(2, "50.00", 4)]);
        assert_eq!(detail.total_cost, Decimal::from_str("380.00").unwrap());
        assert_eq!(detail.total_quantity, 6);
    }
}
