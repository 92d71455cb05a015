//! Payment attempt records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use techshop_core::{OrderId, PaymentId, PaymentMethod, PaymentStatus};

/// One attempt to pay for an order through a provider.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Decimal,
    /// ISO 4217 code, as configured when the payment was created.
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// The provider's payment id, set once the provider accepted creation.
    pub provider_payment_id: Option<String>,
    /// The provider's sale/transaction id, set on completion.
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}
