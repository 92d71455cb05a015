//! Status enums for orders, payments and products.
//!
//! Each enum maps to a Postgres enum in the `shop` schema when the `postgres`
//! feature is enabled. `Display` and `FromStr` use the same lowercase names as
//! the database and JSON representations.

use serde::{Deserialize, Serialize};

/// Order fulfillment status, managed by staff after checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    New,
    Processing,
    Shipped,
    Completed,
    Canceled,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::New,
        Self::Processing,
        Self::Shipped,
        Self::Completed,
        Self::Canceled,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Payment lifecycle status.
///
/// `Pending` is the only non-terminal state; see [`PaymentStatus::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.payment_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Cancelled,
}

/// Something that happened to a payment at the provider or in the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEvent {
    /// The provider refused to create the payment.
    ProviderRejected,
    /// The buyer approved and the provider executed the payment.
    Executed,
    /// The buyer approved but execution failed at the provider.
    ExecutionFailed,
    /// The buyer cancelled on the provider's page.
    Cancelled,
}

/// An event was applied to a payment that has already been finalized.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot apply {event:?} to a payment in status {from}")]
pub struct TransitionError {
    pub from: PaymentStatus,
    pub event: PaymentEvent,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Compute the next status after `event`.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` when the payment is already terminal.
    pub const fn apply(self, event: PaymentEvent) -> Result<Self, TransitionError> {
        match (self, event) {
            (Self::Pending, PaymentEvent::Executed) => Ok(Self::Completed),
            (Self::Pending, PaymentEvent::ProviderRejected | PaymentEvent::ExecutionFailed) => {
                Ok(Self::Failed)
            }
            (Self::Pending, PaymentEvent::Cancelled) => Ok(Self::Cancelled),
            (from, event) => Err(TransitionError { from, event }),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// How an order is paid. Only PayPal is wired to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.payment_method", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Paypal,
    Card,
    Cash,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paypal => write!(f, "paypal"),
            Self::Card => write!(f, "card"),
            Self::Cash => write!(f, "cash"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paypal" => Ok(Self::Paypal),
            "card" => Ok(Self::Card),
            "cash" => Ok(Self::Cash),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Product finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.product_color", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ProductColor {
    Black,
    White,
    Gray,
    Silver,
    Gold,
}

impl std::fmt::Display for ProductColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Black => write!(f, "black"),
            Self::White => write!(f, "white"),
            Self::Gray => write!(f, "gray"),
            Self::Silver => write!(f, "silver"),
            Self::Gold => write!(f, "gold"),
        }
    }
}

impl std::str::FromStr for ProductColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "black" => Ok(Self::Black),
            "white" => Ok(Self::White),
            "gray" => Ok(Self::Gray),
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            _ => Err(format!("invalid product color: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_transitions() {
        let pending = PaymentStatus::Pending;
        assert_eq!(pending.apply(PaymentEvent::Executed), Ok(PaymentStatus::Completed));
        assert_eq!(
            pending.apply(PaymentEvent::ProviderRejected),
            Ok(PaymentStatus::Failed)
        );
        assert_eq!(
            pending.apply(PaymentEvent::ExecutionFailed),
            Ok(PaymentStatus::Failed)
        );
        assert_eq!(
            pending.apply(PaymentEvent::Cancelled),
            Ok(PaymentStatus::Cancelled)
        );
    }

    #[test]
    fn test_terminal_states_reject_events() {
        for status in [
            PaymentStatus::Completed,
            PaymentStatus::Failed,
            PaymentStatus::Cancelled,
        ] {
            assert!(status.is_terminal());
            let err = status.apply(PaymentEvent::Cancelled).unwrap_err();
            assert_eq!(err.from, status);
        }
        assert!(!PaymentStatus::Pending.is_terminal());
    }

    #[test]
    fn test_order_status_round_trips_through_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_names_match_display() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(serde_json::to_string(&ProductColor::Silver).unwrap(), "\"silver\"");
        assert_eq!(serde_json::to_string(&PaymentMethod::Paypal).unwrap(), "\"paypal\"");
    }

    #[test]
    fn test_product_color_parse() {
        assert_eq!("gold".parse::<ProductColor>().unwrap(), ProductColor::Gold);
        assert!("purple".parse::<ProductColor>().is_err());
    }
}
