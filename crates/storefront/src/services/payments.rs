//! Payment checkout flow against PayPal.
//!
//! `start` creates a pending payment and hands the buyer to PayPal; the
//! provider sends the buyer back to `success` or `cancel`. Each step returns
//! the path or URL to redirect the browser to.

use sqlx::PgPool;
use thiserror::Error;
use url::Url;

use techshop_core::{
    CurrencyCode, OrderId, PaymentEvent, PaymentId, PaymentMethod, PaymentStatus, Price,
    TransitionError, UserId,
};

use super::paypal::{CreatePayment, PayPalClient, PayPalError};
use crate::db::{OrderRepository, PaymentRepository, RepositoryError};
use crate::models::payment::Payment;

/// Where the buyer lands when a payment fails or is abandoned.
pub const CHECKOUT_PATH: &str = "/orders/create";

/// Errors from the payment flow.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The order doesn't exist, isn't the caller's, or is already paid.
    #[error("order not found")]
    OrderNotFound,

    #[error("payment not found")]
    PaymentNotFound,

    /// The provider callback lacked the `PayerID` query parameter.
    #[error("missing PayerID")]
    MissingPayerId,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("payment provider error: {0}")]
    Provider(#[from] PayPalError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Drives a payment through creation, approval and settlement.
pub struct CheckoutService<'a> {
    orders: OrderRepository<'a>,
    payments: PaymentRepository<'a>,
    paypal: &'a PayPalClient,
    base_url: &'a Url,
    currency: &'a CurrencyCode,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        paypal: &'a PayPalClient,
        base_url: &'a Url,
        currency: &'a CurrencyCode,
    ) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            payments: PaymentRepository::new(pool),
            paypal,
            base_url,
            currency,
        }
    }

    /// Start paying for one of the user's unpaid orders.
    ///
    /// Returns the PayPal approval URL, or the checkout page when PayPal
    /// refused the payment or sent no approval link.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::OrderNotFound` if the order is missing, foreign,
    /// or already paid.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self, user_id: UserId, order_id: OrderId) -> Result<String, PaymentError> {
        let order = self
            .orders
            .get_for_user(order_id, user_id)
            .await?
            .filter(|order| !order.paid)
            .ok_or(PaymentError::OrderNotFound)?;

        let amount = self.orders.total_cost(order.id).await?;
        let payment = self
            .payments
            .create_pending(order.id, amount, self.currency, PaymentMethod::Paypal)
            .await?;

        let request = CreatePayment {
            order_id: order.id,
            total: Price::new(amount, self.currency.clone()),
            return_url: self.callback_url("success", payment.id)?,
            cancel_url: self.callback_url("cancel", payment.id)?,
        };

        match self.paypal.create_payment(&request).await {
            Ok(created) => {
                self.payments.set_provider_id(payment.id, &created.id).await?;
                tracing::info!(payment_id = %payment.id, provider_id = %created.id, "PayPal payment created");
                Ok(created
                    .approval_url
                    .unwrap_or_else(|| CHECKOUT_PATH.to_string()))
            }
            Err(e) => {
                tracing::warn!(payment_id = %payment.id, error = %e, "PayPal payment creation failed");
                self.finish_unpaid(&payment, PaymentEvent::ProviderRejected)
                    .await?;
                Ok(CHECKOUT_PATH.to_string())
            }
        }
    }

    /// Handle the buyer returning from PayPal after approval.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::PaymentNotFound` for unknown payments and
    /// `PaymentError::MissingPayerId` when PayPal's `PayerID` is absent.
    #[tracing::instrument(skip(self))]
    pub async fn success(
        &self,
        payment_id: PaymentId,
        payer_id: Option<&str>,
    ) -> Result<String, PaymentError> {
        let payment = self.get(payment_id).await?;
        let payer_id = payer_id
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or(PaymentError::MissingPayerId)?;

        if payment.status.is_terminal() {
            return Ok(landing_path(&payment));
        }

        let Some(provider_id) = payment.provider_payment_id.as_deref() else {
            tracing::warn!(payment_id = %payment.id, "Pending payment has no provider id");
            self.finish_unpaid(&payment, PaymentEvent::ExecutionFailed)
                .await?;
            return Ok(CHECKOUT_PATH.to_string());
        };

        match self.paypal.execute_payment(provider_id, payer_id).await {
            Ok(executed) => {
                payment.status.apply(PaymentEvent::Executed)?;
                let completed = self
                    .payments
                    .complete(payment.id, executed.sale_id.as_deref())
                    .await?;
                if completed {
                    tracing::info!(payment_id = %payment.id, order_id = %payment.order_id, "Payment completed");
                    return Ok(order_success_path(payment.order_id));
                }
                // Another callback settled it first.
                let current = self.get(payment_id).await?;
                Ok(landing_path(&current))
            }
            Err(e) => {
                tracing::warn!(payment_id = %payment.id, error = %e, "PayPal execution failed");
                self.finish_unpaid(&payment, PaymentEvent::ExecutionFailed)
                    .await?;
                Ok(CHECKOUT_PATH.to_string())
            }
        }
    }

    /// Handle the buyer cancelling on PayPal's page.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::PaymentNotFound` for unknown payments.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, payment_id: PaymentId) -> Result<String, PaymentError> {
        let payment = self.get(payment_id).await?;
        if !payment.status.is_terminal() {
            self.finish_unpaid(&payment, PaymentEvent::Cancelled).await?;
            tracing::info!(payment_id = %payment.id, "Payment cancelled by buyer");
        }
        Ok(CHECKOUT_PATH.to_string())
    }

    async fn get(&self, payment_id: PaymentId) -> Result<Payment, PaymentError> {
        self.payments
            .get(payment_id)
            .await?
            .ok_or(PaymentError::PaymentNotFound)
    }

    async fn finish_unpaid(&self, payment: &Payment, event: PaymentEvent) -> Result<(), PaymentError> {
        let next = payment.status.apply(event)?;
        if next == PaymentStatus::Completed {
            return Err(TransitionError {
                from: payment.status,
                event,
            }
            .into());
        }
        self.payments.finish_unpaid(payment.id, next).await?;
        Ok(())
    }

    fn callback_url(&self, kind: &str, payment_id: PaymentId) -> Result<Url, PaymentError> {
        self.base_url
            .join(&format!("/payments/{kind}/{payment_id}"))
            .map_err(|e| PaymentError::Provider(PayPalError::Parse(e.to_string())))
    }
}

fn order_success_path(order_id: OrderId) -> String {
    format!("/orders/success/{order_id}")
}

/// Where to send the buyer for a payment that is already final.
fn landing_path(payment: &Payment) -> String {
    if payment.status == PaymentStatus::Completed {
        order_success_path(payment.order_id)
    } else {
        CHECKOUT_PATH.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;

    fn payment(status: PaymentStatus) -> Payment {
        Payment {
            id: PaymentId::new(3),
            order_id: OrderId::new(9),
            amount: Decimal::from(180),
            currency: "USD".to_string(),
            method: PaymentMethod::Paypal,
            status,
            provider_payment_id: Some("PAYID-1".to_string()),
            transaction_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            paid_at: None,
        }
    }

    #[test]
    fn test_landing_path_for_final_states() {
        assert_eq!(landing_path(&payment(PaymentStatus::Completed)), "/orders/success/9");
        assert_eq!(landing_path(&payment(PaymentStatus::Failed)), CHECKOUT_PATH);
        assert_eq!(landing_path(&payment(PaymentStatus::Cancelled)), CHECKOUT_PATH);
    }
}
