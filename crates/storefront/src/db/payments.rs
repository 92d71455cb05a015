//! Payment repository.
//!
//! Every status change is guarded with `WHERE status = 'pending'`, so a
//! payment that reached a terminal state never changes again even when two
//! provider callbacks race.

use rust_decimal::Decimal;
use sqlx::PgPool;

use techshop_core::{CurrencyCode, OrderId, PaymentId, PaymentMethod, PaymentStatus};

use super::RepositoryError;
use crate::models::payment::Payment;

const PAYMENT_COLUMNS: &str = "id, order_id, amount, currency, method, status, \
     provider_payment_id, transaction_id, created_at, updated_at, paid_at";

/// Repository for payment attempts.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a new pending payment for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn create_pending(
        &self,
        order_id: OrderId,
        amount: Decimal,
        currency: &CurrencyCode,
        method: PaymentMethod,
    ) -> Result<Payment, RepositoryError> {
        sqlx::query_as::<_, Payment>(&format!(
            r"
            INSERT INTO shop.payment (order_id, amount, currency, method)
            VALUES ($1, $2, $3, $4)
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(order_id)
        .bind(amount)
        .bind(currency.as_str())
        .bind(method)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_foreign_key)
    }

    /// Get a payment by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM shop.payment WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(payment)
    }

    /// Store the provider's payment id on a pending payment.
    ///
    /// Returns `false` if the payment is no longer pending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_provider_id(
        &self,
        id: PaymentId,
        provider_payment_id: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.payment
            SET provider_payment_id = $1, updated_at = now()
            WHERE id = $2 AND status = 'pending'
            ",
        )
        .bind(provider_payment_id)
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a pending payment to `failed` or `cancelled`.
    ///
    /// Returns `false` if the payment was not pending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn finish_unpaid(
        &self,
        id: PaymentId,
        status: PaymentStatus,
    ) -> Result<bool, RepositoryError> {
        debug_assert!(matches!(
            status,
            PaymentStatus::Failed | PaymentStatus::Cancelled
        ));
        let result = sqlx::query(
            r"
            UPDATE shop.payment
            SET status = $1, updated_at = now()
            WHERE id = $2 AND status = 'pending'
            ",
        )
        .bind(status)
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a pending payment completed and its order paid.
    ///
    /// In one transaction: set `completed`, `paid_at` and the provider's
    /// transaction id on the payment, then set `paid` and the provider payment
    /// id on the order. Returns `false` (and changes nothing) if the payment
    /// was not pending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn complete(
        &self,
        id: PaymentId,
        transaction_id: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Completed {
            order_id: OrderId,
            provider_payment_id: Option<String>,
        }

        let mut tx = self.pool.begin().await?;

        let completed = sqlx::query_as::<_, Completed>(
            r"
            UPDATE shop.payment
            SET status = 'completed', paid_at = now(), transaction_id = $1, updated_at = now()
            WHERE id = $2 AND status = 'pending'
            RETURNING order_id, provider_payment_id
            ",
        )
        .bind(transaction_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(completed) = completed else {
            return Ok(false);
        };

        sqlx::query(
            r"
            UPDATE shop.order
            SET paid = TRUE, payment_id = $1, updated_at = now()
            WHERE id = $2
            ",
        )
        .bind(completed.provider_payment_id)
        .bind(completed.order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(true)
    }
}
