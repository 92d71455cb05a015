//! Newsletter subscriber repository.

use sqlx::PgPool;

use techshop_core::{Email, SubscriberId};

use super::RepositoryError;

pub struct SubscriberRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriberRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a subscriber.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already subscribed.
    pub async fn subscribe(&self, email: &Email) -> Result<SubscriberId, RepositoryError> {
        sqlx::query_scalar("INSERT INTO shop.subscriber (email) VALUES ($1) RETURNING id")
            .bind(email)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_unique(e, "already subscribed"))
    }
}
