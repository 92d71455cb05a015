//! User domain types.

use chrono::{DateTime, Utc};

use techshop_core::{Email, UserId};

/// A storefront account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    /// Login name, unique across the store.
    pub username: String,
    pub email: Email,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
