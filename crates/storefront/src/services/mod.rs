//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration and password login (Argon2)
//! - `catalog` - Category cache, pagination and product pages
//! - `orders` - Turning a cart into an order
//! - `payments` - PayPal checkout: start, success and cancel callbacks
//! - `paypal` - PayPal REST client

pub mod auth;
pub mod catalog;
pub mod orders;
pub mod payments;
pub mod paypal;

pub use auth::{AuthError, AuthService, Registration};
pub use catalog::{CatalogService, CategoryCache, Page};
pub use orders::{OrderError, OrderService};
pub use payments::{CheckoutService, PaymentError};
pub use paypal::{PayPalClient, PayPalError};
