//! Core types for Techshop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod rating;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, CurrencyCodeError, Discount, DiscountError, Price};
pub use rating::{Rating, RatingError};
pub use slug::{Slug, SlugError};
pub use status::*;
