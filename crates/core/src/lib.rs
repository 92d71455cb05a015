//! Techshop Core - Shared domain types.
//!
//! This crate provides the types used across all Techshop components:
//! - `storefront` - Public-facing shop (catalog, cart, orders, payments)
//! - `cli` - Command-line tools for migrations and catalog management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Database encoding is available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, slugs, ratings and statuses
//! - [`pricing`] - Discount, line total and average rating arithmetic

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use types::*;
