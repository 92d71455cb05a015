//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow` and are read with runtime-checked
//! queries. View types (`*View`, `Cart`, `OrderDetail`) are what JSON
//! handlers serialize.

pub mod cart;
pub mod catalog;
pub mod favorite;
pub mod order;
pub mod payment;
pub mod review;
pub mod session;
pub mod user;

pub use cart::{Cart, CartLine};
pub use catalog::{Brand, Category, Product, ProductDetail, ProductView};
pub use favorite::FavoriteView;
pub use order::{NewOrder, Order, OrderDetail, OrderForm, OrderItem, OrderLine, OrderSummary};
pub use payment::Payment;
pub use review::{NewReview, ReviewForm, ReviewFormError, ReviewView};
pub use session::CurrentUser;
pub use user::User;
