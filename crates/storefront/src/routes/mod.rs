//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Categories and newest products
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Readiness (database)
//!
//! # Catalog
//! GET  /products                      - Paginated listing (?category=..&page=..)
//! GET  /products/filter               - Filter by category, brand, price
//! GET  /products/{slug}               - Product detail
//!
//! # Cart (login)
//! GET  /cart                          - Cart with totals
//! POST /cart/add                      - Add product (JSON)
//! POST /cart/remove                   - Remove line (JSON)
//! GET  /cart/count                    - Total quantity
//!
//! # Favorites (login)
//! POST /favorite/toggle               - Add or remove (JSON)
//! GET  /favorite                      - List
//! GET  /favorite/count                - Count
//!
//! # Reviews (login)
//! POST /reviews/add/{slug}            - Add review (form)
//!
//! # Newsletter
//! POST /newsletters/subscribe         - Subscribe (JSON)
//!
//! # Orders (login, except success)
//! GET  /orders/create                 - Checkout summary
//! POST /orders/create                 - Place order (form)
//! GET  /orders/success/{order_id}     - Payment landing page
//! GET  /orders/my-orders              - Order history
//! GET  /orders/my-orders/{order_id}   - Order detail
//! GET  /orders/count                  - Order count
//!
//! # Payments
//! GET  /payments/start/{order_id}     - Create PayPal payment (login)
//! GET  /payments/success/{payment_id} - PayPal return URL
//! GET  /payments/cancel/{payment_id}  - PayPal cancel URL
//!
//! # Auth
//! POST /auth/register                 - Register and log in
//! POST /auth/login                    - Log in
//! POST /auth/logout                   - Log out
//! ```

pub mod auth;
pub mod cart;
pub mod favorites;
pub mod health;
pub mod home;
pub mod newsletter;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route_layer(auth_rate_limiter())
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/filter", get(products::filter))
        .route("/{slug}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route_layer(api_rate_limiter())
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
}

/// Create the favorite routes router.
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/toggle", post(favorites::toggle))
        .route_layer(api_rate_limiter())
        .route("/", get(favorites::list))
        .route("/count", get(favorites::count))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/create", get(orders::checkout).post(orders::create))
        .route("/success/{order_id}", get(orders::success))
        .route("/my-orders", get(orders::my_orders))
        .route("/my-orders/{order_id}", get(orders::my_order_detail))
        .route("/count", get(orders::count))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/start/{order_id}", get(payments::start))
        .route("/success/{payment_id}", get(payments::success))
        .route("/cancel/{payment_id}", get(payments::cancel))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/favorite", favorite_routes())
        .route("/reviews/add/{slug}", post(reviews::add))
        .route(
            "/newsletters/subscribe",
            post(newsletter::subscribe).route_layer(api_rate_limiter()),
        )
        .nest("/orders", order_routes())
        .nest("/payments", payment_routes())
        .nest("/auth", auth_routes())
}
