//! Foreign-key cascades between catalog, users, orders and payments.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use techshop_core::{OrderId, UserId};
use techshop_integration_tests::{TestApp, TestUser};
use techshop_storefront::models::Product;

async fn count(pool: &PgPool, sql: &str, id: i32) -> i64 {
    sqlx::query_scalar(sql).bind(id).fetch_one(pool).await.unwrap()
}

/// Put `product` in every per-user table and in a placed order.
async fn touch_everywhere(app: &TestApp, user: &TestUser, product: &Product) -> OrderId {
    app.add_to_cart(user, product, 1).await;
    let order_id = app.place_order(user).await;
    app.add_to_cart(user, product, 2).await;

    let response = app
        .post_json(
            "/favorite/toggle",
            Some(user),
            &json!({ "product_id": product.id }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post_form(
            &format!("/reviews/add/{}", product.slug),
            Some(user),
            &[("rating", "5"), ("comment", "Keeps going")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    order_id
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_deleting_product_removes_dependent_rows() {
    let app = TestApp::spawn().await;
    let user = app.register().await;
    let product = app.create_product("15.00", 0).await;
    touch_everywhere(&app, &user, &product).await;

    let id = product.id.as_i32();
    for table in ["cart_item", "favorite", "review", "order_item"] {
        let sql = format!("SELECT COUNT(*) FROM shop.{table} WHERE product_id = $1");
        assert_eq!(count(&app.pool, &sql, id).await, 1, "{table} before delete");
    }

    sqlx::query("DELETE FROM shop.product WHERE id = $1")
        .bind(product.id)
        .execute(&app.pool)
        .await
        .unwrap();

    for table in ["cart_item", "favorite", "review", "order_item"] {
        let sql = format!("SELECT COUNT(*) FROM shop.{table} WHERE product_id = $1");
        assert_eq!(count(&app.pool, &sql, id).await, 0, "{table} after delete");
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_deleting_user_keeps_orders_anonymously() {
    let app = TestApp::spawn().await;
    let user = app.register().await;
    let product = app.create_product("15.00", 0).await;
    let order_id = touch_everywhere(&app, &user, &product).await;

    sqlx::query("DELETE FROM shop.user WHERE id = $1")
        .bind(user.id)
        .execute(&app.pool)
        .await
        .unwrap();

    let id = user.id.as_i32();
    for table in ["cart_item", "favorite", "review"] {
        let sql = format!("SELECT COUNT(*) FROM shop.{table} WHERE user_id = $1");
        assert_eq!(count(&app.pool, &sql, id).await, 0, "{table}");
    }

    let owner: Option<UserId> = sqlx::query_scalar("SELECT user_id FROM shop.order WHERE id = $1")
        .bind(order_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(owner, None);
    let items = count(
        &app.pool,
        "SELECT COUNT(*) FROM shop.order_item WHERE order_id = $1",
        order_id.as_i32(),
    )
    .await;
    assert_eq!(items, 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_deleting_order_removes_payments() {
    let app = TestApp::spawn().await;
    let user = app.register().await;
    let product = app.create_product("15.00", 0).await;
    app.add_to_cart(&user, &product, 1).await;
    let order_id = app.place_order(&user).await;

    app.get(&format!("/payments/start/{order_id}"), Some(&user))
        .await;
    let sql = "SELECT COUNT(*) FROM shop.payment WHERE order_id = $1";
    assert_eq!(count(&app.pool, sql, order_id.as_i32()).await, 1);

    sqlx::query("DELETE FROM shop.order WHERE id = $1")
        .bind(order_id)
        .execute(&app.pool)
        .await
        .unwrap();

    assert_eq!(count(&app.pool, sql, order_id.as_i32()).await, 0);
}
