//! PayPal checkout against a fake provider.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use rust_decimal::Decimal;

use techshop_integration_tests::{APPROVAL_URL, SALE_ID, TestApp, TestUser, json_body, location};
use techshop_core::OrderId;

async fn order_ready_for_payment(app: &TestApp) -> (TestUser, OrderId) {
    let user = app.register().await;
    let product = app.create_product("40.00", 0).await;
    app.add_to_cart(&user, &product, 3).await;
    let order_id = app.place_order(&user).await;
    (user, order_id)
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_successful_payment_marks_order_paid() {
    let app = TestApp::spawn().await;
    let (user, order_id) = order_ready_for_payment(&app).await;

    let response = app
        .get(&format!("/payments/start/{order_id}"), Some(&user))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), APPROVAL_URL);

    let (payment_id, status) = app.latest_payment(order_id).await;
    assert_eq!(status, "pending");
    let amount: Decimal = sqlx::query_scalar("SELECT amount FROM shop.payment WHERE id = $1")
        .bind(payment_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(amount, Decimal::from(120));

    // PayPal returns the buyer without a session cookie.
    let response = app
        .get(
            &format!("/payments/success/{payment_id}?paymentId=PAYID-X&token=EC-TEST&PayerID=BUYER1"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/orders/success/{order_id}"));

    let (_, status) = app.latest_payment(order_id).await;
    assert_eq!(status, "completed");
    let transaction: Option<String> =
        sqlx::query_scalar("SELECT transaction_id FROM shop.payment WHERE id = $1")
            .bind(payment_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(transaction.as_deref(), Some(SALE_ID));

    let detail = json_body(
        app.get(&format!("/orders/my-orders/{order_id}"), Some(&user))
            .await,
    )
    .await;
    assert_eq!(detail["paid"], true);

    // A second return is a no-op.
    let response = app
        .get(
            &format!("/payments/success/{payment_id}?PayerID=BUYER1"),
            None,
        )
        .await;
    assert_eq!(location(&response), format!("/orders/success/{order_id}"));
    assert_eq!(app.paypal.execute_calls.load(Ordering::SeqCst), 1);

    // Paid orders cannot be paid again.
    let response = app
        .get(&format!("/payments/start/{order_id}"), Some(&user))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_provider_rejection_fails_payment() {
    let app = TestApp::spawn().await;
    app.paypal.fail_create.store(true, Ordering::SeqCst);
    let (user, order_id) = order_ready_for_payment(&app).await;

    let response = app
        .get(&format!("/payments/start/{order_id}"), Some(&user))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/orders/create");

    let (_, status) = app.latest_payment(order_id).await;
    assert_eq!(status, "failed");

    // The buyer may try again once PayPal recovers.
    app.paypal.fail_create.store(false, Ordering::SeqCst);
    let response = app
        .get(&format!("/payments/start/{order_id}"), Some(&user))
        .await;
    assert_eq!(location(&response), APPROVAL_URL);
    let (_, status) = app.latest_payment(order_id).await;
    assert_eq!(status, "pending");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_failed_execution_leaves_order_unpaid() {
    let app = TestApp::spawn().await;
    app.paypal.fail_execute.store(true, Ordering::SeqCst);
    let (user, order_id) = order_ready_for_payment(&app).await;

    app.get(&format!("/payments/start/{order_id}"), Some(&user))
        .await;
    let (payment_id, _) = app.latest_payment(order_id).await;

    let response = app
        .get(
            &format!("/payments/success/{payment_id}?PayerID=BUYER1"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/orders/create");

    let (_, status) = app.latest_payment(order_id).await;
    assert_eq!(status, "failed");
    let detail = json_body(
        app.get(&format!("/orders/my-orders/{order_id}"), Some(&user))
            .await,
    )
    .await;
    assert_eq!(detail["paid"], false);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_cancel_marks_payment_cancelled() {
    let app = TestApp::spawn().await;
    let (user, order_id) = order_ready_for_payment(&app).await;

    app.get(&format!("/payments/start/{order_id}"), Some(&user))
        .await;
    let (payment_id, _) = app.latest_payment(order_id).await;

    let response = app
        .get(&format!("/payments/cancel/{payment_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/orders/create");

    let (_, status) = app.latest_payment(order_id).await;
    assert_eq!(status, "cancelled");

    // Returning afterwards does not resurrect the payment.
    let response = app
        .get(
            &format!("/payments/success/{payment_id}?PayerID=BUYER1"),
            None,
        )
        .await;
    assert_eq!(location(&response), "/orders/create");
    assert_eq!(app.paypal.execute_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_success_requires_payer_id() {
    let app = TestApp::spawn().await;
    let (user, order_id) = order_ready_for_payment(&app).await;

    app.get(&format!("/payments/start/{order_id}"), Some(&user))
        .await;
    let (payment_id, _) = app.latest_payment(order_id).await;

    let response = app
        .get(&format!("/payments/success/{payment_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (_, status) = app.latest_payment(order_id).await;
    assert_eq!(status, "pending");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_unknown_payment_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .get(&format!("/payments/success/{}?PayerID=X", i32::MAX), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .get(&format!("/payments/cancel/{}", i32::MAX), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_cannot_pay_for_another_users_order() {
    let app = TestApp::spawn().await;
    let (_, order_id) = order_ready_for_payment(&app).await;
    let other = app.register().await;

    let response = app
        .get(&format!("/payments/start/{order_id}"), Some(&other))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.paypal.create_calls.load(Ordering::SeqCst), 0);
}
