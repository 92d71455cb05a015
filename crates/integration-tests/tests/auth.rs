//! Registration, login and logout.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use techshop_integration_tests::{TestApp, TestUser, location, session_cookie};

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_registered_user_is_logged_in() {
    let app = TestApp::spawn().await;
    let user = app.register().await;

    let response = app.get("/cart", Some(&user)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_duplicate_username_is_rejected() {
    let app = TestApp::spawn().await;
    let user = app.register().await;

    let response = app
        .post_form(
            "/auth/register",
            None,
            &[
                ("username", user.username.as_str()),
                ("email", "someone-else@example.com"),
                ("password1", "another-long-password"),
                ("password2", "another-long-password"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/register?error=username_taken");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_login_follows_next() {
    let app = TestApp::spawn().await;
    let user = app.register().await;

    let response = app
        .post_form(
            "/auth/login",
            None,
            &[
                ("username", user.username.as_str()),
                ("password", user.password.as_str()),
                ("next", "/orders/my-orders"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/orders/my-orders");

    let fresh = TestUser {
        cookie: session_cookie(&response).unwrap(),
        ..user
    };
    let response = app.get("/orders/my-orders", Some(&fresh)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_login_ignores_offsite_next() {
    let app = TestApp::spawn().await;
    let user = app.register().await;

    let response = app
        .post_form(
            "/auth/login",
            None,
            &[
                ("username", user.username.as_str()),
                ("password", user.password.as_str()),
                ("next", "https://evil.example.com/"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_wrong_password_redirects_back() {
    let app = TestApp::spawn().await;
    let user = app.register().await;

    let response = app
        .post_form(
            "/auth/login",
            None,
            &[("username", user.username.as_str()), ("password", "not-the-password")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?error=credentials");
    assert!(session_cookie(&response).is_none());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_logout_ends_session() {
    let app = TestApp::spawn().await;
    let user = app.register().await;

    let response = app.post_form("/auth/logout", Some(&user), &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = app.get("/cart", Some(&user)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}
