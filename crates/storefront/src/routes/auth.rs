//! Authentication route handlers.
//!
//! Registration, password login and logout. Failures redirect back with an
//! `?error=<code>` the page can render.

use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::{Expiry, Session};
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::session::default_expiry;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService, Registration};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Checkbox; present when ticked.
    pub remember_me: Option<String>,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

/// `?next=` on the login URL set by the auth redirect.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Accept only same-site absolute paths as post-login targets.
///
/// Browsers strip tabs and newlines from `Location`, so control characters
/// are refused outright.
fn safe_next(next: Option<&str>) -> &str {
    next.filter(|n| {
        n.starts_with('/')
            && !n.starts_with("//")
            && !n.contains('\\')
            && !n.contains("://")
            && !n.chars().any(char::is_control)
    })
    .unwrap_or("/")
}

async fn start_session(session: &Session, user: &CurrentUser, remember: bool) -> Result<(), AppError> {
    set_current_user(session, user).await?;
    session.set_expiry(Some(if remember {
        default_expiry()
    } else {
        Expiry::OnSessionEnd
    }));
    set_sentry_user(&user.id, Some(&user.username));
    Ok(())
}

/// Handle registration form submission. Logs the new user in.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let registration = Registration {
        username: &form.username,
        email: &form.email,
        password1: &form.password1,
        password2: &form.password2,
    };

    match AuthService::new(state.pool()).register(registration).await {
        Ok(user) => {
            start_session(&session, &CurrentUser::from(&user), true).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e @ (AuthError::Repository(_) | AuthError::PasswordHash)) => Err(e.into()),
        Err(e) => {
            tracing::debug!(error = %e, "Registration rejected");
            Ok(Redirect::to(&format!("/auth/register?error={}", e.code())).into_response())
        }
    }
}

/// Handle login form submission.
///
/// Without `remember_me` the session cookie ends with the browser.
#[instrument(skip(state, session, query, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match AuthService::new(state.pool())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            start_session(&session, &CurrentUser::from(&user), form.remember_me.is_some()).await?;
            tracing::info!(user_id = %user.id, "User logged in");
            let next = safe_next(form.next.as_deref().or(query.next.as_deref()));
            Ok(Redirect::to(next).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Failed login attempt");
            let mut target = "/auth/login?error=credentials".to_string();
            if let Some(next) = form.next.as_deref().or(query.next.as_deref()) {
                target.push_str("&next=");
                target.push_str(&urlencoding::encode(safe_next(Some(next))));
            }
            Ok(Redirect::to(&target).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_accepts_local_paths() {
        assert_eq!(safe_next(Some("/orders/my-orders")), "/orders/my-orders");
        assert_eq!(safe_next(Some("/cart?x=1")), "/cart?x=1");
    }

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(None), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(Some("cart")), "/");
        assert_eq!(safe_next(Some("/\t/evil.example")), "/");
        assert_eq!(safe_next(Some("/\n/evil.example")), "/");
        assert_eq!(safe_next(Some("/cart\r\nSet-Cookie: x=1")), "/");
    }
}
