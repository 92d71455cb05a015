//! Review submission.
//!
//! The product page posts a plain form; the handler always answers with a
//! redirect back to the product, carrying `?error=<code>` on failure.

use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use tracing::instrument;

use crate::db::{CatalogRepository, RepositoryError, ReviewRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{ReviewForm, ReviewFormError};
use crate::state::AppState;

fn product_path(slug: &str) -> String {
    format!("/products/{}", urlencoding::encode(slug))
}

fn error_redirect(slug: &str, error: ReviewFormError) -> Redirect {
    Redirect::to(&format!("{}?error={}", product_path(slug), error.code()))
}

/// Add the caller's review of a product.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(slug): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect> {
    let product = CatalogRepository::new(state.pool())
        .get_product_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let review = match form.validate() {
        Ok(review) => review,
        Err(e) => return Ok(error_redirect(&slug, e)),
    };

    match ReviewRepository::new(state.pool())
        .create(product.id, user.id, &review)
        .await
    {
        Ok(review_id) => {
            tracing::info!(%review_id, product_id = %product.id, "Review added");
            Ok(Redirect::to(&product_path(&slug)))
        }
        Err(RepositoryError::Conflict(_)) => {
            Ok(error_redirect(&slug, ReviewFormError::AlreadyReviewed))
        }
        Err(RepositoryError::NotFound) => Err(AppError::NotFound("Product not found".to_string())),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::header::LOCATION, response::IntoResponse};

    use super::*;

    #[test]
    fn test_error_redirect_carries_code() {
        let response = error_redirect("iphone-15", ReviewFormError::EmptyComment).into_response();
        assert_eq!(
            response.headers()[LOCATION],
            "/products/iphone-15?error=empty_comment"
        );
    }
}
