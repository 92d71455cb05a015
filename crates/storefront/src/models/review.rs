//! Product review types and form validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use techshop_core::{Rating, ReviewId};

/// A review joined with its author's username.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReviewView {
    pub id: ReviewId,
    pub username: String,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Raw review form as posted by the product page.
///
/// `rating` is kept as text so that a non-numeric value is reported as an
/// invalid rating instead of a form rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub comment: String,
}

/// A validated review ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub rating: Rating,
    pub comment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReviewFormError {
    #[error("rating must be a whole number from 1 to 5")]
    InvalidRating,
    #[error("comment is required")]
    EmptyComment,
    #[error("you have already reviewed this product")]
    AlreadyReviewed,
}

impl ReviewFormError {
    /// Query-string code appended to the product page redirect.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidRating => "invalid_rating",
            Self::EmptyComment => "empty_comment",
            Self::AlreadyReviewed => "already_reviewed",
        }
    }
}

impl ReviewForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns the first failing field: rating before comment.
    pub fn validate(&self) -> Result<NewReview, ReviewFormError> {
        let rating = self
            .rating
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|value| Rating::new(value).ok())
            .ok_or(ReviewFormError::InvalidRating)?;

        let comment = self.comment.trim();
        if comment.is_empty() {
            return Err(ReviewFormError::EmptyComment);
        }

        Ok(NewReview {
            rating,
            comment: comment.to_owned(),
        })
    }
}
