//! Restaurant reviews. At most one per (restaurant, user).

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::types::{RestaurantId, ReviewId, UserId};

/// Errors raised while validating a review.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("Rating must be a number between 1 and 5")]
    Rating,

    #[error("Please provide a comment")]
    EmptyComment,
}

/// A star rating in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// # Errors
    ///
    /// Returns [`ReviewError::Rating`] outside `1..=5`.
    pub fn new(value: i64) -> Result<Self, ReviewError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(ReviewError::Rating)
    }

    /// Read a rating from a JSON body field.
    ///
    /// Accepts integers, integral floats (`4.0`) and numeric strings (`"4"`).
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Rating`] for anything else.
    pub fn from_json(value: &Value) -> Result<Self, ReviewError> {
        let n = match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < 1e9)
                    .map(|f| {
                        #[allow(clippy::cast_possible_truncation)]
                        let whole = f as i64;
                        whole
                    })
            }),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        n.map_or(Err(ReviewError::Rating), Self::new)
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// A validated review submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    pub rating: Rating,
    pub comment: String,
}

impl ReviewDraft {
    /// # Errors
    ///
    /// Returns a [`ReviewError`] if the rating is missing or out of range, or
    /// the comment is missing or blank.
    pub fn new(rating: Option<&Value>, comment: Option<&str>) -> Result<Self, ReviewError> {
        let rating = Rating::from_json(rating.unwrap_or(&Value::Null))?;
        let comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(ReviewError::EmptyComment)?;

        Ok(Self {
            rating,
            comment: comment.to_owned(),
        })
    }
}

/// A stored review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub restaurant_id: RestaurantId,
    pub user_id: UserId,
    /// Author display name, captured at write time.
    pub user_name: String,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
