//! Book model and request decoding

use std::borrow::Cow;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::error::{AppError, AppResult};

/// Earliest accepted publication year
pub const MIN_YEAR: i32 = 1450;

/// Latest accepted publication year: next year, so announced titles fit
pub fn max_year() -> i32 {
    Utc::now().year() + 1
}

/// Book record as stored and returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    /// Publication year
    pub years: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create book request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_book_fields"))]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "title must be 1 to 255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "author must be 1 to 255 characters"))]
    pub author: String,
    #[validate(range(min = 1450, message = "years must not be before 1450"))]
    pub years: i32,
}

/// Update book request; omitted, null, empty or zero fields keep their current value
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub years: Option<i32>,
}

fn validate_book_fields(book: &CreateBook) -> Result<(), ValidationError> {
    if book.title.trim().is_empty() {
        return Err(invalid("blank_title", "title must not be blank".into()));
    }
    if book.author.trim().is_empty() {
        return Err(invalid("blank_author", "author must not be blank".into()));
    }
    let max = max_year();
    if book.years > max {
        return Err(invalid("years_range", format!("years must not be after {}", max).into()));
    }
    Ok(())
}

fn invalid(code: &'static str, message: Cow<'static, str>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message);
    err
}

impl CreateBook {
    fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            years: self.years,
        }
    }
}

/// Decode and validate a create request body.
pub fn decode_create(body: &[u8]) -> AppResult<CreateBook> {
    let book: CreateBook = serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))?;
    book.validate()?;
    Ok(book.normalized())
}

/// Merge an update request body into `existing` and validate the result.
///
/// A field overwrites the stored value only when it is non-empty (strings)
/// or non-zero (`years`). `id`, `created_at` and `updated_at` are carried
/// over untouched; the caller refreshes `updated_at` when it persists the
/// record.
pub fn decode_partial_update(existing: Book, body: &[u8]) -> AppResult<Book> {
    let update: UpdateBook = serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))?;

    let merged = CreateBook {
        title: update.title.filter(|t| !t.is_empty()).unwrap_or(existing.title),
        author: update.author.filter(|a| !a.is_empty()).unwrap_or(existing.author),
        years: update.years.filter(|y| *y != 0).unwrap_or(existing.years),
    };
    merged.validate()?;
    let merged = merged.normalized();

    Ok(Book {
        title: merged.title,
        author: merged.author,
        years: merged.years,
        ..existing
    })
}
