//! Repository layer for database operations

pub mod books;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::book::{Book, CreateBook},
};

pub use books::BooksRepository;

/// Storage contract for books.
///
/// Every method is a single statement; a missing row is reported as
/// `AppError::NotFound`, any other failure as `AppError::Database`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Insert a book stamped with `now` for both timestamps
    async fn create(&self, book: &CreateBook, now: DateTime<Utc>) -> AppResult<Book>;

    async fn get_by_id(&self, id: i32) -> AppResult<Book>;

    /// All books ordered by id
    async fn list(&self) -> AppResult<Vec<Book>>;

    /// Overwrite title, author, years and updated_at of the row matching `book.id`
    async fn update(&self, book: &Book) -> AppResult<Book>;

    async fn delete(&self, id: i32) -> AppResult<()>;

    /// Check that the store is reachable
    async fn ping(&self) -> AppResult<()>;
}
