//! Books service

use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::AppResult,
    models::book::{self, Book},
    repository::BookRepository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Arc<dyn BookRepository>,
}

impl BooksService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.repository.list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<Book> {
        self.repository.get_by_id(id).await
    }

    /// Validate a create request body and store the new book
    pub async fn create(&self, body: &[u8]) -> AppResult<Book> {
        let data = book::decode_create(body)?;
        let created = self.repository.create(&data, Utc::now()).await?;
        tracing::info!(book_id = created.id, "Book created");
        Ok(created)
    }

    /// Apply a partial update body to an existing book
    pub async fn update(&self, id: i32, body: &[u8]) -> AppResult<Book> {
        let existing = self.repository.get_by_id(id).await?;
        let mut merged = book::decode_partial_update(existing, body)?;
        merged.updated_at = Utc::now();
        let updated = self.repository.update(&merged).await?;
        tracing::info!(book_id = id, "Book updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, repository::MockBookRepository};
    use chrono::{Duration, Utc};
    use mockall::predicate::eq;

    fn stored(id: i32) -> Book {
        let at = Utc::now() - Duration::hours(1);
        Book {
            id,
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            years: 1965,
            created_at: at,
            updated_at: at,
        }
    }

    fn service(mock: MockBookRepository) -> BooksService {
        BooksService::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_create_stamps_both_timestamps() {
        let mut mock = MockBookRepository::new();
        mock.expect_create()
            .withf(|data, _| data.title == "Dune" && data.years == 1965)
            .times(1)
            .returning(|data, now| {
                Ok(Book {
                    id: 1,
                    title: data.title.clone(),
                    author: data.author.clone(),
                    years: data.years,
                    created_at: now,
                    updated_at: now,
                })
            });

        let book = service(mock)
            .create(br#"{"title":"Dune","author":"Herbert","years":1965}"#)
            .await
            .unwrap();
        assert_eq!(book.id, 1);
        assert_eq!(book.created_at, book.updated_at);
    }

    #[tokio::test]
    async fn test_invalid_create_never_reaches_storage() {
        let mut mock = MockBookRepository::new();
        mock.expect_create().never();

        let err = service(mock)
            .create(br#"{"title":"Dune","author":"Herbert","years":1200}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_refreshes_updated_at() {
        let existing = stored(3);
        let before = existing.updated_at;

        let mut mock = MockBookRepository::new();
        mock.expect_get_by_id()
            .with(eq(3))
            .returning(move |id| Ok(stored(id)));
        mock.expect_update()
            .withf(move |book| book.id == 3 && book.years == 1966 && book.updated_at > before)
            .times(1)
            .returning(|book| Ok(book.clone()));

        let updated = service(mock).update(3, br#"{"years":1966}"#).await.unwrap();
        assert_eq!(updated.title, "Dune");
        assert_eq!(updated.years, 1966);
        assert!(updated.updated_at > updated.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_book() {
        let mut mock = MockBookRepository::new();
        mock.expect_get_by_id()
            .returning(|id| Err(AppError::NotFound(format!("Book {} not found", id))));
        mock.expect_update().never();

        let err = service(mock).update(42, br#"{"title":"X"}"#).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_invalid_body_is_not_persisted() {
        let mut mock = MockBookRepository::new();
        mock.expect_get_by_id().returning(|id| Ok(stored(id)));
        mock.expect_update().never();

        let err = service(mock).update(3, br#"{"years":1300}"#).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_propagates_not_found() {
        let mut mock = MockBookRepository::new();
        mock.expect_delete()
            .with(eq(5))
            .returning(|id| Err(AppError::NotFound(format!("Book {} not found", id))));

        let err = service(mock).delete(5).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
