//! Shared test support: an in-memory book store and router helpers

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;

use books_api::{
    api,
    error::{AppError, AppResult},
    models::book::{Book, CreateBook},
    repository::BookRepository,
    AppState,
};

#[derive(Default)]
struct Store {
    next_id: i32,
    rows: BTreeMap<i32, Book>,
}

/// Book store kept in memory; ids are never reused
#[derive(Clone, Default)]
pub struct InMemoryBookRepository {
    store: Arc<Mutex<Store>>,
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn create(&self, book: &CreateBook, now: DateTime<Utc>) -> AppResult<Book> {
        let mut store = self.store.lock().unwrap();
        store.next_id += 1;
        let row = Book {
            id: store.next_id,
            title: book.title.clone(),
            author: book.author.clone(),
            years: book.years,
            created_at: now,
            updated_at: now,
        };
        store.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let store = self.store.lock().unwrap();
        store.rows.get(&id).cloned().ok_or_else(|| not_found(id))
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        let store = self.store.lock().unwrap();
        Ok(store.rows.values().cloned().collect())
    }

    async fn update(&self, book: &Book) -> AppResult<Book> {
        let mut store = self.store.lock().unwrap();
        let row = store.rows.get_mut(&book.id).ok_or_else(|| not_found(book.id))?;
        row.title = book.title.clone();
        row.author = book.author.clone();
        row.years = book.years;
        row.updated_at = book.updated_at;
        Ok(row.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut store = self.store.lock().unwrap();
        store.rows.remove(&id).map(|_| ()).ok_or_else(|| not_found(id))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

pub fn test_router() -> Router {
    router_with(InMemoryBookRepository::default())
}

pub fn router_with(repository: InMemoryBookRepository) -> Router {
    api::create_router(AppState::new(Arc::new(repository)), Duration::from_secs(5))
}

/// Send one request through the router and return status and parsed body
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (u16, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}
