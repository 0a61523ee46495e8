//! In-process book store, iterating in insertion order

use std::sync::RwLock;

use async_trait::async_trait;
use indexmap::IndexMap;

use super::{BookStore, BookStream};
use crate::{
    error::{AppError, AppResult},
    models::{BookId, BookRecord},
};

#[derive(Default)]
pub struct InMemoryBookStore {
    books: RwLock<IndexMap<BookId, BookRecord>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> AppResult<usize> {
        let books = self.books.read().map_err(|_| poisoned())?;
        Ok(books.len())
    }

    pub fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn poisoned() -> AppError {
    AppError::Internal("In-memory book store lock poisoned".to_string())
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn create_or_update(&self, record: BookRecord) -> AppResult<BookRecord> {
        let mut books = self.books.write().map_err(|_| poisoned())?;
        // Replacing an existing key keeps its position
        books.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn delete(&self, record: &BookRecord) -> AppResult<()> {
        let mut books = self.books.write().map_err(|_| poisoned())?;
        books.shift_remove(&record.id());
        Ok(())
    }

    async fn find_by_id(&self, id: &BookId) -> AppResult<Option<BookRecord>> {
        let books = self.books.read().map_err(|_| poisoned())?;
        Ok(books.get(id).cloned())
    }

    fn find_all(&self) -> BookStream {
        let snapshot: Vec<AppResult<BookRecord>> = match self.books.read() {
            Ok(books) => books.values().cloned().map(Ok).collect(),
            Err(_) => vec![Err(poisoned())],
        };
        Box::pin(tokio_stream::iter(snapshot))
    }

    async fn exists_by_id(&self, id: &BookId) -> AppResult<bool> {
        let books = self.books.read().map_err(|_| poisoned())?;
        Ok(books.contains_key(id))
    }
}
