//! Collision-free book id generation

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::BookId,
    repository::BookStore,
};

/// Draws random ids and probes the store until one is free.
///
/// The id is not reserved: two concurrent calls may both see the same id as
/// free. The store's primary key is what finally guards uniqueness.
#[derive(Clone)]
pub struct IdGenerator {
    store: Arc<dyn BookStore>,
    max_attempts: u32,
}

impl IdGenerator {
    pub fn new(store: Arc<dyn BookStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    pub async fn generate(&self) -> AppResult<BookId> {
        for attempt in 1..=self.max_attempts {
            let id = BookId::random();
            if !self.store.exists_by_id(&id).await? {
                return Ok(id);
            }
            tracing::debug!(book_id = %id, attempt, "Generated book id already taken, retrying");
        }

        Err(AppError::IdGenerationExhausted {
            attempts: self.max_attempts,
        })
    }
}
