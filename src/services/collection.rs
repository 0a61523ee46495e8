//! Book collection: the single authority over the book lifecycle.
//!
//! Every mutation follows fetch → transition → persist → dispatch. An event is
//! dispatched only once the store write has succeeded, so a failed lookup,
//! transition or write never produces one.
//!
//! There is no isolation between concurrent operations on the same book: two
//! simultaneous borrows can both see it available, and the last write wins.

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookEvent, BookId, BookRecord, Borrower, Curator},
    repository::{BookStore, BookStream},
};

use super::{clock::Clock, events::EventDispatcher, id_generator::IdGenerator};

#[derive(Clone)]
pub struct BookCollection {
    store: Arc<dyn BookStore>,
    ids: IdGenerator,
    events: Arc<dyn EventDispatcher>,
    clock: Arc<dyn Clock>,
}

impl BookCollection {
    pub fn new(
        store: Arc<dyn BookStore>,
        ids: IdGenerator,
        events: Arc<dyn EventDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            ids,
            events,
            clock,
        }
    }

    /// Catalogue a new book under a freshly generated id
    pub async fn add_book(&self, curator: &Curator, book: Book) -> AppResult<BookRecord> {
        let id = self.ids.generate().await?;
        let saved = self.store.create_or_update(BookRecord::new(id, book)).await?;

        tracing::info!(book_id = %saved.id(), curator = curator.username(), "Book added");
        self.events.dispatch(BookEvent::added(&saved, self.clock.now())).await;
        Ok(saved)
    }

    pub async fn get_book(&self, id: &BookId) -> AppResult<BookRecord> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AppError::BookNotFound(*id))
    }

    /// Every book, in store iteration order
    pub fn get_all_books(&self) -> BookStream {
        self.store.find_all()
    }

    /// Apply `update` to the stored record and persist the result.
    ///
    /// The update may not change the record's id.
    pub async fn update_book<F>(&self, curator: &Curator, id: &BookId, update: F) -> AppResult<BookRecord>
    where
        F: FnOnce(BookRecord) -> BookRecord + Send,
    {
        let updated = update(self.get_book(id).await?);
        if updated.id() != *id {
            return Err(AppError::Validation(format!(
                "Update of book {} must not change its id",
                id
            )));
        }
        let saved = self.store.create_or_update(updated).await?;

        tracing::info!(book_id = %saved.id(), curator = curator.username(), "Book updated");
        self.events.dispatch(BookEvent::updated(&saved, self.clock.now())).await;
        Ok(saved)
    }

    pub async fn remove_book(&self, curator: &Curator, id: &BookId) -> AppResult<()> {
        let record = self.get_book(id).await?;
        self.store.delete(&record).await?;

        tracing::info!(book_id = %record.id(), curator = curator.username(), "Book removed");
        self.events.dispatch(BookEvent::removed(&record, self.clock.now())).await;
        Ok(())
    }

    pub async fn borrow_book(&self, id: &BookId, borrower: Borrower) -> AppResult<BookRecord> {
        let now = self.clock.now();
        let borrowed = self.get_book(id).await?.borrow(borrower, now)?;
        let saved = self.store.create_or_update(borrowed).await?;

        tracing::info!(book_id = %saved.id(), "Book borrowed");
        self.events.dispatch(BookEvent::borrowed(&saved, now)).await;
        Ok(saved)
    }

    pub async fn return_book(&self, id: &BookId) -> AppResult<BookRecord> {
        let returned = self.get_book(id).await?.return_book()?;
        let saved = self.store.create_or_update(returned).await?;

        tracing::info!(book_id = %saved.id(), "Book returned");
        self.events.dispatch(BookEvent::returned(&saved, self.clock.now())).await;
        Ok(saved)
    }
}
