//! Book entity, lending state and record transitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::values::{Author, BookId, Borrower, Isbn13, NumberOfPages, Title};
use crate::error::{AppError, AppResult};

/// Bibliographic description of a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    isbn: Isbn13,
    title: Title,
    #[serde(default)]
    authors: Vec<Author>,
    number_of_pages: Option<NumberOfPages>,
}

impl Book {
    /// A book with no known authors and an unknown page count
    pub fn new(isbn: Isbn13, title: Title) -> Self {
        Self {
            isbn,
            title,
            authors: Vec::new(),
            number_of_pages: None,
        }
    }

    pub fn with_authors(self, authors: Vec<Author>) -> Self {
        Self { authors, ..self }
    }

    pub fn with_number_of_pages(self, number_of_pages: Option<NumberOfPages>) -> Self {
        Self {
            number_of_pages,
            ..self
        }
    }

    pub fn isbn(&self) -> &Isbn13 {
        &self.isbn
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn number_of_pages(&self) -> Option<NumberOfPages> {
        self.number_of_pages
    }
}

/// Lending state of a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookState {
    Available,
    Borrowed { by: Borrower, on: DateTime<Utc> },
}

impl BookState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookState::Available => "AVAILABLE",
            BookState::Borrowed { .. } => "BORROWED",
        }
    }
}

/// Persisted aggregate: identity, description and lending state.
///
/// Transitions consume the record and hand back a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    id: BookId,
    book: Book,
    state: BookState,
}

impl BookRecord {
    /// A freshly catalogued, available book
    pub fn new(id: BookId, book: Book) -> Self {
        Self {
            id,
            book,
            state: BookState::Available,
        }
    }

    /// Rebuilds a record read back from storage
    pub fn restore(id: BookId, book: Book, state: BookState) -> Self {
        Self { id, book, state }
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn state(&self) -> &BookState {
        &self.state
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, BookState::Available)
    }

    /// Lends the book out. Fails if it is already borrowed.
    pub fn borrow(self, by: Borrower, on: DateTime<Utc>) -> AppResult<Self> {
        match self.state {
            BookState::Available => Ok(Self {
                state: BookState::Borrowed { by, on },
                ..self
            }),
            BookState::Borrowed { .. } => Err(AppError::AlreadyBorrowed(self.id)),
        }
    }

    /// Takes the book back. Fails if it is not borrowed.
    pub fn return_book(self) -> AppResult<Self> {
        match self.state {
            BookState::Borrowed { .. } => Ok(Self {
                state: BookState::Available,
                ..self
            }),
            BookState::Available => Err(AppError::AlreadyReturned(self.id)),
        }
    }

    pub fn change_title(self, title: Title) -> Self {
        Self {
            book: Book { title, ..self.book },
            ..self
        }
    }

    pub fn change_authors(self, authors: Vec<Author>) -> Self {
        Self {
            book: self.book.with_authors(authors),
            ..self
        }
    }

    pub fn change_number_of_pages(self, number_of_pages: Option<NumberOfPages>) -> Self {
        Self {
            book: self.book.with_number_of_pages(number_of_pages),
            ..self
        }
    }
}
