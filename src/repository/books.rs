//! PostgreSQL book store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use uuid::Uuid;

use super::{BookStore, BookStream};
use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, BookId, BookRecord, BookState, Borrower, Isbn13, NumberOfPages, Title},
};

const STATE_AVAILABLE: &str = "AVAILABLE";
const STATE_BORROWED: &str = "BORROWED";

/// Rows buffered ahead of a slow `find_all` consumer
const STREAM_BUFFER: usize = 64;

const BOOK_COLUMNS: &str =
    "id, isbn, title, authors, number_of_pages, state, borrowed_by, borrowed_on";

/// Raw `books` row
#[derive(Debug, Clone, FromRow)]
struct BookRow {
    id: Uuid,
    isbn: String,
    title: String,
    authors: Vec<String>,
    number_of_pages: Option<i32>,
    state: String,
    borrowed_by: Option<String>,
    borrowed_on: Option<DateTime<Utc>>,
}

impl TryFrom<BookRow> for BookRecord {
    type Error = AppError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str| AppError::Internal(format!("Book row {}: {}", row.id, what));

        let authors = row
            .authors
            .iter()
            .cloned()
            .map(Author::parse)
            .collect::<AppResult<Vec<_>>>()
            .map_err(|_| corrupt("blank author"))?;
        let number_of_pages = row
            .number_of_pages
            .map(|pages| NumberOfPages::new(i64::from(pages)))
            .transpose()
            .map_err(|_| corrupt("non-positive page count"))?;
        let book = Book::new(
            Isbn13::parse(row.isbn.clone()).map_err(|_| corrupt("malformed isbn"))?,
            Title::parse(row.title.clone()).map_err(|_| corrupt("blank title"))?,
        )
        .with_authors(authors)
        .with_number_of_pages(number_of_pages);

        let state = match (row.state.as_str(), &row.borrowed_by, row.borrowed_on) {
            (STATE_AVAILABLE, None, None) => BookState::Available,
            (STATE_BORROWED, Some(by), Some(on)) => BookState::Borrowed {
                by: Borrower::parse(by.clone()).map_err(|_| corrupt("blank borrower"))?,
                on,
            },
            _ => return Err(corrupt("inconsistent lending state")),
        };

        Ok(BookRecord::restore(BookId::from_uuid(row.id), book, state))
    }
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn create_or_update(&self, record: BookRecord) -> AppResult<BookRecord> {
        let book = record.book();
        let authors: Vec<String> = book.authors().iter().map(|a| a.as_str().to_string()).collect();
        let number_of_pages = book.number_of_pages().map(|pages| pages.as_i32());
        let (borrowed_by, borrowed_on) = match record.state() {
            BookState::Available => (None, None),
            BookState::Borrowed { by, on } => (Some(by.as_str()), Some(*on)),
        };

        let query = format!(
            r#"
            INSERT INTO books (id, isbn, title, authors, number_of_pages, state, borrowed_by, borrowed_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                isbn = EXCLUDED.isbn,
                title = EXCLUDED.title,
                authors = EXCLUDED.authors,
                number_of_pages = EXCLUDED.number_of_pages,
                state = EXCLUDED.state,
                borrowed_by = EXCLUDED.borrowed_by,
                borrowed_on = EXCLUDED.borrowed_on,
                updated_at = NOW()
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );

        let row = sqlx::query_as::<_, BookRow>(&query)
            .bind(record.id().as_uuid())
            .bind(book.isbn().as_str())
            .bind(book.title().as_str())
            .bind(&authors)
            .bind(number_of_pages)
            .bind(record.state().as_str())
            .bind(borrowed_by)
            .bind(borrowed_on)
            .fetch_one(&self.pool)
            .await?;

        BookRecord::try_from(row)
    }

    async fn delete(&self, record: &BookRecord) -> AppResult<()> {
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(record.id().as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &BookId) -> AppResult<Option<BookRecord>> {
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        sqlx::query_as::<_, BookRow>(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(BookRecord::try_from)
            .transpose()
    }

    fn find_all(&self) -> BookStream {
        let pool = self.pool.clone();
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);

        tokio::spawn(async move {
            let query = format!("SELECT {} FROM books ORDER BY created_at, id", BOOK_COLUMNS);
            let mut rows = sqlx::query_as::<_, BookRow>(&query).fetch(&pool);
            while let Some(row) = rows.next().await {
                let record = row.map_err(AppError::from).and_then(BookRecord::try_from);
                if tx.send(record).await.is_err() {
                    // Consumer went away
                    break;
                }
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }

    async fn exists_by_id(&self, id: &BookId) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}
