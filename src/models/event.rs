//! Domain events emitted by the book collection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::book::BookRecord;
use super::values::BookId;

/// Payload shared by every book event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookEventData {
    pub timestamp: DateTime<Utc>,
    pub book_id: BookId,
    pub book: BookRecord,
}

impl BookEventData {
    fn of(record: &BookRecord, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            book_id: record.id(),
            book: record.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BookEvent {
    BookAdded(BookEventData),
    BookUpdated(BookEventData),
    BookRemoved(BookEventData),
    BookBorrowed(BookEventData),
    BookReturned(BookEventData),
}

impl BookEvent {
    pub fn added(record: &BookRecord, at: DateTime<Utc>) -> Self {
        BookEvent::BookAdded(BookEventData::of(record, at))
    }

    pub fn updated(record: &BookRecord, at: DateTime<Utc>) -> Self {
        BookEvent::BookUpdated(BookEventData::of(record, at))
    }

    pub fn removed(record: &BookRecord, at: DateTime<Utc>) -> Self {
        BookEvent::BookRemoved(BookEventData::of(record, at))
    }

    pub fn borrowed(record: &BookRecord, at: DateTime<Utc>) -> Self {
        BookEvent::BookBorrowed(BookEventData::of(record, at))
    }

    pub fn returned(record: &BookRecord, at: DateTime<Utc>) -> Self {
        BookEvent::BookReturned(BookEventData::of(record, at))
    }

    pub fn data(&self) -> &BookEventData {
        match self {
            BookEvent::BookAdded(data)
            | BookEvent::BookUpdated(data)
            | BookEvent::BookRemoved(data)
            | BookEvent::BookBorrowed(data)
            | BookEvent::BookReturned(data) => data,
        }
    }

    pub fn book_id(&self) -> BookId {
        self.data().book_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.data().timestamp
    }

    /// Event name, as used for the `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            BookEvent::BookAdded(_) => "BookAdded",
            BookEvent::BookUpdated(_) => "BookUpdated",
            BookEvent::BookRemoved(_) => "BookRemoved",
            BookEvent::BookBorrowed(_) => "BookBorrowed",
            BookEvent::BookReturned(_) => "BookReturned",
        }
    }
}
