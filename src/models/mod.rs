//! Data models for the catalog

pub mod book;
pub mod event;
pub mod user;
pub mod values;

// Re-export commonly used types
pub use book::{Book, BookRecord, BookState};
pub use event::{BookEvent, BookEventData};
pub use user::{Curator, Role, UserClaims};
pub use values::{Author, BookId, Borrower, Isbn13, NumberOfPages, Title};
