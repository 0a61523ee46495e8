//! Book store tests against a live PostgreSQL database
//!
//! Run with: DATABASE_URL=postgres://... cargo test -- --ignored

use chrono::Utc;
use tokio_stream::StreamExt;

use catalog_server::{
    config::{DatabaseConfig, StorageBackend},
    models::{Book, BookId, BookRecord, Borrower, Isbn13, Title},
    repository,
};

async fn open_store() -> std::sync::Arc<dyn repository::BookStore> {
    let database = DatabaseConfig {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
        ..DatabaseConfig::default()
    };
    repository::open(StorageBackend::Postgres, &database)
        .await
        .unwrap()
}

fn clean_code() -> BookRecord {
    BookRecord::new(
        BookId::random(),
        Book::new(
            Isbn13::parse("9780132350884").unwrap(),
            Title::parse("Clean Code").unwrap(),
        ),
    )
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_postgres_round_trip_and_delete() {
    let store = open_store().await;
    let record = clean_code();
    let id = record.id();

    store.create_or_update(record).await.unwrap();
    assert!(store.exists_by_id(&id).await.unwrap());

    let stored = store.find_by_id(&id).await.unwrap().unwrap();
    let borrowed = stored
        .borrow(Borrower::parse("Uncle Bob").unwrap(), Utc::now())
        .unwrap();
    let saved = store.create_or_update(borrowed).await.unwrap();
    assert!(!saved.is_available());

    let listed: Vec<BookRecord> = store
        .find_all()
        .collect::<Result<Vec<_>, _>>()
        .await
        .unwrap();
    assert!(listed.iter().any(|r| r.id() == id));

    store.delete(&saved).await.unwrap();
    assert!(store.find_by_id(&id).await.unwrap().is_none());
}
