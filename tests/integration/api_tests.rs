//! HTTP-level tests of the catalog API

use axum::http::{Method, StatusCode};
use chrono::Duration;
use serde_json::json;
use uuid::Uuid;

use crate::common::{spawn_app, start_time, CURATOR, MEMBER};

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let response = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["storage"], "memory");

    let response = app.send(Method::GET, "/ready", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ready");
}

#[tokio::test]
async fn test_login_issues_token_with_role() {
    let app = spawn_app().await;

    let response = app
        .send(
            Method::POST,
            "/api/auth/token",
            None,
            Some(json!({ "username": CURATOR.0, "password": CURATOR.1 })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["tokenType"], "Bearer");
    assert_eq!(response.body["role"], "curator");
    assert!(response.body["expiresIn"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let app = spawn_app().await;

    let response = app
        .send(
            Method::POST,
            "/api/auth/token",
            None,
            Some(json!({ "username": CURATOR.0, "password": "wrong" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["status"], 401);
    assert_eq!(response.body["path"], "/api/auth/token");
    assert!(response.body["correlationId"].is_string());
}

#[tokio::test]
async fn test_unauthorized_access() {
    let app = spawn_app().await;

    let response = app.send(Method::GET, "/api/books", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .send(Method::GET, "/api/books", Some("not-a-token"), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_borrow_and_return_lifecycle() {
    let app = spawn_app().await;
    let member = app.login(MEMBER).await;

    let id = app.add_book("9780132350884", "Clean Code").await;
    let path = format!("/api/books/{}", id);

    let response = app.send(Method::GET, &path, Some(&member), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["isbn"], "9780132350884");
    assert_eq!(response.body["title"], "Clean Code");
    assert_eq!(response.body["authors"], json!([]));
    assert!(response.body["numberOfPages"].is_null());
    assert_eq!(response.body["state"]["status"], "AVAILABLE");
    assert!(response.body["_links"]["borrow"].is_object());

    app.clock.advance(Duration::hours(1));
    let response = app
        .send(
            Method::POST,
            &format!("{}/borrow", path),
            Some(&member),
            Some(json!({ "borrower": "Uncle Bob" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["state"]["status"], "BORROWED");
    assert_eq!(response.body["state"]["borrowedBy"], "Uncle Bob");
    let borrowed_on: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(response.body["state"]["borrowedOn"].clone()).unwrap();
    assert_eq!(borrowed_on, start_time() + Duration::hours(1));
    assert!(response.body["_links"]["return"].is_object());

    let response = app
        .send(
            Method::POST,
            &format!("{}/borrow", path),
            Some(&member),
            Some(json!({ "borrower": "Someone Else" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = app
        .send(Method::POST, &format!("{}/return", path), Some(&member), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["state"]["status"], "AVAILABLE");
    assert!(response.body["state"]["borrowedBy"].is_null());

    let response = app
        .send(Method::POST, &format!("{}/return", path), Some(&member), None)
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["path"], format!("{}/return", path));
}

#[tokio::test]
async fn test_member_cannot_curate() {
    let app = spawn_app().await;
    let member = app.login(MEMBER).await;

    let response = app
        .send(
            Method::POST,
            "/api/books",
            Some(&member),
            Some(json!({ "isbn": "9780132350884", "title": "Clean Code" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let id = app.add_book("9780132350884", "Clean Code").await;
    let response = app
        .send(Method::DELETE, &format!("/api/books/{}", id), Some(&member), None)
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .send(Method::GET, &format!("/api/books/{}", id), Some(&member), None)
        .await;
    assert!(response.body["_links"].get("delete").is_none());
}

#[tokio::test]
async fn test_invalid_and_unknown_ids() {
    let app = spawn_app().await;
    let member = app.login(MEMBER).await;
    let curator = app.login(CURATOR).await;

    let response = app
        .send(Method::GET, "/api/books/not-a-uuid", Some(&member), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let unknown = format!("/api/books/{}", Uuid::new_v4());

    let response = app.send(Method::GET, &unknown, Some(&member), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.send(Method::DELETE, &unknown, Some(&curator), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .send(
            Method::POST,
            &format!("{}/borrow", unknown),
            Some(&member),
            Some(json!({ "borrower": "Uncle Bob" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .send(Method::POST, &format!("{}/return", unknown), Some(&member), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_rejects_invalid_isbn() {
    let app = spawn_app().await;
    let curator = app.login(CURATOR).await;

    let response = app
        .send(
            Method::POST,
            "/api/books",
            Some(&curator),
            Some(json!({ "isbn": "97801323508XY", "title": "Clean Code" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .send(
            Method::POST,
            "/api/books",
            Some(&curator),
            Some(json!({ "isbn": "9780132350884", "title": "" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["details"].is_array());
}

#[tokio::test]
async fn test_malformed_body_uses_error_body() {
    let app = spawn_app().await;
    let member = app.login(MEMBER).await;
    let id = app.add_book("9780132350884", "Clean Code").await;
    let borrow = format!("/api/books/{}/borrow", id);

    let response = app
        .send(Method::POST, &borrow, Some(&member), Some(json!({ "borrower": 5 })))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["status"], 400);
    assert_eq!(response.body["path"], borrow);
    assert!(response.body["correlationId"].is_string());
    assert!(response.body["message"].is_string());

    let response = app
        .send(Method::POST, "/api/auth/token", None, Some(json!({ "username": "curator" })))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["path"], "/api/auth/token");

    let response = app.send(Method::POST, &borrow, Some(&member), None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["correlationId"].is_string());

    let response = app.send(Method::GET, &format!("/api/books/{}", id), Some(&member), None).await;
    assert_eq!(response.body["state"]["status"], "AVAILABLE");
}

#[tokio::test]
async fn test_create_returns_location() {
    let app = spawn_app().await;
    let curator = app.login(CURATOR).await;

    let response = app
        .send(
            Method::POST,
            "/api/books",
            Some(&curator),
            Some(json!({ "isbn": "978-0132350884", "title": "Clean Code" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let location = response.headers["location"].to_str().unwrap();
    assert_eq!(location, format!("/api/books/{}", response.body["id"].as_str().unwrap()));
    assert!(response.body["_links"]["title"].is_object());
}

#[tokio::test]
async fn test_update_fields() {
    let app = spawn_app().await;
    let curator = app.login(CURATOR).await;
    let id = app.add_book("9780132350884", "Clean Code").await;
    let path = format!("/api/books/{}", id);

    let response = app
        .send(
            Method::PUT,
            &format!("{}/title", path),
            Some(&curator),
            Some(json!({ "title": "Clean Code: A Handbook" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Clean Code: A Handbook");

    let response = app
        .send(
            Method::PUT,
            &format!("{}/authors", path),
            Some(&curator),
            Some(json!({ "authors": ["Robert C. Martin"] })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["authors"], json!(["Robert C. Martin"]));

    let response = app
        .send(
            Method::PUT,
            &format!("{}/numberOfPages", path),
            Some(&curator),
            Some(json!({ "numberOfPages": 464 })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["numberOfPages"], 464);

    let response = app
        .send(
            Method::PUT,
            &format!("{}/numberOfPages", path),
            Some(&curator),
            Some(json!({ "numberOfPages": 0 })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .send(Method::DELETE, &format!("{}/authors", path), Some(&curator), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["authors"], json!([]));

    let response = app
        .send(Method::DELETE, &format!("{}/numberOfPages", path), Some(&curator), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["numberOfPages"].is_null());
    assert_eq!(response.body["title"], "Clean Code: A Handbook");
}

#[tokio::test]
async fn test_list_books_in_insertion_order() {
    let app = spawn_app().await;
    let member = app.login(MEMBER).await;

    let first = app.add_book("9780132350884", "Clean Code").await;
    let second = app.add_book("9780201616224", "The Pragmatic Programmer").await;

    let response = app.send(Method::GET, "/api/books", Some(&member), None).await;
    assert_eq!(response.status, StatusCode::OK);

    let ids: Vec<&str> = response.body["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![first.as_str(), second.as_str()]);
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let app = spawn_app().await;
    let curator = app.login(CURATOR).await;
    let id = app.add_book("9780132350884", "Clean Code").await;
    let path = format!("/api/books/{}", id);

    let response = app.send(Method::DELETE, &path, Some(&curator), None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app.send(Method::GET, &path, Some(&curator), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let app = spawn_app().await;

    let request = axum::http::Request::builder()
        .uri("/api/books")
        .header("x-correlation-id", "trace-me-42")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["x-correlation-id"], "trace-me-42");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["correlationId"], "trace-me-42");
    assert_eq!(body["path"], "/api/books");
}

#[tokio::test]
async fn test_events_follow_changes_in_order() {
    let app = spawn_app().await;
    let member = app.login(MEMBER).await;
    let curator = app.login(CURATOR).await;
    let mut events = app.state.services.events.subscribe();

    let id = app.add_book("9780132350884", "Clean Code").await;
    let path = format!("/api/books/{}", id);
    app.send(
        Method::POST,
        &format!("{}/borrow", path),
        Some(&member),
        Some(json!({ "borrower": "Uncle Bob" })),
    )
    .await;
    app.send(Method::POST, &format!("{}/return", path), Some(&member), None)
        .await;
    app.send(Method::DELETE, &path, Some(&curator), None).await;

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.book_id().to_string(), id);
        kinds.push(event.kind());
    }
    assert_eq!(
        kinds,
        vec!["BookAdded", "BookBorrowed", "BookReturned", "BookRemoved"]
    );
}

#[tokio::test]
async fn test_rejected_operations_publish_nothing() {
    let app = spawn_app().await;
    let member = app.login(MEMBER).await;
    let id = app.add_book("9780132350884", "Clean Code").await;
    let mut events = app.state.services.events.subscribe();

    let response = app
        .send(Method::POST, &format!("/api/books/{}/return", id), Some(&member), None)
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    assert!(matches!(
        events.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}
