//! Shared harness: an in-memory app with one curator and one member

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use serde_json::Value;
use tower::ServiceExt;

use catalog_server::{
    api,
    config::{AppConfig, StorageBackend, UserEntry},
    models::Role,
    repository::memory::InMemoryBookStore,
    services::{auth::hash_password, clock::FixedClock, Services},
    AppState,
};

pub const CURATOR: (&str, &str) = ("curator", "shelves");
pub const MEMBER: (&str, &str) = ("reader", "pages");

static USERS: Lazy<Vec<UserEntry>> = Lazy::new(|| {
    vec![
        UserEntry {
            username: CURATOR.0.to_string(),
            password_hash: hash_password(CURATOR.1).unwrap(),
            role: Role::Curator,
        },
        UserEntry {
            username: MEMBER.0.to_string(),
            password_hash: hash_password(MEMBER.1).unwrap(),
            role: Role::Member,
        },
    ]
});

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<FixedClock>,
}

pub async fn spawn_app() -> TestApp {
    let mut config = AppConfig::default();
    config.storage.backend = StorageBackend::Memory;
    config.auth.jwt_secret = "integration-secret".to_string();
    config.auth.users = USERS.clone();

    let clock = Arc::new(FixedClock::new(start_time()));
    let services = Services::new(Arc::new(InMemoryBookStore::new()), clock.clone(), &config)
        .await
        .unwrap();

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    TestApp {
        router: api::router(state.clone()),
        state,
        clock,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn login(&self, (username, password): (&str, &str)) -> String {
        let response = self
            .send(
                Method::POST,
                "/api/auth/token",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.body["token"].as_str().unwrap().to_string()
    }

    /// Create a book as the curator, returning its id
    pub async fn add_book(&self, isbn: &str, title: &str) -> String {
        let token = self.login(CURATOR).await;
        let response = self
            .send(
                Method::POST,
                "/api/books",
                Some(&token),
                Some(serde_json::json!({ "isbn": isbn, "title": title })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_str().unwrap().to_string()
    }
}
