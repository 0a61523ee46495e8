//! API handlers for the catalog REST endpoints

pub mod auth;
pub mod books;
pub mod correlation;
pub mod events;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use axum_extra::{
    extract::WithRejection,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::UserClaims, AppState};

/// JSON request body whose rejections are reported as `AppError`
pub type JsonBody<T> = WithRejection<Json<T>, AppError>;

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Authentication("Missing or malformed bearer token".to_string()))?;

        let claims = state.services.auth.authenticate(bearer.token())?;
        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Authentication
        .route("/auth/token", post(auth::issue_token))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/events", get(events::stream_events))
        .route("/books/:id", get(books::get_book).delete(books::delete_book))
        .route(
            "/books/:id/title",
            put(books::update_title),
        )
        .route(
            "/books/:id/authors",
            put(books::update_authors).delete(books::clear_authors),
        )
        .route(
            "/books/:id/numberOfPages",
            put(books::update_number_of_pages).delete(books::clear_number_of_pages),
        )
        .route("/books/:id/borrow", post(books::borrow_book))
        .route("/books/:id/return", post(books::return_book));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api", api)
        .with_state(state)
        .merge(openapi::create_openapi_router())
        .layer(
            // Compression stays outermost so error bodies are rewritten before encoding
            ServiceBuilder::new()
                .layer(CompressionLayer::new())
                .layer(middleware::from_fn(correlation::correlate))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
