//! Book (catalog) endpoints

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{Author, Book, BookId, BookRecord, BookState, Borrower, Isbn13, NumberOfPages, Title, UserClaims},
};

use super::{AuthenticatedUser, JsonBody};

const BOOKS_PATH: &str = "/api/books";

/// Hypermedia link
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Link {
    pub href: String,
}

impl Link {
    fn to(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

/// Lending state as exposed over HTTP
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookStateResource {
    /// AVAILABLE or BORROWED
    pub status: String,
    pub borrowed_by: Option<String>,
    pub borrowed_on: Option<DateTime<Utc>>,
}

impl From<&BookState> for BookStateResource {
    fn from(state: &BookState) -> Self {
        match state {
            BookState::Available => Self {
                status: state.as_str().to_string(),
                borrowed_by: None,
                borrowed_on: None,
            },
            BookState::Borrowed { by, on } => Self {
                status: state.as_str().to_string(),
                borrowed_by: Some(by.to_string()),
                borrowed_on: Some(*on),
            },
        }
    }
}

/// Book with its hypermedia links
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookResource {
    pub id: String,
    pub isbn: String,
    pub title: String,
    pub authors: Vec<String>,
    pub number_of_pages: Option<u32>,
    pub state: BookStateResource,
    /// Available actions, keyed by relation name
    #[serde(rename = "_links")]
    #[schema(value_type = Object)]
    pub links: IndexMap<String, Link>,
}

impl BookResource {
    /// Build the resource as seen by `viewer`: curators also get edit links
    pub fn assemble(record: &BookRecord, viewer: &UserClaims) -> Self {
        let book = record.book();
        let href = book_href(&record.id());

        let mut links = IndexMap::new();
        links.insert("self".to_string(), Link::to(href.clone()));
        links.insert("collection".to_string(), Link::to(BOOKS_PATH));
        match record.state() {
            BookState::Available => {
                links.insert("borrow".to_string(), Link::to(format!("{}/borrow", href)));
            }
            BookState::Borrowed { .. } => {
                links.insert("return".to_string(), Link::to(format!("{}/return", href)));
            }
        }
        if viewer.is_curator() {
            links.insert("title".to_string(), Link::to(format!("{}/title", href)));
            links.insert("authors".to_string(), Link::to(format!("{}/authors", href)));
            links.insert(
                "numberOfPages".to_string(),
                Link::to(format!("{}/numberOfPages", href)),
            );
            links.insert("delete".to_string(), Link::to(href.clone()));
        }

        Self {
            id: record.id().to_string(),
            isbn: book.isbn().to_string(),
            title: book.title().to_string(),
            authors: book.authors().iter().map(|a| a.to_string()).collect(),
            number_of_pages: book.number_of_pages().map(|p| p.get()),
            state: BookStateResource::from(record.state()),
            links,
        }
    }
}

/// All books
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookCollectionResource {
    pub books: Vec<BookResource>,
    #[serde(rename = "_links")]
    #[schema(value_type = Object)]
    pub links: IndexMap<String, Link>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookRequest {
    /// ISBN-13, optionally hyphenated after the prefix
    #[validate(length(min = 10, max = 14, message = "ISBN must be 10 to 14 characters"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTitleRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAuthorsRequest {
    #[validate(length(min = 1, message = "At least one author is required"))]
    pub authors: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNumberOfPagesRequest {
    #[validate(range(min = 1, message = "Number of pages must be positive"))]
    pub number_of_pages: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BorrowRequest {
    #[validate(length(min = 1, message = "Borrower is required"))]
    pub borrower: String,
}

fn book_href(id: &BookId) -> String {
    format!("{}/{}", BOOKS_PATH, id)
}

fn parse_id(raw: &str) -> AppResult<BookId> {
    raw.parse()
}

/// List all books
#[utoipa::path(
    get,
    path = "/api/books",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All books", body = BookCollectionResource),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<BookCollectionResource>> {
    let records = state
        .services
        .catalog
        .get_all_books()
        .collect::<AppResult<Vec<BookRecord>>>()
        .await?;

    let mut links = IndexMap::new();
    links.insert("self".to_string(), Link::to(BOOKS_PATH));

    Ok(Json(BookCollectionResource {
        books: records
            .iter()
            .map(|record| BookResource::assemble(record, &claims))
            .collect(),
        links,
    }))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/api/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = BookResource),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Curator privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Json(request), _): JsonBody<CreateBookRequest>,
) -> AppResult<impl IntoResponse> {
    let curator = claims.require_curator()?;
    request.validate()?;

    let book = Book::new(Isbn13::parse(request.isbn)?, Title::parse(request.title)?);
    let created = state.services.catalog.add_book(&curator, book).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, book_href(&created.id()))],
        Json(BookResource::assemble(&created, &claims)),
    ))
}

/// Get a book by id
#[utoipa::path(
    get,
    path = "/api/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book id (UUID)")
    ),
    responses(
        (status = 200, description = "Book details", body = BookResource),
        (status = 400, description = "Malformed id", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<BookResource>> {
    let id = parse_id(&id)?;
    let record = state.services.catalog.get_book(&id).await?;
    Ok(Json(BookResource::assemble(&record, &claims)))
}

/// Remove a book from the catalog
#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book id (UUID)")
    ),
    responses(
        (status = 204, description = "Book removed"),
        (status = 403, description = "Curator privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let curator = claims.require_curator()?;
    let id = parse_id(&id)?;

    state.services.catalog.remove_book(&curator, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace a book's title
#[utoipa::path(
    put,
    path = "/api/books/{id}/title",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book id (UUID)")
    ),
    request_body = UpdateTitleRequest,
    responses(
        (status = 200, description = "Title updated", body = BookResource),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_title(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    WithRejection(Json(request), _): JsonBody<UpdateTitleRequest>,
) -> AppResult<Json<BookResource>> {
    let curator = claims.require_curator()?;
    let id = parse_id(&id)?;
    request.validate()?;
    let title = Title::parse(request.title)?;

    let updated = state
        .services
        .catalog
        .update_book(&curator, &id, move |record| record.change_title(title))
        .await?;
    Ok(Json(BookResource::assemble(&updated, &claims)))
}

/// Replace a book's authors
#[utoipa::path(
    put,
    path = "/api/books/{id}/authors",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book id (UUID)")
    ),
    request_body = UpdateAuthorsRequest,
    responses(
        (status = 200, description = "Authors updated", body = BookResource),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_authors(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    WithRejection(Json(request), _): JsonBody<UpdateAuthorsRequest>,
) -> AppResult<Json<BookResource>> {
    let curator = claims.require_curator()?;
    let id = parse_id(&id)?;
    request.validate()?;
    let authors = request
        .authors
        .into_iter()
        .map(Author::parse)
        .collect::<AppResult<Vec<_>>>()?;

    let updated = state
        .services
        .catalog
        .update_book(&curator, &id, move |record| record.change_authors(authors))
        .await?;
    Ok(Json(BookResource::assemble(&updated, &claims)))
}

/// Remove all authors from a book
#[utoipa::path(
    delete,
    path = "/api/books/{id}/authors",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book id (UUID)")
    ),
    responses(
        (status = 200, description = "Authors cleared", body = BookResource),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn clear_authors(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<BookResource>> {
    let curator = claims.require_curator()?;
    let id = parse_id(&id)?;

    let updated = state
        .services
        .catalog
        .update_book(&curator, &id, |record| record.change_authors(Vec::new()))
        .await?;
    Ok(Json(BookResource::assemble(&updated, &claims)))
}

/// Set a book's page count
#[utoipa::path(
    put,
    path = "/api/books/{id}/numberOfPages",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book id (UUID)")
    ),
    request_body = UpdateNumberOfPagesRequest,
    responses(
        (status = 200, description = "Page count updated", body = BookResource),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_number_of_pages(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    WithRejection(Json(request), _): JsonBody<UpdateNumberOfPagesRequest>,
) -> AppResult<Json<BookResource>> {
    let curator = claims.require_curator()?;
    let id = parse_id(&id)?;
    request.validate()?;
    let pages = NumberOfPages::new(request.number_of_pages)?;

    let updated = state
        .services
        .catalog
        .update_book(&curator, &id, move |record| {
            record.change_number_of_pages(Some(pages))
        })
        .await?;
    Ok(Json(BookResource::assemble(&updated, &claims)))
}

/// Forget a book's page count
#[utoipa::path(
    delete,
    path = "/api/books/{id}/numberOfPages",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book id (UUID)")
    ),
    responses(
        (status = 200, description = "Page count cleared", body = BookResource),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn clear_number_of_pages(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<BookResource>> {
    let curator = claims.require_curator()?;
    let id = parse_id(&id)?;

    let updated = state
        .services
        .catalog
        .update_book(&curator, &id, |record| record.change_number_of_pages(None))
        .await?;
    Ok(Json(BookResource::assemble(&updated, &claims)))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/api/books/{id}/borrow",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book id (UUID)")
    ),
    request_body = BorrowRequest,
    responses(
        (status = 200, description = "Book borrowed", body = BookResource),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book already borrowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    WithRejection(Json(request), _): JsonBody<BorrowRequest>,
) -> AppResult<Json<BookResource>> {
    let id = parse_id(&id)?;
    request.validate()?;
    let borrower = Borrower::parse(request.borrower)?;

    let borrowed = state.services.catalog.borrow_book(&id, borrower).await?;
    Ok(Json(BookResource::assemble(&borrowed, &claims)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/api/books/{id}/return",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book id (UUID)")
    ),
    responses(
        (status = 200, description = "Book returned", body = BookResource),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book already returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<BookResource>> {
    let id = parse_id(&id)?;
    let returned = state.services.catalog.return_book(&id).await?;
    Ok(Json(BookResource::assemble(&returned, &claims)))
}
