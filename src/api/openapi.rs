//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, events, health};

/// Registers the bearer token scheme referenced by secured paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "0.1.0",
        description = "Library catalog REST API: books, borrowing and book events",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::issue_token,
        // Books
        books::list_books,
        books::create_book,
        books::get_book,
        books::delete_book,
        books::update_title,
        books::update_authors,
        books::clear_authors,
        books::update_number_of_pages,
        books::clear_number_of_pages,
        books::borrow_book,
        books::return_book,
        events::stream_events,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::TokenResponse,
            crate::models::user::Role,
            // Books
            books::BookResource,
            books::BookStateResource,
            books::BookCollectionResource,
            books::Link,
            books::CreateBookRequest,
            books::UpdateTitleRequest,
            books::UpdateAuthorsRequest,
            books::UpdateNumberOfPagesRequest,
            books::BorrowRequest,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Catalog and lending")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
