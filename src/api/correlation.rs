//! Correlation ids and error-body completion

use axum::{
    body::Body,
    extract::Request,
    http::{header::CONTENT_LENGTH, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::ErrorResponse;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

const MAX_CORRELATION_ID_LEN: usize = 128;

/// Correlation id of the current request, available as a request extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

fn incoming_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_CORRELATION_ID_LEN)
        .map(str::to_owned)
}

/// Tag each request with a correlation id, run it inside a span carrying that
/// id, and complete error bodies with the request path and id.
pub async fn correlate(mut request: Request, next: Next) -> Response {
    let id = incoming_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());
    let path = request.uri().path().to_owned();
    request.extensions_mut().insert(CorrelationId(id.clone()));

    let span = tracing::info_span!(
        "request",
        correlation_id = %id,
        method = %request.method(),
        path = %path,
    );
    let mut response = next.run(request).instrument(span).await;

    if let Some(mut error) = response.extensions_mut().remove::<ErrorResponse>() {
        error.path = path;
        error.correlation_id = Some(id.clone());
        match serde_json::to_vec(&error) {
            Ok(bytes) => {
                response.headers_mut().remove(CONTENT_LENGTH);
                *response.body_mut() = Body::from(bytes);
            }
            Err(e) => tracing::warn!("Failed to rewrite error body: {}", e),
        }
    }

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}
