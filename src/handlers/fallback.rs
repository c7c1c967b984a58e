use axum::{http::{StatusCode, Uri}, Json};
use crate::models::ErrorResponse;

/// JSON 404 for unknown routes
pub async fn not_found(uri: Uri) -> (StatusCode, Json<ErrorResponse>) {
    ErrorResponse::new(StatusCode::NOT_FOUND, format!("No route for {}", uri.path()))
}
