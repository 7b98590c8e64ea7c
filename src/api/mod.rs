//! API handlers for the lending REST endpoints

pub mod book_requests;
pub mod health;
pub mod leaves;
pub mod openapi;
pub mod store_requests;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Staff may read anyone's records; everyone else only their own
pub(crate) fn scope_requestor(claims: &UserClaims, requested: Option<i32>) -> Result<Option<i32>, AppError> {
    if claims.require_staff().is_ok() {
        return Ok(requested);
    }
    match requested {
        Some(id) if id != claims.user_id => Err(AppError::Authorization(
            "Cannot read another user's requests".to_string(),
        )),
        _ => Ok(Some(claims.user_id)),
    }
}

/// Owner or staff check for a single record
pub(crate) fn ensure_can_read(claims: &UserClaims, requestor_id: i32) -> Result<(), AppError> {
    if requestor_id == claims.user_id || claims.require_staff().is_ok() {
        Ok(())
    } else {
        Err(AppError::Authorization(format!(
            "Role {} may not read this record",
            claims.role
        )))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Book requests
        .route(
            "/book-requests",
            get(book_requests::list).post(book_requests::submit),
        )
        .route("/book-requests/:id", get(book_requests::get))
        .route("/book-requests/:id/approve", post(book_requests::approve))
        .route("/book-requests/:id/issue", post(book_requests::issue))
        .route("/book-requests/:id/return", post(book_requests::return_book))
        .route("/book-requests/:id/renew", post(book_requests::renew))
        .route("/book-requests/:id/reject", post(book_requests::reject))
        .route("/book-requests/:id/pay-fine", post(book_requests::pay_fine))
        // Store requests
        .route(
            "/store-requests",
            get(store_requests::list).post(store_requests::submit),
        )
        .route("/store-requests/:id", get(store_requests::get))
        .route("/store-requests/:id/approve", post(store_requests::approve))
        .route("/store-requests/:id/fulfill", post(store_requests::fulfill))
        .route("/store-requests/:id/reject", post(store_requests::reject))
        // Leave applications
        .route(
            "/leave-applications",
            get(leaves::list).post(leaves::submit),
        )
        .route("/leave-applications/:id", get(leaves::get))
        .route(
            "/leave-applications/:id/teacher-review/start",
            post(leaves::start_teacher_review),
        )
        .route(
            "/leave-applications/:id/teacher-review",
            post(leaves::teacher_review),
        )
        .route(
            "/leave-applications/:id/to-review/start",
            post(leaves::start_to_review),
        )
        .route("/leave-applications/:id/to-review", post(leaves::to_review))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
