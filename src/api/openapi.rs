//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{book_requests, health, leaves, store_requests};

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
        title = "Lending API",
        version = "1.0.0",
        description = "Book loans, store requests and leave approvals"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Book requests
        book_requests::submit,
        book_requests::list,
        book_requests::get,
        book_requests::approve,
        book_requests::issue,
        book_requests::return_book,
        book_requests::renew,
        book_requests::reject,
        book_requests::pay_fine,
        // Store requests
        store_requests::submit,
        store_requests::list,
        store_requests::get,
        store_requests::approve,
        store_requests::fulfill,
        store_requests::reject,
        // Leave applications
        leaves::submit,
        leaves::list,
        leaves::get,
        leaves::start_teacher_review,
        leaves::teacher_review,
        leaves::start_to_review,
        leaves::to_review,
    ),
    components(
        schemas(
            crate::models::BookRequest,
            crate::models::StoreRequest,
            crate::models::Request,
            crate::models::RequestStatus,
            crate::models::FineStatus,
            crate::models::RequestKind,
            crate::models::request::SubmitBookRequest,
            crate::models::request::SubmitStoreRequest,
            crate::models::request::ApproveStoreRequest,
            crate::models::request::RejectRequest,
            crate::models::LeaveApplication,
            crate::models::StageReview,
            crate::models::LeaveStatus,
            crate::models::LeaveStage,
            crate::models::ReviewStage,
            crate::models::ReviewDecision,
            crate::models::leave::SubmitLeaveApplication,
            crate::models::leave::ReviewLeaveApplication,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "book-requests", description = "Book copy requests and loans"),
        (name = "store-requests", description = "Consumable store requests"),
        (name = "leave-applications", description = "Two-stage leave approval")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
