//! Book request endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        request::{RejectRequest, RequestQuery, SubmitBookRequest},
        BookRequest, RequestKind, Request,
    },
    AppState,
};

use super::{ensure_can_read, scope_requestor, AuthenticatedUser};

/// Submit a request for one copy of a book
#[utoipa::path(
    post,
    path = "/book-requests",
    tag = "book-requests",
    security(("bearer_auth" = [])),
    request_body = SubmitBookRequest,
    responses(
        (status = 201, description = "Request submitted", body = BookRequest),
        (status = 404, description = "Book not found"),
        (status = 422, description = "No copy available, limit reached or duplicate request")
    )
)]
pub async fn submit(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(body): Json<SubmitBookRequest>,
) -> AppResult<(StatusCode, Json<BookRequest>)> {
    let created = state
        .services
        .book_requests
        .submit(body.book_id, &claims.actor())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List book requests
#[utoipa::path(
    get,
    path = "/book-requests",
    tag = "book-requests",
    security(("bearer_auth" = [])),
    params(RequestQuery),
    responses(
        (status = 200, description = "Matching requests, newest first", body = Vec<BookRequest>)
    )
)]
pub async fn list(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(mut query): Query<RequestQuery>,
) -> AppResult<Json<Vec<BookRequest>>> {
    query.requestor_id = scope_requestor(&claims, query.requestor_id)?;
    let requests = state.services.book_requests.list(&query).await?;
    Ok(Json(requests))
}

/// Get a book request with its effective status
#[utoipa::path(
    get,
    path = "/book-requests/{id}",
    tag = "book-requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book request ID")),
    responses(
        (status = 200, description = "Book request", body = BookRequest),
        (status = 404, description = "Request not found")
    )
)]
pub async fn get(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookRequest>> {
    let request = state.services.book_requests.get(id).await?;
    ensure_can_read(&claims, request.requestor_id)?;
    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/book-requests/{id}/approve",
    tag = "book-requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book request ID")),
    responses(
        (status = 200, description = "Request approved", body = BookRequest),
        (status = 409, description = "Request is not pending"),
        (status = 422, description = "No copy available")
    )
)]
pub async fn approve(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookRequest>> {
    claims.require_librarian()?;
    let request = state.services.book_requests.approve(id, &claims.actor()).await?;
    Ok(Json(request))
}

/// Issue the copy, reserving it from the pool
#[utoipa::path(
    post,
    path = "/book-requests/{id}/issue",
    tag = "book-requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book request ID")),
    responses(
        (status = 200, description = "Copy issued", body = BookRequest),
        (status = 409, description = "Request is not approved"),
        (status = 422, description = "No copy available")
    )
)]
pub async fn issue(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookRequest>> {
    claims.require_librarian()?;
    let request = state.services.book_requests.issue(id).await?;
    Ok(Json(request))
}

/// Return the copy; a late return records a fine
#[utoipa::path(
    post,
    path = "/book-requests/{id}/return",
    tag = "book-requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book request ID")),
    responses(
        (status = 200, description = "Copy returned", body = BookRequest),
        (status = 409, description = "Request is not issued or overdue")
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookRequest>> {
    claims.require_librarian()?;
    let request = state.services.book_requests.return_book(id).await?;
    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/book-requests/{id}/renew",
    tag = "book-requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book request ID")),
    responses(
        (status = 200, description = "Loan renewed", body = BookRequest),
        (status = 409, description = "Overdue, not issued or out of renewals")
    )
)]
pub async fn renew(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookRequest>> {
    claims.require_librarian()?;
    let request = state.services.book_requests.renew(id).await?;
    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/book-requests/{id}/reject",
    tag = "book-requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book request ID")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Rejected request, tagged with `kind`", body = Request),
        (status = 400, description = "Missing reason"),
        (status = 409, description = "Request is not pending")
    )
)]
pub async fn reject(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(body): Json<RejectRequest>,
) -> AppResult<Json<Request>> {
    claims.require_librarian()?;
    body.validate()?;
    let request = state
        .services
        .reject_request(RequestKind::Book, id, &body.reason, &claims.actor())
        .await?;
    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/book-requests/{id}/pay-fine",
    tag = "book-requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book request ID")),
    responses(
        (status = 200, description = "Fine paid", body = BookRequest),
        (status = 409, description = "No outstanding fine")
    )
)]
pub async fn pay_fine(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookRequest>> {
    claims.require_librarian()?;
    let request = state.services.book_requests.pay_fine(id).await?;
    Ok(Json(request))
}
