//! Store request endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        request::{ApproveStoreRequest, RejectRequest, RequestQuery, SubmitStoreRequest},
        Request, RequestKind, StoreRequest,
    },
    AppState,
};

use super::{ensure_can_read, scope_requestor, AuthenticatedUser};

#[utoipa::path(
    post,
    path = "/store-requests",
    tag = "store-requests",
    security(("bearer_auth" = [])),
    request_body = SubmitStoreRequest,
    responses(
        (status = 201, description = "Request submitted", body = StoreRequest),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Store item not found"),
        (status = 422, description = "Not enough stock")
    )
)]
pub async fn submit(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(body): Json<SubmitStoreRequest>,
) -> AppResult<(StatusCode, Json<StoreRequest>)> {
    body.validate()?;
    let created = state
        .services
        .store_requests
        .submit(body.item_id, body.quantity, body.purpose, &claims.actor())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/store-requests",
    tag = "store-requests",
    security(("bearer_auth" = [])),
    params(RequestQuery),
    responses(
        (status = 200, description = "Matching requests, newest first", body = Vec<StoreRequest>)
    )
)]
pub async fn list(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(mut query): Query<RequestQuery>,
) -> AppResult<Json<Vec<StoreRequest>>> {
    query.requestor_id = scope_requestor(&claims, query.requestor_id)?;
    let requests = state.services.store_requests.list(&query).await?;
    Ok(Json(requests))
}

#[utoipa::path(
    get,
    path = "/store-requests/{id}",
    tag = "store-requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Store request ID")),
    responses(
        (status = 200, description = "Store request", body = StoreRequest),
        (status = 404, description = "Request not found")
    )
)]
pub async fn get(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<StoreRequest>> {
    let request = state.services.store_requests.get(id).await?;
    ensure_can_read(&claims, request.requestor_id)?;
    Ok(Json(request))
}

/// Approve a quantity, taking it out of stock
#[utoipa::path(
    post,
    path = "/store-requests/{id}/approve",
    tag = "store-requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Store request ID")),
    request_body = ApproveStoreRequest,
    responses(
        (status = 200, description = "Request approved", body = StoreRequest),
        (status = 400, description = "Quantity outside 1..=requested"),
        (status = 409, description = "Request is not pending"),
        (status = 422, description = "Not enough stock")
    )
)]
pub async fn approve(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(body): Json<ApproveStoreRequest>,
) -> AppResult<Json<StoreRequest>> {
    claims.require_store_manager()?;
    body.validate()?;
    let request = state
        .services
        .store_requests
        .approve(id, body.approved_quantity, &claims.actor())
        .await?;
    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/store-requests/{id}/fulfill",
    tag = "store-requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Store request ID")),
    responses(
        (status = 200, description = "Request fulfilled", body = StoreRequest),
        (status = 409, description = "Request is not approved")
    )
)]
pub async fn fulfill(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<StoreRequest>> {
    claims.require_store_manager()?;
    let request = state.services.store_requests.fulfill(id).await?;
    Ok(Json(request))
}

/// Reject a pending or approved request; approved stock is restored
#[utoipa::path(
    post,
    path = "/store-requests/{id}/reject",
    tag = "store-requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Store request ID")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Rejected request, tagged with `kind`", body = Request),
        (status = 400, description = "Missing reason"),
        (status = 409, description = "Request is neither pending nor approved")
    )
)]
pub async fn reject(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(body): Json<RejectRequest>,
) -> AppResult<Json<Request>> {
    claims.require_store_manager()?;
    body.validate()?;
    let request = state
        .services
        .reject_request(RequestKind::Store, id, &body.reason, &claims.actor())
        .await?;
    Ok(Json(request))
}
