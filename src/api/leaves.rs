//! Leave application endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    lifecycle::approval::StageDecision,
    models::{
        leave::{LeaveQuery, ReviewLeaveApplication, SubmitLeaveApplication},
        LeaveApplication, Role,
    },
    AppState,
};

use super::{ensure_can_read, scope_requestor, AuthenticatedUser};

impl From<ReviewLeaveApplication> for StageDecision {
    fn from(body: ReviewLeaveApplication) -> Self {
        StageDecision {
            decision: body.decision,
            comments: body.comments,
            rejection_reason: body.rejection_reason,
        }
    }
}

#[utoipa::path(
    post,
    path = "/leave-applications",
    tag = "leave-applications",
    security(("bearer_auth" = [])),
    request_body = SubmitLeaveApplication,
    responses(
        (status = 201, description = "Application submitted", body = LeaveApplication),
        (status = 400, description = "Missing leave type or end date before start date")
    )
)]
pub async fn submit(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(body): Json<SubmitLeaveApplication>,
) -> AppResult<(StatusCode, Json<LeaveApplication>)> {
    body.validate()?;
    let created = state.services.leaves.submit(body, &claims.actor()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/leave-applications",
    tag = "leave-applications",
    security(("bearer_auth" = [])),
    params(LeaveQuery),
    responses(
        (status = 200, description = "Matching applications, newest first", body = Vec<LeaveApplication>)
    )
)]
pub async fn list(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(mut query): Query<LeaveQuery>,
) -> AppResult<Json<Vec<LeaveApplication>>> {
    query.requestor_id = scope_requestor(&claims, query.requestor_id)?;
    let applications = state.services.leaves.list(&query).await?;
    Ok(Json(applications))
}

#[utoipa::path(
    get,
    path = "/leave-applications/{id}",
    tag = "leave-applications",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Leave application ID")),
    responses(
        (status = 200, description = "Leave application", body = LeaveApplication),
        (status = 404, description = "Application not found")
    )
)]
pub async fn get(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LeaveApplication>> {
    let application = state.services.leaves.get(id).await?;
    ensure_can_read(&claims, application.requestor_id)?;
    Ok(Json(application))
}

#[utoipa::path(
    post,
    path = "/leave-applications/{id}/teacher-review/start",
    tag = "leave-applications",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Leave application ID")),
    responses(
        (status = 200, description = "Teacher review started", body = LeaveApplication),
        (status = 409, description = "Teacher already decided")
    )
)]
pub async fn start_teacher_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LeaveApplication>> {
    claims.require_role(&[Role::Teacher])?;
    let application = state
        .services
        .leaves
        .start_teacher_review(id, &claims.actor())
        .await?;
    Ok(Json(application))
}

#[utoipa::path(
    post,
    path = "/leave-applications/{id}/teacher-review",
    tag = "leave-applications",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Leave application ID")),
    request_body = ReviewLeaveApplication,
    responses(
        (status = 200, description = "Teacher decision recorded", body = LeaveApplication),
        (status = 400, description = "Rejection without a reason"),
        (status = 409, description = "Teacher already decided")
    )
)]
pub async fn teacher_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(body): Json<ReviewLeaveApplication>,
) -> AppResult<Json<LeaveApplication>> {
    claims.require_role(&[Role::Teacher])?;
    let application = state
        .services
        .leaves
        .teacher_review(id, body.into(), &claims.actor())
        .await?;
    Ok(Json(application))
}

#[utoipa::path(
    post,
    path = "/leave-applications/{id}/to-review/start",
    tag = "leave-applications",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Leave application ID")),
    responses(
        (status = 200, description = "Training officer review started", body = LeaveApplication),
        (status = 409, description = "Training officer already decided"),
        (status = 412, description = "Teacher has not approved")
    )
)]
pub async fn start_to_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LeaveApplication>> {
    claims.require_role(&[Role::TrainingOfficer])?;
    let application = state
        .services
        .leaves
        .start_to_review(id, &claims.actor())
        .await?;
    Ok(Json(application))
}

/// Final decision by the training officer
#[utoipa::path(
    post,
    path = "/leave-applications/{id}/to-review",
    tag = "leave-applications",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Leave application ID")),
    request_body = ReviewLeaveApplication,
    responses(
        (status = 200, description = "Final decision recorded", body = LeaveApplication),
        (status = 400, description = "Rejection without a reason"),
        (status = 409, description = "Training officer already decided"),
        (status = 412, description = "Teacher has not approved")
    )
)]
pub async fn to_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(body): Json<ReviewLeaveApplication>,
) -> AppResult<Json<LeaveApplication>> {
    claims.require_role(&[Role::TrainingOfficer])?;
    let application = state
        .services
        .leaves
        .to_review(id, body.into(), &claims.actor())
        .await?;
    Ok(Json(application))
}
