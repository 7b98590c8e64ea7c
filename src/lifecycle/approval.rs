//! Sequential multi-stage review, used for leave applications.
//!
//! Stages are decided strictly in the order of [`LEAVE_STAGES`]. Approval
//! advances `stage_index`; a rejection at any stage completes the
//! application and no later stage ever runs.

use chrono::{DateTime, NaiveDate, Utc};

use super::require_reason;
use crate::{
    error::{AppError, AppResult, TransitionError},
    models::{
        leave::NewLeaveApplication, Actor, LeaveApplication, LeaveStage, LeaveStatus,
        ReviewDecision, ReviewStage, StageReview,
    },
};

pub const LEAVE_STAGES: [ReviewStage; 2] = [ReviewStage::Teacher, ReviewStage::TrainingOfficer];

/// A reviewer's decision on one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDecision {
    pub decision: ReviewDecision,
    pub comments: Option<String>,
    pub rejection_reason: Option<String>,
}

pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
    if end < start {
        return Err(AppError::Validation(format!(
            "Invalid date range: end date {} is before start date {}",
            end, start
        )));
    }
    Ok(())
}

/// Freshly submitted application with every stage open
pub fn submitted(id: i32, new: &NewLeaveApplication) -> AppResult<LeaveApplication> {
    validate_date_range(new.start_date, new.end_date)?;

    Ok(LeaveApplication {
        id,
        requestor_id: new.requestor_id,
        leave_type: new.leave_type.clone(),
        reason: new.reason.clone(),
        start_date: new.start_date,
        end_date: new.end_date,
        status: LeaveStatus::Pending,
        current_stage: LeaveStage::StudentSubmitted,
        stage_index: 0,
        reviews: LEAVE_STAGES.iter().copied().map(StageReview::open).collect(),
        submitted_at: new.submitted_at,
        completed_date: None,
        version: 1,
    })
}

fn position(stage: ReviewStage) -> usize {
    LEAVE_STAGES
        .iter()
        .position(|s| *s == stage)
        .unwrap_or(LEAVE_STAGES.len())
}

fn reviewing_status(stage: ReviewStage) -> LeaveStatus {
    match stage {
        ReviewStage::Teacher => LeaveStatus::TeacherReviewing,
        ReviewStage::TrainingOfficer => LeaveStatus::ToReviewing,
    }
}

/// Status after a non-final stage approves
fn stage_approved_status(stage: ReviewStage) -> LeaveStatus {
    match stage {
        ReviewStage::Teacher => LeaveStatus::TeacherApproved,
        ReviewStage::TrainingOfficer => LeaveStatus::Approved,
    }
}

/// Pipeline stage while `stage` awaits its decision
fn awaiting_stage(stage: ReviewStage) -> LeaveStage {
    match stage {
        ReviewStage::Teacher => LeaveStage::TeacherReview,
        ReviewStage::TrainingOfficer => LeaveStage::ToReview,
    }
}

/// Index of `stage` if it is the one open for review, otherwise why not.
fn open_stage(app: &LeaveApplication, stage: ReviewStage) -> AppResult<usize> {
    let pos = position(stage);
    let review = app
        .reviews
        .get(pos)
        .filter(|r| r.stage == stage)
        .ok_or_else(|| {
            AppError::Internal(format!(
                "Leave application {} has no {} stage",
                app.id, stage
            ))
        })?;

    if review.is_decided() {
        return Err(TransitionError::AlreadyReviewed(stage.to_string()).into());
    }
    if let Some(blocking) = app.reviews[..pos]
        .iter()
        .find(|r| r.decision != Some(ReviewDecision::Approved))
    {
        return Err(AppError::PreconditionFailed(format!(
            "{} review has not approved leave application {}",
            blocking.stage, app.id
        )));
    }
    if app.current_stage == LeaveStage::Completed {
        return Err(TransitionError::AlreadyReviewed(stage.to_string()).into());
    }
    Ok(pos)
}

/// Bookkeeping only: records that `actor` opened the stage.
pub fn start_review(
    app: &LeaveApplication,
    stage: ReviewStage,
    actor: &Actor,
    now: DateTime<Utc>,
) -> AppResult<LeaveApplication> {
    let pos = open_stage(app, stage)?;

    let mut next = app.clone();
    let review = &mut next.reviews[pos];
    review.reviewer_id = Some(actor.id);
    review.started_at.get_or_insert(now);
    next.status = reviewing_status(stage);
    Ok(next)
}

pub fn decide(
    app: &LeaveApplication,
    stage: ReviewStage,
    decision: StageDecision,
    actor: &Actor,
    now: DateTime<Utc>,
) -> AppResult<LeaveApplication> {
    let pos = open_stage(app, stage)?;
    let rejection_reason = match decision.decision {
        ReviewDecision::Rejected => Some(require_reason(
            decision.rejection_reason.as_deref().unwrap_or_default(),
        )?),
        ReviewDecision::Approved => None,
    };

    let mut next = app.clone();
    let review = &mut next.reviews[pos];
    review.reviewer_id = Some(actor.id);
    review.decision = Some(decision.decision);
    review.decided_at = Some(now);
    review.comments = decision.comments;
    review.rejection_reason = rejection_reason;

    match decision.decision {
        ReviewDecision::Rejected => {
            next.status = LeaveStatus::Rejected;
            next.current_stage = LeaveStage::Completed;
            next.completed_date = Some(now);
        }
        ReviewDecision::Approved => match LEAVE_STAGES.get(pos + 1) {
            Some(following) => {
                next.status = stage_approved_status(stage);
                next.current_stage = awaiting_stage(*following);
                next.stage_index = (pos + 1) as i16;
            }
            None => {
                next.status = LeaveStatus::Approved;
                next.current_stage = LeaveStage::Completed;
                next.completed_date = Some(now);
            }
        },
    }
    Ok(next)
}
