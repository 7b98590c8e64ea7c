//! Leave application model and review types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{LeaveStage, LeaveStatus, ReviewDecision, ReviewStage};

/// One entry of the ordered review pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StageReview {
    pub stage: ReviewStage,
    pub reviewer_id: Option<i32>,
    pub started_at: Option<DateTime<Utc>>,
    pub decision: Option<ReviewDecision>,
    pub decided_at: Option<DateTime<Utc>>,
    pub comments: Option<String>,
    pub rejection_reason: Option<String>,
}

impl StageReview {
    pub fn open(stage: ReviewStage) -> Self {
        Self {
            stage,
            reviewer_id: None,
            started_at: None,
            decision: None,
            decided_at: None,
            comments: None,
            rejection_reason: None,
        }
    }

    pub fn is_decided(&self) -> bool {
        self.decision.is_some()
    }
}

/// Leave application moving through sequential reviews
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveApplication {
    pub id: i32,
    pub requestor_id: i32,
    pub leave_type: String,
    pub reason: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    pub current_stage: LeaveStage,
    /// Index into `reviews` of the stage awaiting a decision
    pub stage_index: i16,
    pub reviews: Vec<StageReview>,
    pub submitted_at: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub version: i32,
}

impl LeaveApplication {
    pub fn review(&self, stage: ReviewStage) -> Option<&StageReview> {
        self.reviews.iter().find(|r| r.stage == stage)
    }

    /// Teacher review, once decided
    pub fn teacher_review(&self) -> Option<&StageReview> {
        self.review(ReviewStage::Teacher).filter(|r| r.is_decided())
    }

    /// Training officer review, once decided
    pub fn to_review(&self) -> Option<&StageReview> {
        self.review(ReviewStage::TrainingOfficer).filter(|r| r.is_decided())
    }
}

/// Row to insert for a new leave application
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveApplication {
    pub requestor_id: i32,
    pub leave_type: String,
    pub reason: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub submitted_at: DateTime<Utc>,
}

/// Submit leave application body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitLeaveApplication {
    #[validate(length(min = 1, message = "Leave type is required"))]
    pub leave_type: String,
    pub reason: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Stage decision body
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewLeaveApplication {
    pub decision: ReviewDecision,
    pub comments: Option<String>,
    /// Required when rejecting
    pub rejection_reason: Option<String>,
}

/// Filters for listing leave applications
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct LeaveQuery {
    pub requestor_id: Option<i32>,
    pub stage: Option<LeaveStage>,
}
