//! Shared lifecycle enums (stored as Postgres enum types)

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// RequestStatus
// ---------------------------------------------------------------------------

/// Status of a book or store request.
///
/// `Overdue` is never written by a transition: it is derived from the due
/// date when an issued book request is read (see `lifecycle::book`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Issued,
    Fulfilled,
    Returned,
    Overdue,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Issued => "issued",
            RequestStatus::Fulfilled => "fulfilled",
            RequestStatus::Returned => "returned",
            RequestStatus::Overdue => "overdue",
        }
    }

    /// Status as written to storage; overdue is a read-time view of issued
    pub fn stored(&self) -> RequestStatus {
        match self {
            RequestStatus::Overdue => RequestStatus::Issued,
            other => *other,
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FineStatus
// ---------------------------------------------------------------------------

/// Settlement state of a book request fine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "fine_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FineStatus {
    None,
    Pending,
    Paid,
}

// ---------------------------------------------------------------------------
// Leave workflow
// ---------------------------------------------------------------------------

/// Fine-grained status of a leave application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "leave_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    TeacherReviewing,
    TeacherApproved,
    ToReviewing,
    Approved,
    Rejected,
}

/// Coarse position of a leave application in the review pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "leave_stage", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveStage {
    StudentSubmitted,
    TeacherReview,
    ToReview,
    Completed,
}

/// A review stage of the leave workflow, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStage {
    Teacher,
    TrainingOfficer,
}

impl ReviewStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStage::Teacher => "teacher",
            ReviewStage::TrainingOfficer => "training officer",
        }
    }
}

impl std::fmt::Display for ReviewStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one review stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}
