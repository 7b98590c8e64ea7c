//! Book and store request models and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{FineStatus, RequestStatus};

/// Which resource family a request draws on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Book,
    Store,
}

/// A request of either kind, as returned by kind-agnostic operations
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Request {
    Book(BookRequest),
    Store(StoreRequest),
}

impl Request {
    pub fn status(&self) -> RequestStatus {
        match self {
            Request::Book(r) => r.status,
            Request::Store(r) => r.status,
        }
    }
}

/// Request for one copy of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookRequest {
    pub id: i32,
    pub book_id: i32,
    pub requestor_id: i32,
    pub status: RequestStatus,
    pub request_date: DateTime<Utc>,
    pub approved_by: Option<i32>,
    pub approval_date: Option<DateTime<Utc>>,
    pub issue_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub fine: Decimal,
    pub fine_status: FineStatus,
    pub fine_paid_date: Option<DateTime<Utc>>,
    pub renewal_count: i16,
    pub is_renewed: bool,
    pub rejected_by: Option<i32>,
    pub rejection_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    /// Bumped by every committed transition
    pub version: i32,
}

/// Request for a quantity of a store item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StoreRequest {
    pub id: i32,
    pub item_id: i32,
    pub requestor_id: i32,
    pub status: RequestStatus,
    pub requested_quantity: i32,
    pub approved_quantity: Option<i32>,
    pub purpose: Option<String>,
    pub request_date: DateTime<Utc>,
    pub approved_by: Option<i32>,
    pub approval_date: Option<DateTime<Utc>>,
    pub fulfill_date: Option<DateTime<Utc>>,
    pub rejected_by: Option<i32>,
    pub rejection_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub version: i32,
}

/// Row to insert for a new book request
#[derive(Debug, Clone, PartialEq)]
pub struct NewBookRequest {
    pub book_id: i32,
    pub requestor_id: i32,
    pub request_date: DateTime<Utc>,
}

/// Row to insert for a new store request
#[derive(Debug, Clone, PartialEq)]
pub struct NewStoreRequest {
    pub item_id: i32,
    pub requestor_id: i32,
    pub quantity: i32,
    pub purpose: Option<String>,
    pub request_date: DateTime<Utc>,
}

/// Submit book request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitBookRequest {
    pub book_id: i32,
}

/// Submit store request body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitStoreRequest {
    pub item_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub purpose: Option<String>,
}

/// Approve store request body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApproveStoreRequest {
    #[validate(range(min = 1, message = "Approved quantity must be at least 1"))]
    pub approved_quantity: i32,
}

/// Reject request body (book or store)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectRequest {
    #[validate(length(min = 1, message = "A rejection reason is required"))]
    pub reason: String,
}

/// Filters for listing requests
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct RequestQuery {
    pub requestor_id: Option<i32>,
    /// `overdue` selects issued book requests past their due date
    pub status: Option<RequestStatus>,
}

impl RequestQuery {
    /// Same filter against stored statuses
    pub fn stored(&self) -> RequestQuery {
        RequestQuery {
            requestor_id: self.requestor_id,
            status: self.status.map(|s| s.stored()),
        }
    }
}

impl BookRequest {
    /// Pending request as first stored under `id`
    pub fn pending(id: i32, new: &NewBookRequest) -> Self {
        Self {
            id,
            book_id: new.book_id,
            requestor_id: new.requestor_id,
            status: RequestStatus::Pending,
            request_date: new.request_date,
            approved_by: None,
            approval_date: None,
            issue_date: None,
            due_date: None,
            actual_return_date: None,
            fine: Decimal::ZERO,
            fine_status: FineStatus::None,
            fine_paid_date: None,
            renewal_count: 0,
            is_renewed: false,
            rejected_by: None,
            rejection_date: None,
            rejection_reason: None,
            version: 1,
        }
    }
}

impl StoreRequest {
    pub fn pending(id: i32, new: &NewStoreRequest) -> Self {
        Self {
            id,
            item_id: new.item_id,
            requestor_id: new.requestor_id,
            status: RequestStatus::Pending,
            requested_quantity: new.quantity,
            approved_quantity: None,
            purpose: new.purpose.clone(),
            request_date: new.request_date,
            approved_by: None,
            approval_date: None,
            fulfill_date: None,
            rejected_by: None,
            rejection_date: None,
            rejection_reason: None,
            version: 1,
        }
    }
}
