//! Book request lifecycle.
//!
//! ```text
//! pending --approve--> approved --issue--> issued --return--> returned
//!    |                                       |  (now > due_date: read as overdue)
//!    +--reject--> rejected                   +--renew--> issued
//! ```
//!
//! Approval only checks availability; the copy is reserved at issue time.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use super::{
    fines,
    ledger::{InventoryPool, LedgerOp},
    require_reason,
};
use crate::{
    config::LendingConfig,
    error::{AppError, AppResult, TransitionError},
    models::{Actor, BookPool, BookRequest, FineStatus, RequestStatus, Role},
};

/// The single overdue predicate used wherever book status is read
pub fn is_overdue(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    due_date.is_some_and(|due| now > due)
}

/// Status of `request` as observed at `now`
pub fn effective_status(request: &BookRequest, now: DateTime<Utc>) -> RequestStatus {
    match request.status {
        RequestStatus::Issued if is_overdue(request.due_date, now) => RequestStatus::Overdue,
        status => status,
    }
}

impl BookRequest {
    pub fn with_effective_status(mut self, now: DateTime<Utc>) -> Self {
        self.status = effective_status(&self, now);
        self
    }
}

/// Submission-time limits for one requestor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionGuard {
    pub max_active_per_resource: i64,
    pub active_limit: i64,
}

/// Requestor's current holdings, counted inside the submitting transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveCounts {
    /// Pending, approved or issued requests for the requested book
    pub for_resource: i64,
    /// Approved or issued requests across all books
    pub approved_or_issued: i64,
}

impl AdmissionGuard {
    pub fn for_role(role: Role, lending: &LendingConfig) -> Self {
        Self {
            max_active_per_resource: lending.max_active_per_resource,
            active_limit: lending.active_limit_for(role),
        }
    }

    pub fn check(&self, pool: &BookPool, counts: ActiveCounts) -> AppResult<()> {
        if counts.for_resource >= self.max_active_per_resource {
            return Err(AppError::DuplicateActiveRequest(pool.id));
        }
        if counts.approved_or_issued >= self.active_limit {
            return Err(AppError::LimitExceeded(format!(
                "At most {} approved or issued book requests ({} held)",
                self.active_limit, counts.approved_or_issued
            )));
        }
        pool.ensure_available(1)
    }
}

pub fn approve(
    request: &BookRequest,
    pool: &BookPool,
    actor: &Actor,
    now: DateTime<Utc>,
) -> AppResult<BookRequest> {
    let status = effective_status(request, now);
    if status != RequestStatus::Pending {
        return Err(TransitionError::NotPending(status).into());
    }
    pool.ensure_available(1)?;

    let mut next = request.clone();
    next.status = RequestStatus::Approved;
    next.approved_by = Some(actor.id);
    next.approval_date = Some(now);
    Ok(next)
}

/// Sets the due date and reserves one copy
pub fn issue(
    request: &BookRequest,
    pool: &BookPool,
    now: DateTime<Utc>,
    lending: &LendingConfig,
) -> AppResult<(BookRequest, LedgerOp)> {
    let status = effective_status(request, now);
    if status != RequestStatus::Approved {
        return Err(TransitionError::NotApproved(status).into());
    }
    pool.ensure_available(1)?;

    let mut next = request.clone();
    next.status = RequestStatus::Issued;
    next.issue_date = Some(now);
    next.due_date = Some(now + Duration::days(lending.loan_days));
    Ok((next, LedgerOp::Reserve(1)))
}

/// Returns the copy to its pool and settles the fine amount
pub fn return_copy(
    request: &BookRequest,
    now: DateTime<Utc>,
    fine_per_day: Decimal,
) -> AppResult<(BookRequest, LedgerOp)> {
    let status = effective_status(request, now);
    if !matches!(status, RequestStatus::Issued | RequestStatus::Overdue) {
        return Err(TransitionError::NotIssuedOrOverdue(status).into());
    }
    let due_date = request.due_date.ok_or_else(|| {
        AppError::Internal(format!("Issued book request {} has no due date", request.id))
    })?;

    let fine = fines::calculate_fine(due_date, now, fine_per_day);

    let mut next = request.clone();
    next.status = RequestStatus::Returned;
    next.actual_return_date = Some(now);
    next.fine = fine;
    next.fine_status = fines::fine_status_for(fine);
    Ok((next, LedgerOp::Release(1)))
}

pub fn reject(
    request: &BookRequest,
    reason: &str,
    actor: &Actor,
    now: DateTime<Utc>,
) -> AppResult<BookRequest> {
    let status = effective_status(request, now);
    if status != RequestStatus::Pending {
        return Err(TransitionError::NotPending(status).into());
    }
    let reason = require_reason(reason)?;

    let mut next = request.clone();
    next.status = RequestStatus::Rejected;
    next.rejected_by = Some(actor.id);
    next.rejection_date = Some(now);
    next.rejection_reason = Some(reason);
    Ok(next)
}

pub fn pay_fine(request: &BookRequest, now: DateTime<Utc>) -> AppResult<BookRequest> {
    if request.fine_status != FineStatus::Pending {
        return Err(TransitionError::NotEligible(format!(
            "book request {} has no outstanding fine",
            request.id
        ))
        .into());
    }

    let mut next = request.clone();
    next.fine_status = FineStatus::Paid;
    next.fine_paid_date = Some(now);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::NewBookRequest;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap()
    }

    fn pool(available: i32) -> BookPool {
        BookPool {
            id: 3,
            title: "The Rust Programming Language".to_string(),
            total_copies: 1,
            available_copies: available,
        }
    }

    fn pending() -> BookRequest {
        BookRequest::pending(
            1,
            &NewBookRequest {
                book_id: 3,
                requestor_id: 100,
                request_date: t0(),
            },
        )
    }

    fn librarian() -> Actor {
        Actor::new(7, Role::Librarian)
    }

    fn issued() -> BookRequest {
        let approved = approve(&pending(), &pool(1), &librarian(), t0()).unwrap();
        issue(&approved, &pool(1), t0(), &LendingConfig::default()).unwrap().0
    }

    #[test]
    fn test_approve_does_not_reserve() {
        let approved = approve(&pending(), &pool(1), &librarian(), t0()).unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        assert_eq!(approved.approved_by, Some(7));
        assert!(approved.due_date.is_none());
    }

    #[test]
    fn test_approve_requires_an_available_copy() {
        let err = approve(&pending(), &pool(0), &librarian(), t0()).unwrap_err();
        assert!(matches!(err, AppError::InsufficientInventory { .. }));
    }

    #[test]
    fn test_approve_twice_is_not_pending() {
        let approved = approve(&pending(), &pool(1), &librarian(), t0()).unwrap();
        let err = approve(&approved, &pool(1), &librarian(), t0()).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition(TransitionError::NotPending(RequestStatus::Approved))
        ));
    }

    #[test]
    fn test_issue_sets_due_date_and_reserves_one() {
        let approved = approve(&pending(), &pool(1), &librarian(), t0()).unwrap();
        let (next, op) = issue(&approved, &pool(1), t0(), &LendingConfig::default()).unwrap();
        assert_eq!(next.status, RequestStatus::Issued);
        assert_eq!(next.issue_date, Some(t0()));
        assert_eq!(next.due_date, Some(t0() + Duration::days(15)));
        assert_eq!(op, LedgerOp::Reserve(1));
    }

    #[test]
    fn test_issue_pending_request_is_refused() {
        let err = issue(&pending(), &pool(1), t0(), &LendingConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition(TransitionError::NotApproved(RequestStatus::Pending))
        ));
    }

    #[test]
    fn test_overdue_is_derived_from_due_date() {
        let request = issued();
        let due = request.due_date.unwrap();
        assert_eq!(effective_status(&request, due), RequestStatus::Issued);
        assert_eq!(
            effective_status(&request, due + Duration::seconds(1)),
            RequestStatus::Overdue
        );
        // Stored status is left alone
        assert_eq!(request.status, RequestStatus::Issued);
    }

    #[test]
    fn test_return_late_charges_fine() {
        let request = issued();
        let (returned, op) =
            return_copy(&request, t0() + Duration::days(20), Decimal::from(5)).unwrap();
        assert_eq!(returned.status, RequestStatus::Returned);
        assert_eq!(returned.fine, Decimal::from(25));
        assert_eq!(returned.fine_status, FineStatus::Pending);
        assert_eq!(op, LedgerOp::Release(1));
    }

    #[test]
    fn test_return_on_time_has_no_fine() {
        let (returned, _) =
            return_copy(&issued(), t0() + Duration::days(10), Decimal::from(5)).unwrap();
        assert_eq!(returned.fine, Decimal::ZERO);
        assert_eq!(returned.fine_status, FineStatus::None);
    }

    #[test]
    fn test_return_requires_issued() {
        let err = return_copy(&pending(), t0(), Decimal::from(5)).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition(TransitionError::NotIssuedOrOverdue(RequestStatus::Pending))
        ));
    }

    #[test]
    fn test_reject_requires_reason() {
        let err = reject(&pending(), "   ", &librarian(), t0()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let rejected = reject(&pending(), "Reference copy", &librarian(), t0()).unwrap();
        assert_eq!(rejected.status, RequestStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Reference copy"));
    }

    #[test]
    fn test_reject_after_issue_is_refused() {
        let err = reject(&issued(), "Too late", &librarian(), t0()).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition(TransitionError::NotPending(RequestStatus::Issued))
        ));
    }

    #[test]
    fn test_pay_fine_only_when_pending() {
        let (returned, _) =
            return_copy(&issued(), t0() + Duration::days(16), Decimal::from(5)).unwrap();
        let paid = pay_fine(&returned, t0() + Duration::days(17)).unwrap();
        assert_eq!(paid.fine_status, FineStatus::Paid);
        assert!(pay_fine(&paid, t0() + Duration::days(18)).is_err());
    }

    #[test]
    fn test_admission_guard_order() {
        let guard = AdmissionGuard::for_role(Role::Student, &LendingConfig::default());

        let dup = guard.check(
            &pool(1),
            ActiveCounts {
                for_resource: 1,
                approved_or_issued: 0,
            },
        );
        assert!(matches!(dup, Err(AppError::DuplicateActiveRequest(3))));

        let capped = guard.check(
            &pool(1),
            ActiveCounts {
                for_resource: 0,
                approved_or_issued: 3,
            },
        );
        assert!(matches!(capped, Err(AppError::LimitExceeded(_))));

        let empty = guard.check(&pool(0), ActiveCounts::default());
        assert!(matches!(empty, Err(AppError::InsufficientInventory { .. })));

        assert!(guard.check(&pool(1), ActiveCounts::default()).is_ok());
    }

    #[test]
    fn test_teacher_cap_is_higher_than_student_cap() {
        let guard = AdmissionGuard::for_role(Role::Teacher, &LendingConfig::default());
        let counts = ActiveCounts {
            for_resource: 0,
            approved_or_issued: 4,
        };
        assert!(guard.check(&pool(1), counts).is_ok());
    }
}
