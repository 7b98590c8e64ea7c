//! Store request lifecycle.
//!
//! Unlike books, approval is the binding allocation: the approved quantity
//! leaves the pool at approval, and a later rejection puts it back.

use chrono::{DateTime, Utc};

use super::{
    ledger::{InventoryPool, LedgerOp},
    require_reason,
};
use crate::{
    error::{AppError, AppResult, TransitionError},
    models::{Actor, RequestStatus, StoreItem, StoreRequest},
};

/// Submission guard: the item must currently hold the requested quantity
pub fn check_submission(item: &StoreItem, quantity: i32) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::Validation(format!(
            "Quantity must be positive, got {}",
            quantity
        )));
    }
    item.ensure_available(quantity)
}

pub fn approve(
    request: &StoreRequest,
    item: &StoreItem,
    approved_quantity: i32,
    actor: &Actor,
    now: DateTime<Utc>,
) -> AppResult<(StoreRequest, LedgerOp)> {
    if request.status != RequestStatus::Pending {
        return Err(TransitionError::NotPending(request.status).into());
    }
    if approved_quantity <= 0 || approved_quantity > request.requested_quantity {
        return Err(AppError::Validation(format!(
            "Approved quantity must be between 1 and {}, got {}",
            request.requested_quantity, approved_quantity
        )));
    }
    item.ensure_available(approved_quantity)?;

    let mut next = request.clone();
    next.status = RequestStatus::Approved;
    next.approved_quantity = Some(approved_quantity);
    next.approved_by = Some(actor.id);
    next.approval_date = Some(now);
    Ok((next, LedgerOp::Reserve(approved_quantity)))
}

/// Hand-over of stock already taken from the pool at approval
pub fn fulfill(request: &StoreRequest, now: DateTime<Utc>) -> AppResult<StoreRequest> {
    if request.status != RequestStatus::Approved {
        return Err(TransitionError::NotApproved(request.status).into());
    }

    let mut next = request.clone();
    next.status = RequestStatus::Fulfilled;
    next.fulfill_date = Some(now);
    Ok(next)
}

/// Rejecting an approved request releases exactly what approval reserved
pub fn reject(
    request: &StoreRequest,
    reason: &str,
    actor: &Actor,
    now: DateTime<Utc>,
) -> AppResult<(StoreRequest, Option<LedgerOp>)> {
    let release = match request.status {
        RequestStatus::Pending => None,
        RequestStatus::Approved => Some(LedgerOp::Release(
            request.approved_quantity.unwrap_or(0),
        )),
        status => return Err(TransitionError::NotApprovedOrPending(status).into()),
    };
    let reason = require_reason(reason)?;

    let mut next = request.clone();
    next.status = RequestStatus::Rejected;
    next.rejected_by = Some(actor.id);
    next.rejection_date = Some(now);
    next.rejection_reason = Some(reason);
    Ok((next, release))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{request::NewStoreRequest, Role};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 2, 8, 30, 0).unwrap()
    }

    fn item(quantity: i32) -> StoreItem {
        StoreItem {
            id: 4,
            name: "Whiteboard markers".to_string(),
            quantity,
        }
    }

    fn pending(quantity: i32) -> StoreRequest {
        StoreRequest::pending(
            1,
            &NewStoreRequest {
                item_id: 4,
                requestor_id: 20,
                quantity,
                purpose: Some("Lab session".to_string()),
                request_date: now(),
            },
        )
    }

    fn manager() -> Actor {
        Actor::new(3, Role::StoreManager)
    }

    #[test]
    fn test_submission_needs_stock() {
        assert!(check_submission(&item(5), 5).is_ok());
        assert!(matches!(
            check_submission(&item(5), 6),
            Err(AppError::InsufficientInventory { requested: 6, available: 5, .. })
        ));
        assert!(matches!(check_submission(&item(5), 0), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_approve_reserves_approved_quantity() {
        let (next, op) = approve(&pending(5), &item(10), 3, &manager(), now()).unwrap();
        assert_eq!(next.status, RequestStatus::Approved);
        assert_eq!(next.approved_quantity, Some(3));
        assert_eq!(op, LedgerOp::Reserve(3));
    }

    #[test]
    fn test_approve_more_than_requested_is_invalid() {
        let err = approve(&pending(2), &item(10), 3, &manager(), now()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_approve_more_than_stock_is_refused() {
        let err = approve(&pending(5), &item(2), 3, &manager(), now()).unwrap_err();
        assert!(matches!(err, AppError::InsufficientInventory { .. }));
    }

    #[test]
    fn test_fulfill_requires_approval() {
        let err = fulfill(&pending(1), now()).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition(TransitionError::NotApproved(RequestStatus::Pending))
        ));

        let (approved, _) = approve(&pending(1), &item(1), 1, &manager(), now()).unwrap();
        let done = fulfill(&approved, now()).unwrap();
        assert_eq!(done.status, RequestStatus::Fulfilled);
        assert_eq!(done.fulfill_date, Some(now()));
    }

    #[test]
    fn test_reject_pending_has_no_inventory_effect() {
        let (next, op) = reject(&pending(2), "Out of budget", &manager(), now()).unwrap();
        assert_eq!(next.status, RequestStatus::Rejected);
        assert_eq!(op, None);
    }

    #[test]
    fn test_reject_approved_releases_reservation() {
        let (approved, _) = approve(&pending(5), &item(10), 3, &manager(), now()).unwrap();
        let (_, op) = reject(&approved, "Duplicate order", &manager(), now()).unwrap();
        assert_eq!(op, Some(LedgerOp::Release(3)));
    }

    #[test]
    fn test_reject_fulfilled_is_refused() {
        let (approved, _) = approve(&pending(1), &item(1), 1, &manager(), now()).unwrap();
        let done = fulfill(&approved, now()).unwrap();
        let err = reject(&done, "Changed mind", &manager(), now()).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition(TransitionError::NotApprovedOrPending(
                RequestStatus::Fulfilled
            ))
        ));
    }
}
