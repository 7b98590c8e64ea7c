//! Book loan renewal

use chrono::{DateTime, Duration, Utc};

use super::book::effective_status;
use crate::{
    config::LendingConfig,
    error::{AppError, AppResult, TransitionError},
    models::{BookRequest, RequestStatus},
};

/// Extends the due date of an issued, not yet overdue loan.
pub fn renew(
    request: &BookRequest,
    now: DateTime<Utc>,
    lending: &LendingConfig,
) -> AppResult<BookRequest> {
    let status = effective_status(request, now);
    if status != RequestStatus::Issued {
        return Err(not_eligible(format!("request is {}", status)));
    }
    if request.renewal_count >= lending.max_renewals {
        return Err(not_eligible(format!(
            "maximum renewals reached ({}/{})",
            request.renewal_count, lending.max_renewals
        )));
    }
    let due_date = request.due_date.ok_or_else(|| {
        AppError::Internal(format!("Issued book request {} has no due date", request.id))
    })?;

    let mut next = request.clone();
    next.due_date = Some(due_date + Duration::days(lending.renewal_days));
    next.renewal_count += 1;
    next.is_renewed = true;
    Ok(next)
}

fn not_eligible(reason: String) -> AppError {
    TransitionError::NotEligible(reason).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::book;
    use crate::models::{request::NewBookRequest, Actor, BookPool, Role};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 10, 0, 0).unwrap()
    }

    fn issued() -> BookRequest {
        let pool = BookPool {
            id: 1,
            title: "SICP".to_string(),
            total_copies: 2,
            available_copies: 2,
        };
        let request = BookRequest::pending(
            5,
            &NewBookRequest {
                book_id: 1,
                requestor_id: 11,
                request_date: t0(),
            },
        );
        let approved = book::approve(&request, &pool, &Actor::new(2, Role::Librarian), t0()).unwrap();
        book::issue(&approved, &pool, t0(), &LendingConfig::default()).unwrap().0
    }

    #[test]
    fn test_renew_extends_due_date() {
        let request = issued();
        let renewed = renew(&request, t0() + Duration::days(3), &LendingConfig::default()).unwrap();
        assert_eq!(renewed.due_date, Some(t0() + Duration::days(30)));
        assert_eq!(renewed.renewal_count, 1);
        assert!(renewed.is_renewed);
        assert_eq!(renewed.status, RequestStatus::Issued);
    }

    #[test]
    fn test_third_renewal_is_refused() {
        let lending = LendingConfig::default();
        let once = renew(&issued(), t0(), &lending).unwrap();
        let twice = renew(&once, t0(), &lending).unwrap();
        let err = renew(&twice, t0(), &lending).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition(TransitionError::NotEligible(_))
        ));
        assert_eq!(twice.renewal_count, 2);
    }

    #[test]
    fn test_overdue_loan_cannot_be_renewed() {
        let request = issued();
        let late = request.due_date.unwrap() + Duration::hours(1);
        let err = renew(&request, late, &LendingConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition(TransitionError::NotEligible(_))
        ));
    }
}
