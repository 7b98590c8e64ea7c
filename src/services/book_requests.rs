//! Book request service

use std::sync::Arc;

use crate::{
    clock::Clock,
    config::LendingConfig,
    error::AppResult,
    lifecycle::{book, book::AdmissionGuard, renewal},
    models::{
        request::{NewBookRequest, RequestQuery},
        Actor, BookRequest,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BookRequestsService {
    repository: Repository,
    lending: LendingConfig,
    clock: Arc<dyn Clock>,
}

impl BookRequestsService {
    pub fn new(repository: Repository, lending: LendingConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            lending,
            clock,
        }
    }

    /// Submit a request for one copy of `book_id`
    pub async fn submit(&self, book_id: i32, requestor: &Actor) -> AppResult<BookRequest> {
        let new = NewBookRequest {
            book_id,
            requestor_id: requestor.id,
            request_date: self.clock.now(),
        };
        let guard = AdmissionGuard::for_role(requestor.role, &self.lending);
        let created = self
            .repository
            .book_requests
            .submit(new, guard)
            .await
            .inspect_err(|e| {
                tracing::warn!("Book request by user {} for book {} refused: {}", requestor.id, book_id, e)
            })?;

        tracing::info!(
            "Book request {} submitted by user {} for book {}",
            created.id,
            requestor.id,
            book_id
        );
        Ok(created)
    }

    pub async fn approve(&self, id: i32, approver: &Actor) -> AppResult<BookRequest> {
        let now = self.clock.now();
        let current = self.repository.book_requests.get(id).await?;
        let pool = self.repository.book_requests.get_pool(current.book_id).await?;

        let next = book::approve(&current, &pool, approver, now)?;
        let stored = self.repository.book_requests.commit(&current, next, None).await?;

        tracing::info!("Book request {} approved by user {}", id, approver.id);
        Ok(stored.with_effective_status(now))
    }

    /// Issue the copy; the due date is `loan_days` from now
    pub async fn issue(&self, id: i32) -> AppResult<BookRequest> {
        let now = self.clock.now();
        let current = self.repository.book_requests.get(id).await?;
        let pool = self.repository.book_requests.get_pool(current.book_id).await?;

        let (next, reserve) = book::issue(&current, &pool, now, &self.lending)?;
        let stored = self
            .repository
            .book_requests
            .commit(&current, next, Some(reserve))
            .await
            .inspect_err(|e| tracing::warn!("Issue of book request {} failed: {}", id, e))?;

        tracing::info!("Book request {} issued, due {:?}", id, stored.due_date);
        Ok(stored.with_effective_status(now))
    }

    /// Return the copy and record any late fine
    pub async fn return_book(&self, id: i32) -> AppResult<BookRequest> {
        let now = self.clock.now();
        let current = self.repository.book_requests.get(id).await?;

        let (next, release) = book::return_copy(&current, now, self.lending.fine_per_day)?;
        let stored = self
            .repository
            .book_requests
            .commit(&current, next, Some(release))
            .await?;

        if stored.fine.is_zero() {
            tracing::info!("Book request {} returned on time", id);
        } else {
            tracing::info!("Book request {} returned late, fine {}", id, stored.fine);
        }
        Ok(stored)
    }

    pub async fn renew(&self, id: i32) -> AppResult<BookRequest> {
        let now = self.clock.now();
        let current = self.repository.book_requests.get(id).await?;

        let next = renewal::renew(&current, now, &self.lending)?;
        let stored = self.repository.book_requests.commit(&current, next, None).await?;

        tracing::info!(
            "Book request {} renewed ({}/{}), due {:?}",
            id,
            stored.renewal_count,
            self.lending.max_renewals,
            stored.due_date
        );
        Ok(stored.with_effective_status(now))
    }

    pub async fn reject(&self, id: i32, reason: &str, rejector: &Actor) -> AppResult<BookRequest> {
        let now = self.clock.now();
        let current = self.repository.book_requests.get(id).await?;

        let next = book::reject(&current, reason, rejector, now)?;
        let stored = self.repository.book_requests.commit(&current, next, None).await?;

        tracing::info!("Book request {} rejected by user {}", id, rejector.id);
        Ok(stored)
    }

    /// Mark the outstanding fine on a returned request as paid
    pub async fn pay_fine(&self, id: i32) -> AppResult<BookRequest> {
        let now = self.clock.now();
        let current = self.repository.book_requests.get(id).await?;

        let next = book::pay_fine(&current, now)?;
        let stored = self.repository.book_requests.commit(&current, next, None).await?;

        tracing::info!("Fine of {} paid on book request {}", stored.fine, id);
        Ok(stored)
    }

    pub async fn get(&self, id: i32) -> AppResult<BookRequest> {
        let request = self.repository.book_requests.get(id).await?;
        Ok(request.with_effective_status(self.clock.now()))
    }

    /// List requests; a status filter is matched against the effective status
    pub async fn list(&self, query: &RequestQuery) -> AppResult<Vec<BookRequest>> {
        let now = self.clock.now();
        let rows = self.repository.book_requests.list(&query.stored()).await?;
        Ok(rows
            .into_iter()
            .map(|r| r.with_effective_status(now))
            .filter(|r| query.status.map_or(true, |s| s == r.status))
            .collect())
    }
}
