//! In-memory store with the same commit semantics as the Postgres repositories.
//!
//! One mutex guards all state, so a transition and its ledger effect are
//! applied together or not at all.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{BookRequestRepository, LeaveRepository, StoreRequestRepository};
use crate::{
    error::{AppError, AppResult, TransitionError},
    lifecycle::{
        book::{ActiveCounts, AdmissionGuard},
        LedgerOp,
    },
    models::{
        leave::LeaveQuery,
        request::{NewBookRequest, NewStoreRequest, RequestQuery},
        BookPool, BookRequest, LeaveApplication, RequestStatus, StoreItem, StoreRequest,
    },
};

#[derive(Debug, Default)]
struct MemoryState {
    book_pools: BTreeMap<i32, BookPool>,
    store_items: BTreeMap<i32, StoreItem>,
    book_requests: BTreeMap<i32, BookRequest>,
    store_requests: BTreeMap<i32, StoreRequest>,
    leaves: BTreeMap<i32, LeaveApplication>,
    last_id: i32,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

fn matches_query(requestor_id: i32, status: RequestStatus, query: &RequestQuery) -> bool {
    query.requestor_id.map_or(true, |id| id == requestor_id)
        && query.status.map_or(true, |s| s == status)
}

fn book_not_found(book_id: i32) -> AppError {
    AppError::NotFound(format!("Book {} not found", book_id))
}

fn item_not_found(item_id: i32) -> AppError {
    AppError::NotFound(format!("Store item {} not found", item_id))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a book with all copies on the shelf
    pub async fn insert_book_pool(&self, title: &str, total_copies: i32) -> BookPool {
        let mut state = self.state.lock().await;
        let pool = BookPool {
            id: state.next_id(),
            title: title.to_string(),
            total_copies,
            available_copies: total_copies,
        };
        state.book_pools.insert(pool.id, pool.clone());
        pool
    }

    pub async fn insert_store_item(&self, name: &str, quantity: i32) -> StoreItem {
        let mut state = self.state.lock().await;
        let item = StoreItem {
            id: state.next_id(),
            name: name.to_string(),
            quantity,
        };
        state.store_items.insert(item.id, item.clone());
        item
    }

    pub async fn book_pool(&self, book_id: i32) -> Option<BookPool> {
        self.state.lock().await.book_pools.get(&book_id).cloned()
    }

    pub async fn store_item(&self, item_id: i32) -> Option<StoreItem> {
        self.state.lock().await.store_items.get(&item_id).cloned()
    }
}

#[async_trait]
impl BookRequestRepository for MemoryStore {
    async fn get_pool(&self, book_id: i32) -> AppResult<BookPool> {
        self.book_pool(book_id)
            .await
            .ok_or_else(|| book_not_found(book_id))
    }

    async fn get(&self, id: i32) -> AppResult<BookRequest> {
        self.state
            .lock()
            .await
            .book_requests
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Book request {} not found", id)))
    }

    async fn list(&self, query: &RequestQuery) -> AppResult<Vec<BookRequest>> {
        let state = self.state.lock().await;
        Ok(state
            .book_requests
            .values()
            .rev()
            .filter(|r| matches_query(r.requestor_id, r.status, query))
            .cloned()
            .collect())
    }

    async fn submit(&self, new: NewBookRequest, guard: AdmissionGuard) -> AppResult<BookRequest> {
        let mut state = self.state.lock().await;
        let pool = state
            .book_pools
            .get(&new.book_id)
            .ok_or_else(|| book_not_found(new.book_id))?;

        let mine = || {
            state
                .book_requests
                .values()
                .filter(|r| r.requestor_id == new.requestor_id)
        };
        let counts = ActiveCounts {
            for_resource: mine()
                .filter(|r| {
                    r.book_id == new.book_id
                        && matches!(
                            r.status,
                            RequestStatus::Pending | RequestStatus::Approved | RequestStatus::Issued
                        )
                })
                .count() as i64,
            approved_or_issued: mine()
                .filter(|r| matches!(r.status, RequestStatus::Approved | RequestStatus::Issued))
                .count() as i64,
        };
        guard.check(pool, counts)?;

        let created = BookRequest::pending(state.next_id(), &new);
        state.book_requests.insert(created.id, created.clone());
        Ok(created)
    }

    async fn commit(
        &self,
        from: &BookRequest,
        to: BookRequest,
        ledger: Option<LedgerOp>,
    ) -> AppResult<BookRequest> {
        let mut state = self.state.lock().await;
        let current = state
            .book_requests
            .get(&from.id)
            .ok_or_else(|| AppError::NotFound(format!("Book request {} not found", from.id)))?;
        if current.version != from.version || current.status != from.status.stored() {
            return Err(TransitionError::AlreadyTransitioned.into());
        }

        let book_id = current.book_id;
        let mut pool = state
            .book_pools
            .get(&book_id)
            .cloned()
            .ok_or_else(|| book_not_found(book_id))?;
        if let Some(op) = ledger {
            op.apply(&mut pool)?;
        }

        let updated = BookRequest {
            status: to.status.stored(),
            version: from.version + 1,
            ..to
        };
        state.book_pools.insert(book_id, pool);
        state.book_requests.insert(updated.id, updated.clone());
        Ok(updated)
    }
}

#[async_trait]
impl StoreRequestRepository for MemoryStore {
    async fn get_item(&self, item_id: i32) -> AppResult<StoreItem> {
        self.store_item(item_id)
            .await
            .ok_or_else(|| item_not_found(item_id))
    }

    async fn get(&self, id: i32) -> AppResult<StoreRequest> {
        self.state
            .lock()
            .await
            .store_requests
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Store request {} not found", id)))
    }

    async fn list(&self, query: &RequestQuery) -> AppResult<Vec<StoreRequest>> {
        let state = self.state.lock().await;
        Ok(state
            .store_requests
            .values()
            .rev()
            .filter(|r| matches_query(r.requestor_id, r.status, query))
            .cloned()
            .collect())
    }

    async fn insert(&self, new: NewStoreRequest) -> AppResult<StoreRequest> {
        let mut state = self.state.lock().await;
        if !state.store_items.contains_key(&new.item_id) {
            return Err(item_not_found(new.item_id));
        }
        let created = StoreRequest::pending(state.next_id(), &new);
        state.store_requests.insert(created.id, created.clone());
        Ok(created)
    }

    async fn commit(
        &self,
        from: &StoreRequest,
        to: StoreRequest,
        ledger: Option<LedgerOp>,
    ) -> AppResult<StoreRequest> {
        let mut state = self.state.lock().await;
        let current = state
            .store_requests
            .get(&from.id)
            .ok_or_else(|| AppError::NotFound(format!("Store request {} not found", from.id)))?;
        if current.version != from.version || current.status != from.status {
            return Err(TransitionError::AlreadyTransitioned.into());
        }

        let item_id = current.item_id;
        let mut item = state
            .store_items
            .get(&item_id)
            .cloned()
            .ok_or_else(|| item_not_found(item_id))?;
        if let Some(op) = ledger {
            op.apply(&mut item)?;
        }

        let updated = StoreRequest {
            version: from.version + 1,
            ..to
        };
        state.store_items.insert(item_id, item);
        state.store_requests.insert(updated.id, updated.clone());
        Ok(updated)
    }
}

#[async_trait]
impl LeaveRepository for MemoryStore {
    async fn get(&self, id: i32) -> AppResult<LeaveApplication> {
        self.state
            .lock()
            .await
            .leaves
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Leave application {} not found", id)))
    }

    async fn list(&self, query: &LeaveQuery) -> AppResult<Vec<LeaveApplication>> {
        let state = self.state.lock().await;
        Ok(state
            .leaves
            .values()
            .rev()
            .filter(|a| query.requestor_id.map_or(true, |id| id == a.requestor_id))
            .filter(|a| query.stage.map_or(true, |stage| stage == a.current_stage))
            .cloned()
            .collect())
    }

    async fn insert(&self, draft: LeaveApplication) -> AppResult<LeaveApplication> {
        let mut state = self.state.lock().await;
        let created = LeaveApplication {
            id: state.next_id(),
            version: 1,
            ..draft
        };
        state.leaves.insert(created.id, created.clone());
        Ok(created)
    }

    async fn commit(&self, from: &LeaveApplication, to: LeaveApplication) -> AppResult<LeaveApplication> {
        let mut state = self.state.lock().await;
        let current = state
            .leaves
            .get(&from.id)
            .ok_or_else(|| AppError::NotFound(format!("Leave application {} not found", from.id)))?;
        if current.version != from.version {
            return Err(TransitionError::AlreadyTransitioned.into());
        }

        let updated = LeaveApplication {
            version: from.version + 1,
            ..to
        };
        state.leaves.insert(updated.id, updated.clone());
        Ok(updated)
    }
}
