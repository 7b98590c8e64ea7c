//! Repository layer: persisted state behind the lifecycle operations.
//!
//! Every `commit` is a compare-and-set on `(status, version)` of the stored
//! row, applied in the same transaction as its inventory effect. When the
//! row moved on since it was read the commit fails with
//! `TransitionError::AlreadyTransitioned`; when the ledger guard fails it
//! fails with `InsufficientInventory`. Either way nothing is written.

pub mod book_requests;
pub mod leaves;
pub mod memory;
pub mod store_requests;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    lifecycle::{book::AdmissionGuard, LedgerOp},
    models::{
        leave::LeaveQuery,
        request::{NewBookRequest, NewStoreRequest, RequestQuery},
        BookPool, BookRequest, LeaveApplication, StoreItem, StoreRequest,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRequestRepository: Send + Sync {
    async fn get_pool(&self, book_id: i32) -> AppResult<BookPool>;

    async fn get(&self, id: i32) -> AppResult<BookRequest>;

    /// Filters on stored status
    async fn list(&self, query: &RequestQuery) -> AppResult<Vec<BookRequest>>;

    /// Runs the admission guard and inserts a pending request, serialized per requestor
    async fn submit(&self, new: NewBookRequest, guard: AdmissionGuard) -> AppResult<BookRequest>;

    async fn commit(
        &self,
        from: &BookRequest,
        to: BookRequest,
        ledger: Option<LedgerOp>,
    ) -> AppResult<BookRequest>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreRequestRepository: Send + Sync {
    async fn get_item(&self, item_id: i32) -> AppResult<StoreItem>;

    async fn get(&self, id: i32) -> AppResult<StoreRequest>;

    async fn list(&self, query: &RequestQuery) -> AppResult<Vec<StoreRequest>>;

    async fn insert(&self, new: NewStoreRequest) -> AppResult<StoreRequest>;

    async fn commit(
        &self,
        from: &StoreRequest,
        to: StoreRequest,
        ledger: Option<LedgerOp>,
    ) -> AppResult<StoreRequest>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaveRepository: Send + Sync {
    async fn get(&self, id: i32) -> AppResult<LeaveApplication>;

    async fn list(&self, query: &LeaveQuery) -> AppResult<Vec<LeaveApplication>>;

    /// Stores a new application; the id of `draft` is replaced
    async fn insert(&self, draft: LeaveApplication) -> AppResult<LeaveApplication>;

    async fn commit(&self, from: &LeaveApplication, to: LeaveApplication) -> AppResult<LeaveApplication>;
}

/// Main repository struct holding one store per aggregate
#[derive(Clone)]
pub struct Repository {
    pub book_requests: Arc<dyn BookRequestRepository>,
    pub store_requests: Arc<dyn StoreRequestRepository>,
    pub leaves: Arc<dyn LeaveRepository>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            book_requests: Arc::new(book_requests::BookRequestsRepository::new(pool.clone())),
            store_requests: Arc::new(store_requests::StoreRequestsRepository::new(pool.clone())),
            leaves: Arc::new(leaves::LeavesRepository::new(pool)),
        }
    }

    /// Repository over a shared in-memory store
    pub fn in_memory(store: Arc<memory::MemoryStore>) -> Self {
        Self {
            book_requests: store.clone(),
            store_requests: store.clone(),
            leaves: store,
        }
    }
}
