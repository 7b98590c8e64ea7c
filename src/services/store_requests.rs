//! Store request service

use std::sync::Arc;

use crate::{
    clock::Clock,
    error::AppResult,
    lifecycle::store,
    models::{
        request::{NewStoreRequest, RequestQuery},
        Actor, StoreRequest,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct StoreRequestsService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl StoreRequestsService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Submit a request; the item must currently hold `quantity`
    pub async fn submit(
        &self,
        item_id: i32,
        quantity: i32,
        purpose: Option<String>,
        requestor: &Actor,
    ) -> AppResult<StoreRequest> {
        let item = self.repository.store_requests.get_item(item_id).await?;
        store::check_submission(&item, quantity)?;

        let created = self
            .repository
            .store_requests
            .insert(NewStoreRequest {
                item_id,
                requestor_id: requestor.id,
                quantity,
                purpose,
                request_date: self.clock.now(),
            })
            .await?;

        tracing::info!(
            "Store request {} submitted by user {}: {} x item {}",
            created.id,
            requestor.id,
            quantity,
            item_id
        );
        Ok(created)
    }

    /// Approve and take `approved_quantity` out of stock
    pub async fn approve(
        &self,
        id: i32,
        approved_quantity: i32,
        approver: &Actor,
    ) -> AppResult<StoreRequest> {
        let now = self.clock.now();
        let current = self.repository.store_requests.get(id).await?;
        let item = self.repository.store_requests.get_item(current.item_id).await?;

        let (next, reserve) = store::approve(&current, &item, approved_quantity, approver, now)?;
        let stored = self
            .repository
            .store_requests
            .commit(&current, next, Some(reserve))
            .await
            .inspect_err(|e| tracing::warn!("Approval of store request {} failed: {}", id, e))?;

        tracing::info!(
            "Store request {} approved by user {} for {} units",
            id,
            approver.id,
            approved_quantity
        );
        Ok(stored)
    }

    pub async fn fulfill(&self, id: i32) -> AppResult<StoreRequest> {
        let now = self.clock.now();
        let current = self.repository.store_requests.get(id).await?;

        let next = store::fulfill(&current, now)?;
        let stored = self.repository.store_requests.commit(&current, next, None).await?;

        tracing::info!("Store request {} fulfilled", id);
        Ok(stored)
    }

    /// Reject; stock reserved by an earlier approval goes back
    pub async fn reject(&self, id: i32, reason: &str, rejector: &Actor) -> AppResult<StoreRequest> {
        let now = self.clock.now();
        let current = self.repository.store_requests.get(id).await?;

        let (next, release) = store::reject(&current, reason, rejector, now)?;
        let stored = self
            .repository
            .store_requests
            .commit(&current, next, release)
            .await?;

        match release {
            Some(op) => tracing::info!("Store request {} rejected after approval, {:?}", id, op),
            None => tracing::info!("Store request {} rejected by user {}", id, rejector.id),
        }
        Ok(stored)
    }

    pub async fn get(&self, id: i32) -> AppResult<StoreRequest> {
        self.repository.store_requests.get(id).await
    }

    pub async fn list(&self, query: &RequestQuery) -> AppResult<Vec<StoreRequest>> {
        self.repository.store_requests.list(query).await
    }
}
