//! Business logic services

pub mod book_requests;
pub mod leaves;
pub mod store_requests;

use std::sync::Arc;

use crate::{
    clock::Clock,
    config::LendingConfig,
    error::AppResult,
    models::{Actor, Request, RequestKind},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub book_requests: book_requests::BookRequestsService,
    pub store_requests: store_requests::StoreRequestsService,
    pub leaves: leaves::LeavesService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, lending: LendingConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            book_requests: book_requests::BookRequestsService::new(
                repository.clone(),
                lending,
                clock.clone(),
            ),
            store_requests: store_requests::StoreRequestsService::new(repository.clone(), clock.clone()),
            leaves: leaves::LeavesService::new(repository, clock),
        }
    }

    /// Reject a request of either kind
    pub async fn reject_request(
        &self,
        kind: RequestKind,
        id: i32,
        reason: &str,
        rejector: &Actor,
    ) -> AppResult<Request> {
        match kind {
            RequestKind::Book => self
                .book_requests
                .reject(id, reason, rejector)
                .await
                .map(Request::Book),
            RequestKind::Store => self
                .store_requests
                .reject(id, reason, rejector)
                .await
                .map(Request::Store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::SystemClock,
        error::AppError,
        models::{RequestStatus, Role},
        repository::memory::MemoryStore,
    };

    #[tokio::test]
    async fn test_reject_request_dispatches_by_kind() {
        let store = Arc::new(MemoryStore::new());
        let book = store.insert_book_pool("Solaris", 1).await;
        let item = store.insert_store_item("Chalk", 20).await;
        let services = Services::new(
            Repository::in_memory(store),
            LendingConfig::default(),
            Arc::new(SystemClock),
        );
        let student = Actor::new(3, Role::Student);
        let staff = Actor::new(4, Role::Admin);

        let book_request = services.book_requests.submit(book.id, &student).await.unwrap();
        let store_request = services
            .store_requests
            .submit(item.id, 2, None, &student)
            .await
            .unwrap();

        let rejected = services
            .reject_request(RequestKind::Book, book_request.id, "Reference only", &staff)
            .await
            .unwrap();
        assert!(matches!(rejected, Request::Book(_)));
        assert_eq!(rejected.status(), RequestStatus::Rejected);

        let rejected = services
            .reject_request(RequestKind::Store, store_request.id, "Out of season", &staff)
            .await
            .unwrap();
        assert!(matches!(rejected, Request::Store(_)));

        let err = services
            .reject_request(RequestKind::Store, store_request.id, "Again", &staff)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_reject_request_needs_a_reason() {
        let store = Arc::new(MemoryStore::new());
        let item = store.insert_store_item("Glue sticks", 10).await;
        let services = Services::new(
            Repository::in_memory(store.clone()),
            LendingConfig::default(),
            Arc::new(SystemClock),
        );
        let teacher = Actor::new(5, Role::Teacher);
        let manager = Actor::new(6, Role::StoreManager);

        let request = services
            .store_requests
            .submit(item.id, 2, None, &teacher)
            .await
            .unwrap();
        services.store_requests.approve(request.id, 2, &manager).await.unwrap();

        let err = services
            .reject_request(RequestKind::Store, request.id, "   ", &manager)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let unchanged = services.store_requests.get(request.id).await.unwrap();
        assert_eq!(unchanged.status, RequestStatus::Approved);
        assert_eq!(store.store_item(item.id).await.unwrap().quantity, 8);
    }
}
