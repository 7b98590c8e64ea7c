//! Request lifecycles driven through the router over in-memory storage

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use lending_server::{
    api,
    clock::ManualClock,
    config::{
        AppConfig, AuthConfig, DatabaseConfig, LendingConfig, LoggingConfig, ServerConfig,
        StorageBackend, StorageConfig,
    },
    models::{Role, UserClaims},
    repository::{memory::MemoryStore, Repository},
    services::Services,
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "lifecycle-test-secret";

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
        ));
        let config = AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig {
                jwt_secret: SECRET.to_string(),
            },
            logging: LoggingConfig::default(),
            storage: StorageConfig {
                backend: StorageBackend::Memory,
            },
            lending: LendingConfig::default(),
        };
        let services = Services::new(
            Repository::in_memory(store.clone()),
            config.lending.clone(),
            clock.clone(),
        );
        let router = api::create_router(AppState {
            config: Arc::new(config),
            services: Arc::new(services),
        });
        Self {
            router,
            store,
            clock,
        }
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        user: (i32, Role),
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let now = Utc::now().timestamp();
        let token = UserClaims {
            sub: user.0.to_string(),
            user_id: user.0,
            role: user.1,
            exp: now + 600,
            iat: now,
        }
        .create_token(SECRET)
        .unwrap();

        let request = Request::builder()
            .method(method)
            .uri(format!("/api/v1{}", path))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

const STUDENT: (i32, Role) = (10, Role::Student);
const LIBRARIAN: (i32, Role) = (20, Role::Librarian);
const TEACHER: (i32, Role) = (30, Role::Teacher);
const STORE_MANAGER: (i32, Role) = (40, Role::StoreManager);

#[tokio::test]
async fn test_book_loan_returned_late() {
    let app = TestApp::new();
    let book = app.store.insert_book_pool("Middlemarch", 2).await;

    let (status, created) = app
        .call(
            Method::POST,
            "/book-requests",
            STUDENT,
            Some(json!({ "book_id": book.id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    let id = created["id"].as_i64().unwrap();

    let (status, _) = app
        .call(Method::POST, &format!("/book-requests/{}/approve", id), LIBRARIAN, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, issued) = app
        .call(Method::POST, &format!("/book-requests/{}/issue", id), LIBRARIAN, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(issued["status"], "issued");
    assert_eq!(app.store.book_pool(book.id).await.unwrap().available_copies, 1);

    app.clock.advance(Duration::days(20));

    let (_, seen) = app
        .call(Method::GET, &format!("/book-requests/{}", id), STUDENT, None)
        .await;
    assert_eq!(seen["status"], "overdue");

    let (status, renewed) = app
        .call(Method::POST, &format!("/book-requests/{}/renew", id), LIBRARIAN, None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(renewed["error"], "NotEligible");

    let (status, returned) = app
        .call(Method::POST, &format!("/book-requests/{}/return", id), LIBRARIAN, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["status"], "returned");
    assert_eq!(returned["fine"], "25");
    assert_eq!(returned["fine_status"], "pending");
    assert_eq!(app.store.book_pool(book.id).await.unwrap().available_copies, 2);

    let (status, again) = app
        .call(Method::POST, &format!("/book-requests/{}/return", id), LIBRARIAN, None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["error"], "NotIssuedOrOverdue");
}

#[tokio::test]
async fn test_duplicate_book_request_is_refused() {
    let app = TestApp::new();
    let book = app.store.insert_book_pool("Persuasion", 3).await;
    let body = json!({ "book_id": book.id });

    let (status, _) = app
        .call(Method::POST, "/book-requests", STUDENT, Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, err) = app
        .call(Method::POST, "/book-requests", STUDENT, Some(body))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"], "DuplicateActiveRequest");
}

#[tokio::test]
async fn test_store_rejection_after_approval_restores_stock() {
    let app = TestApp::new();
    let item = app.store.insert_store_item("Graph paper", 50).await;

    let (status, created) = app
        .call(
            Method::POST,
            "/store-requests",
            TEACHER,
            Some(json!({ "item_id": item.id, "quantity": 8, "purpose": "Geometry unit" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();

    let (status, approved) = app
        .call(
            Method::POST,
            &format!("/store-requests/{}/approve", id),
            STORE_MANAGER,
            Some(json!({ "approved_quantity": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["approved_quantity"], 5);
    assert_eq!(app.store.store_item(item.id).await.unwrap().quantity, 45);

    let (status, rejected) = app
        .call(
            Method::POST,
            &format!("/store-requests/{}/reject", id),
            STORE_MANAGER,
            Some(json!({ "reason": "Supplier recall" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["kind"], "store");
    assert_eq!(rejected["status"], "rejected");
    assert_eq!(app.store.store_item(item.id).await.unwrap().quantity, 50);
}

#[tokio::test]
async fn test_role_gates_transitions() {
    let app = TestApp::new();
    let item = app.store.insert_store_item("Staples", 5).await;

    let (_, created) = app
        .call(
            Method::POST,
            "/store-requests",
            TEACHER,
            Some(json!({ "item_id": item.id, "quantity": 1 })),
        )
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/store-requests/{}/approve", id),
            LIBRARIAN,
            Some(json!({ "approved_quantity": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(Method::GET, &format!("/store-requests/{}", id), STUDENT, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_leave_requires_teacher_before_officer() {
    let app = TestApp::new();

    let (status, created) = app
        .call(
            Method::POST,
            "/leave-applications",
            STUDENT,
            Some(json!({
                "leave_type": "medical",
                "start_date": "2025-03-20",
                "end_date": "2025-03-21"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();

    let (status, err) = app
        .call(
            Method::POST,
            &format!("/leave-applications/{}/to-review/start", id),
            (50, Role::TrainingOfficer),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(err["error"], "PreconditionFailed");

    let (status, started) = app
        .call(
            Method::POST,
            &format!("/leave-applications/{}/teacher-review/start", id),
            TEACHER,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "teacher_reviewing");
    assert_eq!(started["current_stage"], "student_submitted");

    let (status, err) = app
        .call(
            Method::POST,
            &format!("/leave-applications/{}/teacher-review", id),
            TEACHER,
            Some(json!({ "decision": "rejected" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "BadValue");
}
