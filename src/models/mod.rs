//! Data models for the lending server

pub mod enums;
pub mod leave;
pub mod pool;
pub mod request;
pub mod user;

// Re-export commonly used types
pub use enums::{FineStatus, LeaveStage, LeaveStatus, RequestStatus, ReviewDecision, ReviewStage};
pub use leave::{LeaveApplication, StageReview};
pub use pool::{BookPool, StoreItem};
pub use request::{BookRequest, Request, RequestKind, StoreRequest};
pub use user::{Actor, Role, UserClaims};
