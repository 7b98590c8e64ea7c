//! Request lifecycle rules.
//!
//! Every function here is pure: it takes the current state and `now`, and
//! returns the next state plus any inventory effect. Nothing is persisted;
//! the repository commits the result atomically.

pub mod approval;
pub mod book;
pub mod fines;
pub mod ledger;
pub mod renewal;
pub mod store;

pub use ledger::{InventoryPool, LedgerOp};

use crate::error::{AppError, AppResult};

/// Trimmed rejection reason, refusing blank ones
pub(crate) fn require_reason(reason: &str) -> AppResult<String> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::Validation("A rejection reason is required".to_string()));
    }
    Ok(reason.to_string())
}
