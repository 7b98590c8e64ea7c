//! Inventory ledger: guarded reserve/release on a resource pool.
//!
//! The in-memory form below and the SQL in the Postgres repositories encode the
//! same guard: a reservation succeeds only when enough units are available,
//! and a release never lifts a capped pool above its total.

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{BookPool, StoreItem},
};

/// Inventory effect committed together with a request transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerOp {
    Reserve(i32),
    Release(i32),
}

impl LedgerOp {
    pub fn apply<P: InventoryPool + ?Sized>(self, pool: &mut P) -> AppResult<()> {
        match self {
            LedgerOp::Reserve(qty) => pool.reserve(qty),
            LedgerOp::Release(qty) => {
                pool.release(qty);
                Ok(())
            }
        }
    }
}

pub trait InventoryPool {
    fn resource_id(&self) -> i32;

    fn available(&self) -> i32;

    /// Upper bound for `available`, if the pool has one
    fn capacity(&self) -> Option<i32>;

    fn set_available(&mut self, units: i32);

    /// Fails with `InsufficientInventory` and leaves the pool untouched
    /// unless `available >= qty`.
    fn reserve(&mut self, qty: i32) -> AppResult<()> {
        if qty <= 0 {
            return Err(AppError::Validation(format!(
                "Reserved quantity must be positive, got {}",
                qty
            )));
        }
        let available = self.available();
        if available < qty {
            return Err(AppError::InsufficientInventory {
                resource_id: self.resource_id(),
                requested: qty,
                available,
            });
        }
        self.set_available(available - qty);
        Ok(())
    }

    fn release(&mut self, qty: i32) {
        let restored = self.available() + qty.max(0);
        let restored = match self.capacity() {
            Some(cap) => restored.min(cap),
            None => restored,
        };
        self.set_available(restored);
    }

    /// Availability guard without reserving anything
    fn ensure_available(&self, qty: i32) -> AppResult<()> {
        let available = self.available();
        if available < qty {
            return Err(AppError::InsufficientInventory {
                resource_id: self.resource_id(),
                requested: qty,
                available,
            });
        }
        Ok(())
    }
}

impl InventoryPool for BookPool {
    fn resource_id(&self) -> i32 {
        self.id
    }

    fn available(&self) -> i32 {
        self.available_copies
    }

    fn capacity(&self) -> Option<i32> {
        Some(self.total_copies)
    }

    fn set_available(&mut self, units: i32) {
        self.available_copies = units;
    }
}

impl InventoryPool for StoreItem {
    fn resource_id(&self) -> i32 {
        self.id
    }

    fn available(&self) -> i32 {
        self.quantity
    }

    fn capacity(&self) -> Option<i32> {
        None
    }

    fn set_available(&mut self, units: i32) {
        self.quantity = units;
    }
}
