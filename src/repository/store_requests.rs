//! Store requests repository for database operations

use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres};

use super::StoreRequestRepository;
use crate::{
    error::{AppError, AppResult, TransitionError},
    lifecycle::LedgerOp,
    models::{request::NewStoreRequest, request::RequestQuery, StoreItem, StoreRequest},
};

#[derive(Clone)]
pub struct StoreRequestsRepository {
    pool: Pool<Postgres>,
}

impl StoreRequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Guarded decrement / uncapped increment of `store_items.quantity`
async fn apply_ledger(conn: &mut PgConnection, item_id: i32, op: LedgerOp) -> AppResult<()> {
    match op {
        LedgerOp::Reserve(qty) => {
            let result = sqlx::query(
                "UPDATE store_items SET quantity = quantity - $2 WHERE id = $1 AND quantity >= $2",
            )
            .bind(item_id)
            .bind(qty)
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                let available: i32 =
                    sqlx::query_scalar("SELECT quantity FROM store_items WHERE id = $1")
                        .bind(item_id)
                        .fetch_optional(conn)
                        .await?
                        .ok_or_else(|| {
                            AppError::NotFound(format!("Store item {} not found", item_id))
                        })?;
                return Err(AppError::InsufficientInventory {
                    resource_id: item_id,
                    requested: qty,
                    available,
                });
            }
        }
        LedgerOp::Release(qty) => {
            sqlx::query("UPDATE store_items SET quantity = quantity + $2 WHERE id = $1")
                .bind(item_id)
                .bind(qty)
                .execute(conn)
                .await?;
        }
    }
    Ok(())
}

#[async_trait]
impl StoreRequestRepository for StoreRequestsRepository {
    async fn get_item(&self, item_id: i32) -> AppResult<StoreItem> {
        sqlx::query_as::<_, StoreItem>("SELECT * FROM store_items WHERE id = $1")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Store item {} not found", item_id)))
    }

    async fn get(&self, id: i32) -> AppResult<StoreRequest> {
        sqlx::query_as::<_, StoreRequest>("SELECT * FROM store_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Store request {} not found", id)))
    }

    async fn list(&self, query: &RequestQuery) -> AppResult<Vec<StoreRequest>> {
        let rows = sqlx::query_as::<_, StoreRequest>(
            r#"
            SELECT * FROM store_requests
            WHERE ($1::int4 IS NULL OR requestor_id = $1)
              AND ($2::request_status IS NULL OR status = $2)
            ORDER BY request_date DESC, id DESC
            "#,
        )
        .bind(query.requestor_id)
        .bind(query.status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert(&self, new: NewStoreRequest) -> AppResult<StoreRequest> {
        let created = sqlx::query_as::<_, StoreRequest>(
            r#"
            INSERT INTO store_requests (item_id, requestor_id, status, requested_quantity, purpose, request_date)
            VALUES ($1, $2, 'pending', $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.item_id)
        .bind(new.requestor_id)
        .bind(new.quantity)
        .bind(&new.purpose)
        .bind(new.request_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn commit(
        &self,
        from: &StoreRequest,
        to: StoreRequest,
        ledger: Option<LedgerOp>,
    ) -> AppResult<StoreRequest> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, StoreRequest>(
            r#"
            UPDATE store_requests SET
                status = $4,
                approved_quantity = $5,
                approved_by = $6,
                approval_date = $7,
                fulfill_date = $8,
                rejected_by = $9,
                rejection_date = $10,
                rejection_reason = $11,
                version = version + 1
            WHERE id = $1 AND version = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(from.id)
        .bind(from.version)
        .bind(from.status)
        .bind(to.status)
        .bind(to.approved_quantity)
        .bind(to.approved_by)
        .bind(to.approval_date)
        .bind(to.fulfill_date)
        .bind(to.rejected_by)
        .bind(to.rejection_date)
        .bind(&to.rejection_reason)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(TransitionError::AlreadyTransitioned)?;

        if let Some(op) = ledger {
            apply_ledger(&mut tx, updated.item_id, op).await?;
        }

        tx.commit().await?;
        Ok(updated)
    }
}
