//! Book requests repository for database operations

use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres};

use super::BookRequestRepository;
use crate::{
    error::{AppError, AppResult, TransitionError},
    lifecycle::{
        book::{ActiveCounts, AdmissionGuard},
        LedgerOp,
    },
    models::{request::NewBookRequest, request::RequestQuery, BookPool, BookRequest},
};

/// Namespace for per-requestor advisory locks taken at submission
const ADMISSION_LOCK_SPACE: i32 = 0x4c45;

#[derive(Clone)]
pub struct BookRequestsRepository {
    pool: Pool<Postgres>,
}

impl BookRequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

async fn fetch_pool(conn: &mut PgConnection, book_id: i32) -> AppResult<BookPool> {
    sqlx::query_as::<_, BookPool>("SELECT * FROM book_pools WHERE id = $1")
        .bind(book_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", book_id)))
}

/// Guarded copy reservation / capped release on `book_pools`
async fn apply_ledger(conn: &mut PgConnection, book_id: i32, op: LedgerOp) -> AppResult<()> {
    match op {
        LedgerOp::Reserve(qty) => {
            let result = sqlx::query(
                r#"
                UPDATE book_pools
                SET available_copies = available_copies - $2
                WHERE id = $1 AND available_copies >= $2
                "#,
            )
            .bind(book_id)
            .bind(qty)
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                let pool = fetch_pool(conn, book_id).await?;
                return Err(AppError::InsufficientInventory {
                    resource_id: book_id,
                    requested: qty,
                    available: pool.available_copies,
                });
            }
        }
        LedgerOp::Release(qty) => {
            sqlx::query(
                r#"
                UPDATE book_pools
                SET available_copies = LEAST(available_copies + $2, total_copies)
                WHERE id = $1
                "#,
            )
            .bind(book_id)
            .bind(qty)
            .execute(conn)
            .await?;
        }
    }
    Ok(())
}

#[async_trait]
impl BookRequestRepository for BookRequestsRepository {
    async fn get_pool(&self, book_id: i32) -> AppResult<BookPool> {
        let mut conn = self.pool.acquire().await?;
        fetch_pool(&mut conn, book_id).await
    }

    async fn get(&self, id: i32) -> AppResult<BookRequest> {
        sqlx::query_as::<_, BookRequest>("SELECT * FROM book_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book request {} not found", id)))
    }

    async fn list(&self, query: &RequestQuery) -> AppResult<Vec<BookRequest>> {
        let rows = sqlx::query_as::<_, BookRequest>(
            r#"
            SELECT * FROM book_requests
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

    async fn submit(&self, new: NewBookRequest, guard: AdmissionGuard) -> AppResult<BookRequest> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(ADMISSION_LOCK_SPACE)
            .bind(new.requestor_id)
            .execute(&mut *tx)
            .await?;

        let pool = fetch_pool(&mut tx, new.book_id).await?;

        let (for_resource, approved_or_issued) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE book_id = $2 AND status IN ('pending', 'approved', 'issued')),
                COUNT(*) FILTER (WHERE status IN ('approved', 'issued'))
            FROM book_requests
            WHERE requestor_id = $1
            "#,
        )
        .bind(new.requestor_id)
        .bind(new.book_id)
        .fetch_one(&mut *tx)
        .await?;

        guard.check(
            &pool,
            ActiveCounts {
                for_resource,
                approved_or_issued,
            },
        )?;

        let created = sqlx::query_as::<_, BookRequest>(
            r#"
            INSERT INTO book_requests (book_id, requestor_id, status, request_date)
            VALUES ($1, $2, 'pending', $3)
            RETURNING *
            "#,
        )
        .bind(new.book_id)
        .bind(new.requestor_id)
        .bind(new.request_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn commit(
        &self,
        from: &BookRequest,
        to: BookRequest,
        ledger: Option<LedgerOp>,
    ) -> AppResult<BookRequest> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, BookRequest>(
            r#"
            UPDATE book_requests SET
                status = $4,
                approved_by = $5,
                approval_date = $6,
                issue_date = $7,
                due_date = $8,
                actual_return_date = $9,
                fine = $10,
                fine_status = $11,
                fine_paid_date = $12,
                renewal_count = $13,
                is_renewed = $14,
                rejected_by = $15,
                rejection_date = $16,
                rejection_reason = $17,
                version = version + 1
            WHERE id = $1 AND version = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(from.id)
        .bind(from.version)
        .bind(from.status.stored())
        .bind(to.status.stored())
        .bind(to.approved_by)
        .bind(to.approval_date)
        .bind(to.issue_date)
        .bind(to.due_date)
        .bind(to.actual_return_date)
        .bind(to.fine)
        .bind(to.fine_status)
        .bind(to.fine_paid_date)
        .bind(to.renewal_count)
        .bind(to.is_renewed)
        .bind(to.rejected_by)
        .bind(to.rejection_date)
        .bind(&to.rejection_reason)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(TransitionError::AlreadyTransitioned)?;

        if let Some(op) = ledger {
            apply_ledger(&mut tx, updated.book_id, op).await?;
        }

        tx.commit().await?;
        Ok(updated)
    }
}
