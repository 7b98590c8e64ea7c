//! Leave applications repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{types::Json, FromRow, Pool, Postgres};

use super::LeaveRepository;
use crate::{
    error::{AppError, AppResult, TransitionError},
    models::{leave::LeaveQuery, LeaveApplication, LeaveStage, LeaveStatus, StageReview},
};

/// Row as stored; reviews live in a JSONB array
#[derive(Debug, FromRow)]
struct LeaveRow {
    id: i32,
    requestor_id: i32,
    leave_type: String,
    reason: Option<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: LeaveStatus,
    current_stage: LeaveStage,
    stage_index: i16,
    reviews: Json<Vec<StageReview>>,
    submitted_at: DateTime<Utc>,
    completed_date: Option<DateTime<Utc>>,
    version: i32,
}

impl From<LeaveRow> for LeaveApplication {
    fn from(row: LeaveRow) -> Self {
        Self {
            id: row.id,
            requestor_id: row.requestor_id,
            leave_type: row.leave_type,
            reason: row.reason,
            start_date: row.start_date,
            end_date: row.end_date,
            status: row.status,
            current_stage: row.current_stage,
            stage_index: row.stage_index,
            reviews: row.reviews.0,
            submitted_at: row.submitted_at,
            completed_date: row.completed_date,
            version: row.version,
        }
    }
}

#[derive(Clone)]
pub struct LeavesRepository {
    pool: Pool<Postgres>,
}

impl LeavesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveRepository for LeavesRepository {
    async fn get(&self, id: i32) -> AppResult<LeaveApplication> {
        sqlx::query_as::<_, LeaveRow>("SELECT * FROM leave_applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveApplication::from)
            .ok_or_else(|| AppError::NotFound(format!("Leave application {} not found", id)))
    }

    async fn list(&self, query: &LeaveQuery) -> AppResult<Vec<LeaveApplication>> {
        let rows = sqlx::query_as::<_, LeaveRow>(
            r#"
            SELECT * FROM leave_applications
            WHERE ($1::int4 IS NULL OR requestor_id = $1)
              AND ($2::leave_stage IS NULL OR current_stage = $2)
            ORDER BY submitted_at DESC, id DESC
            "#,
        )
        .bind(query.requestor_id)
        .bind(query.stage)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(LeaveApplication::from).collect())
    }

    async fn insert(&self, draft: LeaveApplication) -> AppResult<LeaveApplication> {
        let row = sqlx::query_as::<_, LeaveRow>(
            r#"
            INSERT INTO leave_applications (
                requestor_id, leave_type, reason, start_date, end_date,
                status, current_stage, stage_index, reviews, submitted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(draft.requestor_id)
        .bind(&draft.leave_type)
        .bind(&draft.reason)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(draft.status)
        .bind(draft.current_stage)
        .bind(draft.stage_index)
        .bind(Json(&draft.reviews))
        .bind(draft.submitted_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn commit(&self, from: &LeaveApplication, to: LeaveApplication) -> AppResult<LeaveApplication> {
        let row = sqlx::query_as::<_, LeaveRow>(
            r#"
            UPDATE leave_applications SET
                status = $3,
                current_stage = $4,
                stage_index = $5,
                reviews = $6,
                completed_date = $7,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(from.id)
        .bind(from.version)
        .bind(to.status)
        .bind(to.current_stage)
        .bind(to.stage_index)
        .bind(Json(&to.reviews))
        .bind(to.completed_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TransitionError::AlreadyTransitioned)?;
        Ok(row.into())
    }
}
