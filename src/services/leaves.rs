//! Leave application service

use std::sync::Arc;

use crate::{
    clock::Clock,
    error::AppResult,
    lifecycle::approval::{self, StageDecision},
    models::{
        leave::{LeaveQuery, NewLeaveApplication, SubmitLeaveApplication},
        Actor, LeaveApplication, ReviewStage,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LeavesService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl LeavesService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn submit(
        &self,
        application: SubmitLeaveApplication,
        requestor: &Actor,
    ) -> AppResult<LeaveApplication> {
        let new = NewLeaveApplication {
            requestor_id: requestor.id,
            leave_type: application.leave_type,
            reason: application.reason,
            start_date: application.start_date,
            end_date: application.end_date,
            submitted_at: self.clock.now(),
        };
        let draft = approval::submitted(0, &new)?;
        let created = self.repository.leaves.insert(draft).await?;

        tracing::info!(
            "Leave application {} submitted by user {} ({} to {})",
            created.id,
            requestor.id,
            created.start_date,
            created.end_date
        );
        Ok(created)
    }

    pub async fn start_teacher_review(&self, id: i32, reviewer: &Actor) -> AppResult<LeaveApplication> {
        self.start_review(id, ReviewStage::Teacher, reviewer).await
    }

    pub async fn teacher_review(
        &self,
        id: i32,
        decision: StageDecision,
        reviewer: &Actor,
    ) -> AppResult<LeaveApplication> {
        self.decide(id, ReviewStage::Teacher, decision, reviewer).await
    }

    pub async fn start_to_review(&self, id: i32, reviewer: &Actor) -> AppResult<LeaveApplication> {
        self.start_review(id, ReviewStage::TrainingOfficer, reviewer).await
    }

    pub async fn to_review(
        &self,
        id: i32,
        decision: StageDecision,
        reviewer: &Actor,
    ) -> AppResult<LeaveApplication> {
        self.decide(id, ReviewStage::TrainingOfficer, decision, reviewer).await
    }

    pub async fn get(&self, id: i32) -> AppResult<LeaveApplication> {
        self.repository.leaves.get(id).await
    }

    pub async fn list(&self, query: &LeaveQuery) -> AppResult<Vec<LeaveApplication>> {
        self.repository.leaves.list(query).await
    }

    async fn start_review(
        &self,
        id: i32,
        stage: ReviewStage,
        reviewer: &Actor,
    ) -> AppResult<LeaveApplication> {
        let current = self.repository.leaves.get(id).await?;
        let next = approval::start_review(&current, stage, reviewer, self.clock.now())?;
        let stored = self.repository.leaves.commit(&current, next).await?;

        tracing::debug!("Leave application {}: {} review started by user {}", id, stage, reviewer.id);
        Ok(stored)
    }

    async fn decide(
        &self,
        id: i32,
        stage: ReviewStage,
        decision: StageDecision,
        reviewer: &Actor,
    ) -> AppResult<LeaveApplication> {
        let current = self.repository.leaves.get(id).await?;
        let next = approval::decide(&current, stage, decision, reviewer, self.clock.now())?;
        let stored = self.repository.leaves.commit(&current, next).await?;

        tracing::info!(
            "Leave application {}: {} review by user {}, now {:?}",
            id,
            stage,
            reviewer.id,
            stored.status
        );
        Ok(stored)
    }
}
