// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Data-access seam for the analytics engine
//!
//! The engine never talks to storage directly; it receives a
//! [`TrainingRepository`] at construction time. [`crate::database::Database`]
//! implements it over SQLite and [`InMemoryRepository`] keeps everything in
//! process for tests and demos. Empty results are valid answers, not errors.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{
    AthleteProfile, CompletedSession, ExerciseOutcome, PersonalBest, PersonalBestKind,
    PrescribedExercise, ReadinessEntry, ScheduledSession, SuggestionAuditRecord, TrainingStreak,
    Workout,
};

pub mod memory;

pub use memory::InMemoryRepository;

/// Filter for completed-session queries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionQuery {
    pub athlete_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    /// Inclusive lower bound on `completed_at`
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `completed_at`
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    /// Order by `completed_at` descending instead of ascending
    pub newest_first: bool,
}

impl SessionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn athlete(mut self, athlete_id: Uuid) -> Self {
        self.athlete_id = Some(athlete_id);
        self
    }

    pub fn maybe_athlete(mut self, athlete_id: Option<Uuid>) -> Self {
        self.athlete_id = athlete_id;
        self
    }

    pub fn plan(mut self, plan_id: Uuid) -> Self {
        self.plan_id = Some(plan_id);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    /// Whether a session passes the athlete, plan and time filters
    pub fn matches(&self, session: &CompletedSession) -> bool {
        self.athlete_id.map_or(true, |id| session.athlete_id == id)
            && self.plan_id.map_or(true, |id| session.plan_id == Some(id))
            && self.since.map_or(true, |since| session.completed_at >= since)
            && self.until.map_or(true, |until| session.completed_at < until)
    }
}

/// Storage operations the analytics engine and completion pipeline rely on
#[async_trait]
pub trait TrainingRepository: Send + Sync {
    /// Completed sessions with their outcomes, ordered by time
    async fn completed_sessions(&self, query: &SessionQuery) -> Result<Vec<CompletedSession>>;

    /// Assignments of an athlete, optionally restricted to a plan
    async fn scheduled_sessions(
        &self,
        athlete_id: Uuid,
        plan_id: Option<Uuid>,
    ) -> Result<Vec<ScheduledSession>>;

    async fn readiness_for_day(
        &self,
        athlete_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ReadinessEntry>>;

    /// Readiness entries from `since` (inclusive), newest first
    async fn readiness_since(&self, athlete_id: Uuid, since: NaiveDate)
        -> Result<Vec<ReadinessEntry>>;

    /// Insert or replace the entry for `(athlete_id, log_date)`
    async fn upsert_readiness(&self, entry: &ReadinessEntry) -> Result<ReadinessEntry>;

    async fn workout(&self, workout_id: Uuid) -> Result<Option<Workout>>;

    /// Exercises of a workout in display order
    async fn workout_exercises(&self, workout_id: Uuid) -> Result<Vec<PrescribedExercise>>;

    /// Most recent results of one exercise for one athlete, newest first
    async fn latest_outcomes(
        &self,
        exercise_id: Uuid,
        athlete_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ExerciseOutcome>>;

    async fn athlete_profile(&self, athlete_id: Uuid) -> Result<Option<AthleteProfile>>;

    async fn has_active_relationship(&self, coach_id: Uuid, athlete_id: Uuid) -> Result<bool>;

    async fn append_audit_record(&self, record: &SuggestionAuditRecord) -> Result<()>;

    /// Store a completed session; storing the same id again replaces it
    async fn record_completion(&self, session: &CompletedSession) -> Result<()>;

    async fn mark_assignment_completed(&self, assignment_id: Uuid) -> Result<()>;

    async fn personal_best(
        &self,
        athlete_id: Uuid,
        exercise_name: &str,
        kind: PersonalBestKind,
    ) -> Result<Option<PersonalBest>>;

    /// Insert or replace the best for `(athlete_id, exercise_name, kind)`
    async fn upsert_personal_best(&self, best: &PersonalBest) -> Result<()>;

    async fn streak(&self, user_id: Uuid) -> Result<Option<TrainingStreak>>;

    async fn save_streak(&self, streak: &TrainingStreak) -> Result<()>;
}
