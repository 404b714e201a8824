// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! In-process repository used by tests and demos

use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{SessionQuery, TrainingRepository};
use crate::models::{
    AssignmentStatus, AthleteProfile, CompletedSession, ExerciseOutcome, PersonalBest,
    PersonalBestKind, PrescribedExercise, ReadinessEntry, ScheduledSession, SuggestionAuditRecord,
    TrainingStreak, Workout,
};

#[derive(Default)]
struct State {
    sessions: Vec<CompletedSession>,
    assignments: Vec<ScheduledSession>,
    readiness: HashMap<(Uuid, NaiveDate), ReadinessEntry>,
    workouts: HashMap<Uuid, Workout>,
    exercises: Vec<PrescribedExercise>,
    profiles: HashMap<Uuid, AthleteProfile>,
    relationships: HashSet<(Uuid, Uuid)>,
    audit_log: Vec<SuggestionAuditRecord>,
    personal_bests: HashMap<(Uuid, String, PersonalBestKind), PersonalBest>,
    streaks: HashMap<Uuid, TrainingStreak>,
}

/// [`TrainingRepository`] backed by in-memory collections
#[derive(Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_session(&self, session: CompletedSession) {
        self.state.write().await.sessions.push(session);
    }

    pub async fn add_assignment(&self, assignment: ScheduledSession) {
        self.state.write().await.assignments.push(assignment);
    }

    pub async fn add_workout(&self, workout: Workout) {
        self.state.write().await.workouts.insert(workout.id, workout);
    }

    pub async fn add_exercise(&self, exercise: PrescribedExercise) {
        self.state.write().await.exercises.push(exercise);
    }

    pub async fn add_profile(&self, profile: AthleteProfile) {
        self.state.write().await.profiles.insert(profile.id, profile);
    }

    pub async fn link_coach_athlete(&self, coach_id: Uuid, athlete_id: Uuid) {
        self.state
            .write()
            .await
            .relationships
            .insert((coach_id, athlete_id));
    }

    /// Snapshot of the audit log in write order
    pub async fn audit_records(&self) -> Vec<SuggestionAuditRecord> {
        self.state.read().await.audit_log.clone()
    }

    pub async fn assignment(&self, assignment_id: Uuid) -> Option<ScheduledSession> {
        self.state
            .read()
            .await
            .assignments
            .iter()
            .find(|a| a.id == assignment_id)
            .cloned()
    }

    pub async fn readiness_count(&self) -> usize {
        self.state.read().await.readiness.len()
    }
}

#[async_trait]
impl TrainingRepository for InMemoryRepository {
    async fn completed_sessions(&self, query: &SessionQuery) -> Result<Vec<CompletedSession>> {
        let state = self.state.read().await;
        let mut sessions: Vec<CompletedSession> = state
            .sessions
            .iter()
            .filter(|session| query.matches(session))
            .cloned()
            .collect();

        sessions.sort_by_key(|session| session.completed_at);
        if query.newest_first {
            sessions.reverse();
        }
        if let Some(limit) = query.limit {
            sessions.truncate(limit);
        }
        Ok(sessions)
    }

    async fn scheduled_sessions(
        &self,
        athlete_id: Uuid,
        plan_id: Option<Uuid>,
    ) -> Result<Vec<ScheduledSession>> {
        let state = self.state.read().await;
        let mut assignments: Vec<ScheduledSession> = state
            .assignments
            .iter()
            .filter(|a| a.athlete_id == athlete_id)
            .filter(|a| plan_id.map_or(true, |plan| a.plan_id == Some(plan)))
            .cloned()
            .collect();
        assignments.sort_by_key(|a| a.scheduled_date);
        Ok(assignments)
    }

    async fn readiness_for_day(
        &self,
        athlete_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ReadinessEntry>> {
        Ok(self
            .state
            .read()
            .await
            .readiness
            .get(&(athlete_id, date))
            .cloned())
    }

    async fn readiness_since(
        &self,
        athlete_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<ReadinessEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<ReadinessEntry> = state
            .readiness
            .values()
            .filter(|entry| entry.athlete_id == athlete_id && entry.log_date >= since)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.log_date.cmp(&a.log_date));
        Ok(entries)
    }

    async fn upsert_readiness(&self, entry: &ReadinessEntry) -> Result<ReadinessEntry> {
        self.state
            .write()
            .await
            .readiness
            .insert((entry.athlete_id, entry.log_date), entry.clone());
        Ok(entry.clone())
    }

    async fn workout(&self, workout_id: Uuid) -> Result<Option<Workout>> {
        Ok(self.state.read().await.workouts.get(&workout_id).cloned())
    }

    async fn workout_exercises(&self, workout_id: Uuid) -> Result<Vec<PrescribedExercise>> {
        let state = self.state.read().await;
        let mut exercises: Vec<PrescribedExercise> = state
            .exercises
            .iter()
            .filter(|exercise| exercise.workout_id == workout_id)
            .cloned()
            .collect();
        exercises.sort_by_key(|exercise| exercise.order_index);
        Ok(exercises)
    }

    async fn latest_outcomes(
        &self,
        exercise_id: Uuid,
        athlete_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ExerciseOutcome>> {
        let state = self.state.read().await;
        let mut outcomes: Vec<ExerciseOutcome> = state
            .sessions
            .iter()
            .filter(|session| session.athlete_id == athlete_id)
            .flat_map(|session| session.outcomes.iter())
            .filter(|outcome| outcome.exercise_id == exercise_id)
            .cloned()
            .collect();
        outcomes.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        outcomes.truncate(limit);
        Ok(outcomes)
    }

    async fn athlete_profile(&self, athlete_id: Uuid) -> Result<Option<AthleteProfile>> {
        Ok(self.state.read().await.profiles.get(&athlete_id).cloned())
    }

    async fn has_active_relationship(&self, coach_id: Uuid, athlete_id: Uuid) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .relationships
            .contains(&(coach_id, athlete_id)))
    }

    async fn append_audit_record(&self, record: &SuggestionAuditRecord) -> Result<()> {
        self.state.write().await.audit_log.push(record.clone());
        Ok(())
    }

    async fn record_completion(&self, session: &CompletedSession) -> Result<()> {
        let mut state = self.state.write().await;
        state.sessions.retain(|existing| existing.id != session.id);
        state.sessions.push(session.clone());
        Ok(())
    }

    async fn mark_assignment_completed(&self, assignment_id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        let assignment = state
            .assignments
            .iter_mut()
            .find(|a| a.id == assignment_id)
            .ok_or_else(|| anyhow!("Assignment {assignment_id} not found"))?;
        assignment.status = AssignmentStatus::Completed;
        Ok(())
    }

    async fn personal_best(
        &self,
        athlete_id: Uuid,
        exercise_name: &str,
        kind: PersonalBestKind,
    ) -> Result<Option<PersonalBest>> {
        Ok(self
            .state
            .read()
            .await
            .personal_bests
            .get(&(athlete_id, exercise_name.to_string(), kind))
            .cloned())
    }

    async fn upsert_personal_best(&self, best: &PersonalBest) -> Result<()> {
        self.state.write().await.personal_bests.insert(
            (best.athlete_id, best.exercise_name.clone(), best.kind),
            best.clone(),
        );
        Ok(())
    }

    async fn streak(&self, user_id: Uuid) -> Result<Option<TrainingStreak>> {
        Ok(self.state.read().await.streaks.get(&user_id).cloned())
    }

    async fn save_streak(&self, streak: &TrainingStreak) -> Result<()> {
        self.state
            .write()
            .await
            .streaks
            .insert(streak.user_id, streak.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_readiness_upsert_replaces_same_day() {
        let repo = InMemoryRepository::new();
        let athlete = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();

        repo.upsert_readiness(&ReadinessEntry::with_score(athlete, date, 5.0))
            .await
            .unwrap();
        repo.upsert_readiness(&ReadinessEntry::with_score(athlete, date, 8.0))
            .await
            .unwrap();

        assert_eq!(repo.readiness_count().await, 1);
        let stored = repo.readiness_for_day(athlete, date).await.unwrap().unwrap();
        assert_eq!(stored.subjective_score, Some(8.0));
    }

    #[tokio::test]
    async fn test_mark_unknown_assignment_fails() {
        let repo = InMemoryRepository::new();
        assert!(repo.mark_assignment_completed(Uuid::new_v4()).await.is_err());
    }
}
