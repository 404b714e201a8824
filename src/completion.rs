// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Workout Completion
//!
//! Records a finished assignment and runs the bookkeeping that follows it.
//!
//! Storing the session is the only step whose failure fails the call. The
//! assignment status update, the personal-best upsert and the streak update
//! each run independently afterwards; a failure is logged, reported in
//! [`CompletionReport::failed_steps`], and leaves earlier steps in place.
//! Every step is safe to retry.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::intelligence::metrics::parse_leading_int;
use crate::models::{
    CompletedSession, ExerciseOutcome, PersonalBest, PersonalBestKind, ScheduledSession,
    TrainingStreak,
};
use crate::repository::TrainingRepository;

/// What the athlete reports when finishing an assignment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionInput {
    pub duration_minutes: Option<u32>,
    pub overall_rpe: Option<f64>,
    pub results: Vec<ExerciseOutcome>,
}

/// Bookkeeping steps run after the session is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStep {
    AssignmentStatus,
    PersonalBests,
    Streak,
}

impl CompletionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssignmentStatus => "assignment_status",
            Self::PersonalBests => "personal_bests",
            Self::Streak => "streak",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionReport {
    pub completion_id: Uuid,
    /// Personal bests written by this completion
    pub personal_bests: Vec<PersonalBest>,
    pub streak: Option<TrainingStreak>,
    pub failed_steps: Vec<CompletionStep>,
}

impl CompletionReport {
    pub fn is_complete(&self) -> bool {
        self.failed_steps.is_empty()
    }

    fn fail(&mut self, step: CompletionStep, error: &anyhow::Error) {
        warn!(
            completion.id = %self.completion_id,
            completion.step = step.as_str(),
            error = %error,
            "Post-completion step failed"
        );
        self.failed_steps.push(step);
    }
}

/// Kind and value a result would set as a personal best
///
/// Load wins over reps, reps over time, time over distance. A result with
/// rep text that has no leading number yields nothing.
pub fn personal_best_candidate(outcome: &ExerciseOutcome) -> Option<(PersonalBestKind, f64)> {
    if let Some(load) = outcome.load_kg.filter(|load| *load > 0.0) {
        return Some((PersonalBestKind::Weight, load));
    }

    if let Some(reps) = outcome.reps_completed.as_deref().filter(|r| !r.trim().is_empty()) {
        return parse_leading_int(reps)
            .filter(|reps| *reps != 0)
            .map(|reps| (PersonalBestKind::Reps, reps as f64));
    }

    if let Some(seconds) = outcome.duration_seconds.filter(|s| *s > 0) {
        return Some((PersonalBestKind::Time, f64::from(seconds)));
    }

    outcome
        .distance_meters
        .filter(|meters| *meters > 0.0)
        .map(|meters| (PersonalBestKind::Distance, meters))
}

/// Whether `candidate` beats the stored best; for time lower is better
pub fn is_new_personal_best(kind: PersonalBestKind, existing: Option<f64>, candidate: f64) -> bool {
    match existing {
        None => true,
        Some(best) if kind == PersonalBestKind::Time => candidate < best,
        Some(best) => candidate > best,
    }
}

pub struct CompletionPipeline {
    repository: Arc<dyn TrainingRepository>,
    clock: Option<DateTime<Utc>>,
}

impl CompletionPipeline {
    pub fn new(repository: Arc<dyn TrainingRepository>) -> Self {
        Self {
            repository,
            clock: None,
        }
    }

    /// Pin the completion instant instead of the system clock
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    /// Complete an assignment for the athlete it was scheduled for
    pub async fn complete(
        &self,
        assignment_id: Uuid,
        athlete_id: Uuid,
        input: CompletionInput,
    ) -> Result<CompletionReport> {
        let completed_at = self.clock.unwrap_or_else(Utc::now);
        let assignment = self.find_assignment(assignment_id, athlete_id).await?;

        let session = CompletedSession {
            id: Uuid::new_v4(),
            athlete_id,
            assignment_id: Some(assignment_id),
            workout_id: Some(assignment.workout_id),
            plan_id: assignment.plan_id,
            completed_at,
            overall_rpe: input.overall_rpe,
            duration_minutes: input.duration_minutes,
            outcomes: input
                .results
                .into_iter()
                .map(|mut outcome| {
                    outcome.recorded_at = completed_at;
                    outcome
                })
                .collect(),
        };
        self.repository.record_completion(&session).await?;
        info!(
            completion.id = %session.id,
            assignment.id = %assignment_id,
            user.id = %athlete_id,
            "Workout completion recorded"
        );

        let mut report = CompletionReport {
            completion_id: session.id,
            personal_bests: Vec::new(),
            streak: None,
            failed_steps: Vec::new(),
        };

        if let Err(e) = self.repository.mark_assignment_completed(assignment_id).await {
            report.fail(CompletionStep::AssignmentStatus, &e);
        }

        match self.update_personal_bests(&session).await {
            Ok(bests) => report.personal_bests = bests,
            Err(e) => report.fail(CompletionStep::PersonalBests, &e),
        }

        match self.update_streak(athlete_id, completed_at).await {
            Ok(streak) => report.streak = Some(streak),
            Err(e) => report.fail(CompletionStep::Streak, &e),
        }

        Ok(report)
    }

    async fn find_assignment(&self, assignment_id: Uuid, athlete_id: Uuid) -> Result<ScheduledSession> {
        self.repository
            .scheduled_sessions(athlete_id, None)
            .await?
            .into_iter()
            .find(|assignment| assignment.id == assignment_id)
            .ok_or_else(|| anyhow!("Assignment {assignment_id} not found for athlete {athlete_id}"))
    }

    /// Upsert bests for the results the athlete flagged
    async fn update_personal_bests(&self, session: &CompletedSession) -> Result<Vec<PersonalBest>> {
        let flagged: Vec<&ExerciseOutcome> = session
            .outcomes
            .iter()
            .filter(|outcome| outcome.is_personal_best)
            .collect();
        if flagged.is_empty() {
            return Ok(Vec::new());
        }

        let exercises = match session.workout_id {
            Some(workout_id) => self.repository.workout_exercises(workout_id).await?,
            None => Vec::new(),
        };

        let mut written = Vec::new();
        for outcome in flagged {
            let name = outcome.exercise_name.clone().or_else(|| {
                exercises
                    .iter()
                    .find(|exercise| exercise.id == outcome.exercise_id)
                    .map(|exercise| exercise.name.clone())
            });
            let (Some(name), Some((kind, value))) = (name, personal_best_candidate(outcome)) else {
                continue;
            };

            let existing = self
                .repository
                .personal_best(session.athlete_id, &name, kind)
                .await?
                .map(|best| best.value);
            if !is_new_personal_best(kind, existing, value) {
                continue;
            }

            let best = PersonalBest {
                athlete_id: session.athlete_id,
                exercise_name: name,
                kind,
                value,
                achieved_at: session.completed_at,
                completion_id: session.id,
            };
            self.repository.upsert_personal_best(&best).await?;
            written.push(best);
        }

        Ok(written)
    }

    async fn update_streak(&self, athlete_id: Uuid, completed_at: DateTime<Utc>) -> Result<TrainingStreak> {
        let today = completed_at.date_naive();
        let streak = match self.repository.streak(athlete_id).await? {
            Some(streak) => streak.advance(today),
            None => TrainingStreak::start(athlete_id, today),
        };
        self.repository.save_streak(&streak).await?;
        Ok(streak)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome() -> ExerciseOutcome {
        ExerciseOutcome::new(Uuid::new_v4(), None, None, None)
    }

    #[test]
    fn test_candidate_prefers_weight() {
        let mut result = outcome();
        result.load_kg = Some(100.0);
        result.reps_completed = Some("5".to_string());
        result.duration_seconds = Some(60);

        assert_eq!(
            personal_best_candidate(&result),
            Some((PersonalBestKind::Weight, 100.0))
        );
    }

    #[test]
    fn test_candidate_reps_text_blocks_fallthrough() {
        let mut result = outcome();
        result.reps_completed = Some("12-15".to_string());
        assert_eq!(personal_best_candidate(&result), Some((PersonalBestKind::Reps, 12.0)));

        result.reps_completed = Some("AMRAP".to_string());
        result.duration_seconds = Some(90);
        assert_eq!(personal_best_candidate(&result), None);
    }

    #[test]
    fn test_candidate_time_then_distance() {
        let mut result = outcome();
        result.duration_seconds = Some(0);
        result.distance_meters = Some(5000.0);
        assert_eq!(
            personal_best_candidate(&result),
            Some((PersonalBestKind::Distance, 5000.0))
        );

        result.duration_seconds = Some(1200);
        assert_eq!(personal_best_candidate(&result), Some((PersonalBestKind::Time, 1200.0)));
        assert_eq!(personal_best_candidate(&outcome()), None);
    }

    #[test]
    fn test_time_best_is_lower() {
        assert!(is_new_personal_best(PersonalBestKind::Time, Some(300.0), 290.0));
        assert!(!is_new_personal_best(PersonalBestKind::Time, Some(300.0), 310.0));
        assert!(is_new_personal_best(PersonalBestKind::Weight, Some(100.0), 102.5));
        assert!(!is_new_personal_best(PersonalBestKind::Reps, Some(10.0), 10.0));
        assert!(is_new_personal_best(PersonalBestKind::Distance, None, 1.0));
    }
}
