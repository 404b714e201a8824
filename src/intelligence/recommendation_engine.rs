// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Suggestion orchestrator
//!
//! [`AdaptiveEngine`] fetches the data each classifier needs, runs the
//! classifiers concurrently and merges their output into one list sorted by
//! priority. The two entry points never fail: a classifier error is logged
//! and contributes nothing. The individual `check_*` methods return their
//! `Result` so callers that need a verified coach-athlete relationship see
//! the rejection.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::classifiers::{self, ComplianceStats, RpeObservation};
use super::metrics::{acwr_reading, start_of_day, week_start, weekly_volumes};
use super::{ensure_relationship, sort_by_priority, AnalysisError, Suggestion};
use crate::config::AnalyticsConfig;
use crate::constants::thresholds;
use crate::logging::AppLogger;
use crate::models::{ActionTaken, CompletedSession, SuggestionAuditRecord};
use crate::repository::{SessionQuery, TrainingRepository};

type ClassifierResult = Result<Vec<Suggestion>, AnalysisError>;

/// Rule-based adaptive suggestion engine
pub struct AdaptiveEngine {
    repository: Arc<dyn TrainingRepository>,
    config: AnalyticsConfig,
    clock: Option<DateTime<Utc>>,
}

impl AdaptiveEngine {
    pub fn new(repository: Arc<dyn TrainingRepository>) -> Self {
        Self::with_config(repository, AnalyticsConfig::default())
    }

    pub fn with_config(repository: Arc<dyn TrainingRepository>, config: AnalyticsConfig) -> Self {
        Self {
            repository,
            config,
            clock: None,
        }
    }

    /// Pin "now" to a fixed instant instead of the system clock
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// All plan-level suggestions, most urgent first
    ///
    /// Overload and deload always run; readiness and compliance only when an
    /// athlete is given.
    pub async fn get_suggestions_for_plan(
        &self,
        plan_id: Uuid,
        coach_id: Uuid,
        athlete_id: Option<Uuid>,
    ) -> Vec<Suggestion> {
        let started = Instant::now();

        let (overload, deload, readiness, compliance) = tokio::join!(
            self.check_progressive_overload(plan_id),
            self.check_deload_needed(plan_id, athlete_id),
            async {
                match athlete_id {
                    Some(athlete_id) => self.check_readiness_adjustment(athlete_id).await,
                    None => Ok(Vec::new()),
                }
            },
            async {
                match athlete_id {
                    Some(athlete_id) => {
                        self.check_compliance_alerts(plan_id, coach_id, athlete_id)
                            .await
                    }
                    None => Ok(Vec::new()),
                }
            },
        );

        let mut suggestions = Vec::new();
        suggestions.extend(collapse("progressive_overload", overload));
        suggestions.extend(collapse("deload", deload));
        suggestions.extend(collapse("readiness", readiness));
        suggestions.extend(collapse("compliance", compliance));
        sort_by_priority(&mut suggestions);

        AppLogger::log_suggestion_run(
            "plan",
            &plan_id.to_string(),
            suggestions.len(),
            started.elapsed().as_millis() as u64,
        );
        suggestions
    }

    /// Readiness and per-exercise progression for one upcoming session
    pub async fn get_suggestions_for_session(
        &self,
        workout_id: Uuid,
        athlete_id: Uuid,
    ) -> Vec<Suggestion> {
        let started = Instant::now();

        let (readiness, progression) = tokio::join!(
            self.check_readiness_adjustment(athlete_id),
            self.get_exercise_progression_suggestions(workout_id, athlete_id),
        );

        let mut suggestions = collapse("readiness", readiness);
        suggestions.extend(collapse("exercise_progression", progression));
        sort_by_priority(&mut suggestions);

        AppLogger::log_suggestion_run(
            "session",
            &workout_id.to_string(),
            suggestions.len(),
            started.elapsed().as_millis() as u64,
        );
        suggestions
    }

    /// Overload suggestions from the most recent sessions of a plan
    pub async fn check_progressive_overload(&self, plan_id: Uuid) -> ClassifierResult {
        let query = SessionQuery::new()
            .plan(plan_id)
            .newest_first()
            .limit(self.config.lookback.overload_sessions);
        let sessions = self.repository.completed_sessions(&query).await?;

        debug!(plan_id = %plan_id, sessions = sessions.len(), "Checking progressive overload");
        Ok(classifiers::aggregate_overload(&sessions))
    }

    /// RPE overreach streak and ACWR spike checks
    ///
    /// Both look at the plan's sessions, narrowed to one athlete when given.
    pub async fn check_deload_needed(
        &self,
        plan_id: Uuid,
        athlete_id: Option<Uuid>,
    ) -> ClassifierResult {
        let mut suggestions = Vec::new();

        let recent = SessionQuery::new()
            .plan(plan_id)
            .maybe_athlete(athlete_id)
            .newest_first()
            .limit(self.config.lookback.deload_sessions);
        let sessions = self.repository.completed_sessions(&recent).await?;

        let observations = self.rpe_observations(&sessions).await?;
        if let Some(suggestion) = classifiers::rpe_overreach(&observations, plan_id) {
            suggestions.push(suggestion);
        }

        // Complete ISO weeks only; the current week is still in progress
        let current_week = week_start(self.today());
        let window_start = current_week - Duration::weeks(thresholds::ACWR_CHRONIC_WEEKS as i64);
        let window = SessionQuery::new()
            .plan(plan_id)
            .maybe_athlete(athlete_id)
            .since(start_of_day(window_start))
            .until(start_of_day(current_week));
        let window_sessions = self.repository.completed_sessions(&window).await?;

        let weekly = weekly_volumes(
            &window_sessions,
            window_start,
            current_week - Duration::days(1),
        );
        if let Some(suggestion) = classifiers::acwr_risk(acwr_reading(&weekly.values()), plan_id) {
            suggestions.push(suggestion);
        }

        Ok(suggestions)
    }

    /// Pair each session's RPE with its workout target, newest first
    ///
    /// Sessions without a reported RPE or a workout link are left out.
    async fn rpe_observations(
        &self,
        sessions: &[CompletedSession],
    ) -> Result<Vec<RpeObservation>, AnalysisError> {
        let mut targets: HashMap<Uuid, Option<f64>> = HashMap::new();
        let mut observations = Vec::new();

        for session in sessions {
            let (Some(actual_rpe), Some(workout_id)) = (session.overall_rpe, session.workout_id)
            else {
                continue;
            };

            let target_rpe = match targets.get(&workout_id) {
                Some(target) => *target,
                None => {
                    let target = self
                        .repository
                        .workout(workout_id)
                        .await?
                        .and_then(|workout| workout.target_rpe)
                        .filter(|target| *target > 0.0);
                    targets.insert(workout_id, target);
                    target
                }
            };

            observations.push(RpeObservation {
                actual_rpe,
                target_rpe,
            });
        }

        Ok(observations)
    }

    /// Session modification from today's readiness check-in
    pub async fn check_readiness_adjustment(&self, athlete_id: Uuid) -> ClassifierResult {
        let entry = self
            .repository
            .readiness_for_day(athlete_id, self.today())
            .await?;

        Ok(classifiers::readiness_adjustment(entry.as_ref(), athlete_id)
            .into_iter()
            .collect())
    }

    /// Compliance alert for one athlete on one plan
    ///
    /// Fails with [`AnalysisError::NoActiveRelationship`] when the coach does
    /// not actively coach the athlete.
    pub async fn check_compliance_alerts(
        &self,
        plan_id: Uuid,
        coach_id: Uuid,
        athlete_id: Uuid,
    ) -> ClassifierResult {
        ensure_relationship(self.repository.as_ref(), coach_id, athlete_id).await?;

        let assignments = self
            .repository
            .scheduled_sessions(athlete_id, Some(plan_id))
            .await?;
        let stats = ComplianceStats::from_assignments(&assignments, self.today());

        debug!(
            athlete_id = %athlete_id,
            total = stats.total,
            completed = stats.completed,
            "Checking compliance"
        );
        Ok(classifiers::compliance_alert(&stats, athlete_id)
            .into_iter()
            .collect())
    }

    /// One progression suggestion per qualifying exercise of a workout
    pub async fn get_exercise_progression_suggestions(
        &self,
        workout_id: Uuid,
        athlete_id: Uuid,
    ) -> ClassifierResult {
        let exercises = self.repository.workout_exercises(workout_id).await?;
        let mut suggestions = Vec::new();

        for exercise in &exercises {
            let previous = self
                .repository
                .latest_outcomes(exercise.id, athlete_id, self.config.lookback.progression_results)
                .await?;

            if let Some(suggestion) = classifiers::exercise_progression(exercise, previous.first()) {
                suggestions.push(suggestion);
            }
        }

        Ok(suggestions)
    }

    /// Append a "suggestion shown, action taken" record in the background
    ///
    /// The write never fails the caller; a failed write is logged. The
    /// returned handle may be awaited or dropped. Outside a Tokio runtime
    /// nothing is written and `None` is returned.
    pub fn log_suggestion(
        &self,
        coach_id: Uuid,
        suggestion: &Suggestion,
        action_taken: ActionTaken,
        coach_notes: Option<String>,
    ) -> Option<JoinHandle<()>> {
        let record = audit_record(coach_id, suggestion, action_taken, coach_notes, self.now());

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                AppLogger::log_audit_write(&coach_id.to_string(), &record.summary, false);
                warn!(error = %e, "No async runtime available, suggestion not logged");
                return None;
            }
        };
        let repository = Arc::clone(&self.repository);

        Some(runtime.spawn(async move {
            let coach = record.coach_id.to_string();
            match repository.append_audit_record(&record).await {
                Ok(()) => AppLogger::log_audit_write(&coach, &record.summary, true),
                Err(e) => {
                    AppLogger::log_audit_write(&coach, &record.summary, false);
                    warn!(error = %e, "Failed to log suggestion");
                }
            }
        }))
    }
}

/// Build the audit record for a shown suggestion
pub fn audit_record(
    coach_id: Uuid,
    suggestion: &Suggestion,
    action_taken: ActionTaken,
    coach_notes: Option<String>,
    created_at: DateTime<Utc>,
) -> SuggestionAuditRecord {
    let payload = serde_json::to_value(suggestion).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to serialize suggestion payload");
        serde_json::Value::Null
    });

    SuggestionAuditRecord {
        id: Uuid::new_v4(),
        coach_id,
        context: suggestion.context,
        summary: format!("[Rules] {}: {}", suggestion.kind.as_str(), suggestion.title),
        suggestion: payload,
        action_taken,
        coach_notes: coach_notes.filter(|notes| !notes.trim().is_empty()),
        created_at,
    }
}

/// Collapse a classifier result to its suggestions, logging any failure
fn collapse(classifier: &str, result: ClassifierResult) -> Vec<Suggestion> {
    match result {
        Ok(suggestions) => suggestions,
        Err(error) if error.is_authorization() => {
            AppLogger::log_security_event(
                "missing_coach_athlete_relationship",
                "medium",
                &error.to_string(),
                None,
            );
            Vec::new()
        }
        Err(error) => {
            AppLogger::log_classifier_failure(classifier, &error.to_string());
            Vec::new()
        }
    }
}
