// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Data Models
//!
//! Records consumed by the adaptive analytics engine. Everything here is
//! persisted by surrounding application code (assignment completion, daily
//! check-ins); the analytics only read them and produce ephemeral suggestions.
//!
//! ## Core Models
//!
//! - [`CompletedSession`]: a finished workout with its [`ExerciseOutcome`]s
//! - [`ScheduledSession`]: a workout assignment and its lifecycle status
//! - [`ReadinessEntry`]: the daily wellness check-in, one per athlete per day
//! - [`PrescribedExercise`]: an exercise of an upcoming workout
//! - [`PersonalBest`] and [`TrainingStreak`]: post-completion bookkeeping
//! - [`SuggestionAuditRecord`]: append-only trace of a shown suggestion

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intelligence::ContextRef;

/// A completed workout session reported by an athlete
///
/// `plan_id` and `workout_id` are the foreign keys reached through the
/// originating assignment, already normalized to plain optional ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedSession {
    pub id: Uuid,
    pub athlete_id: Uuid,
    pub assignment_id: Option<Uuid>,
    pub workout_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    /// When the athlete finished the session (UTC)
    pub completed_at: DateTime<Utc>,
    /// Self-reported overall exertion, 0-10
    pub overall_rpe: Option<f64>,
    pub duration_minutes: Option<u32>,
    pub outcomes: Vec<ExerciseOutcome>,
}

/// Prescribed work joined onto an exercise result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prescription {
    pub sets: Option<u32>,
    /// Free text, e.g. "8-10" or "AMRAP"
    pub reps: Option<String>,
    pub load_kg: Option<f64>,
}

/// The result of one exercise inside a [`CompletedSession`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseOutcome {
    pub exercise_id: Uuid,
    pub exercise_name: Option<String>,
    pub prescription: Option<Prescription>,
    pub sets_completed: Option<u32>,
    /// Free text; only the leading integer counts toward volume
    pub reps_completed: Option<String>,
    pub load_kg: Option<f64>,
    pub duration_seconds: Option<u32>,
    pub distance_meters: Option<f64>,
    pub rpe: Option<f64>,
    pub is_personal_best: bool,
    pub recorded_at: DateTime<Utc>,
}

impl ExerciseOutcome {
    /// Create an outcome with only the volume fields populated
    pub fn new(
        exercise_id: Uuid,
        sets_completed: Option<u32>,
        reps_completed: Option<&str>,
        load_kg: Option<f64>,
    ) -> Self {
        Self {
            exercise_id,
            exercise_name: None,
            prescription: None,
            sets_completed,
            reps_completed: reps_completed.map(str::to_string),
            load_kg,
            duration_seconds: None,
            distance_meters: None,
            rpe: None,
            is_personal_best: false,
            recorded_at: Utc::now(),
        }
    }
}

/// Lifecycle of a workout assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Pending,
    Completed,
    Skipped,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

/// A workout scheduled for an athlete by a coach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledSession {
    pub id: Uuid,
    pub athlete_id: Uuid,
    pub coach_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub workout_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub status: AssignmentStatus,
}

/// Daily readiness check-in
///
/// Component scores use a 1-5 scale; the subjective composite uses 1-10.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessEntry {
    pub athlete_id: Uuid,
    pub log_date: NaiveDate,
    pub subjective_score: Option<f64>,
    pub sleep_quality: Option<u8>,
    pub sleep_hours: Option<f64>,
    pub muscle_soreness: Option<u8>,
    pub energy_level: Option<u8>,
    pub stress_level: Option<u8>,
    pub notes: Option<String>,
}

impl ReadinessEntry {
    /// Entry carrying only the composite score
    pub fn with_score(athlete_id: Uuid, log_date: NaiveDate, score: f64) -> Self {
        Self {
            athlete_id,
            log_date,
            subjective_score: Some(score),
            sleep_quality: None,
            sleep_hours: None,
            muscle_soreness: None,
            energy_level: None,
            stress_level: None,
            notes: None,
        }
    }
}

/// A workout template as prescribed by the coach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: Uuid,
    pub plan_id: Option<Uuid>,
    pub name: String,
    pub target_rpe: Option<f64>,
}

/// One exercise of a workout, in display order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescribedExercise {
    pub id: Uuid,
    pub workout_id: Uuid,
    pub name: String,
    pub sets: Option<u32>,
    pub reps: Option<String>,
    pub load_kg: Option<f64>,
    pub target_rpe: Option<f64>,
    pub order_index: i32,
}

/// Athlete profile fields used by the history digest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AthleteProfile {
    pub id: Uuid,
    pub display_name: Option<String>,
    pub competition_level: Option<String>,
    pub injury_notes: Option<String>,
}

/// Which measurement a personal best records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonalBestKind {
    Weight,
    Reps,
    Time,
    Distance,
}

impl PersonalBestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Reps => "reps",
            Self::Time => "time",
            Self::Distance => "distance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "weight" => Some(Self::Weight),
            "reps" => Some(Self::Reps),
            "time" => Some(Self::Time),
            "distance" => Some(Self::Distance),
            _ => None,
        }
    }
}

/// Best recorded value per athlete, exercise and kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalBest {
    pub athlete_id: Uuid,
    pub exercise_name: String,
    pub kind: PersonalBestKind,
    pub value: f64,
    pub achieved_at: DateTime<Utc>,
    pub completion_id: Uuid,
}

/// Consecutive-day training streak
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingStreak {
    pub user_id: Uuid,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_workout_date: NaiveDate,
}

impl TrainingStreak {
    /// Streak started by a first workout
    pub fn start(user_id: Uuid, today: NaiveDate) -> Self {
        Self {
            user_id,
            current_streak: 1,
            longest_streak: 1,
            last_workout_date: today,
        }
    }

    /// Advance the streak for a workout logged on `today`
    ///
    /// Same day keeps the streak, the next day extends it, any gap resets it
    /// to one while preserving the longest streak.
    pub fn advance(&self, today: NaiveDate) -> Self {
        let gap_days = (today - self.last_workout_date).num_days();
        match gap_days {
            d if d <= 0 => self.clone(),
            1 => {
                let current = self.current_streak + 1;
                Self {
                    user_id: self.user_id,
                    current_streak: current,
                    longest_streak: current.max(self.longest_streak),
                    last_workout_date: today,
                }
            }
            _ => Self {
                user_id: self.user_id,
                current_streak: 1,
                longest_streak: self.longest_streak,
                last_workout_date: today,
            },
        }
    }
}

/// Coach response to a shown suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionTaken {
    Accepted,
    Modified,
    Rejected,
    Pending,
}

impl ActionTaken {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Modified => "modified",
            Self::Rejected => "rejected",
            Self::Pending => "pending",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "accepted" => Some(Self::Accepted),
            "modified" => Some(Self::Modified),
            "rejected" => Some(Self::Rejected),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

/// Append-only record of "suggestion shown, action taken"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionAuditRecord {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub context: ContextRef,
    /// One-line summary, e.g. `[Rules] deload_recommended: Deload recommended`
    pub summary: String,
    /// The suggestion payload as JSON
    pub suggestion: serde_json::Value,
    pub action_taken: ActionTaken,
    pub coach_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
