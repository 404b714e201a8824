// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Intelligence Module
//!
//! Adaptive training-load analytics for coaches.
//!
//! This module includes:
//! - Weekly volume aggregation, ACWR and volume trend ([`metrics`])
//! - Deterministic rule classifiers ([`classifiers`])
//! - The suggestion orchestrator ([`recommendation_engine`])
//! - The athlete history digest ([`history`])

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repository::TrainingRepository;

pub mod classifiers;
pub mod history;
pub mod metrics;
pub mod recommendation_engine;

pub use history::{AthleteHistorySummary, HistorySummarizer};
pub use metrics::{AcwrReading, ExerciseFrequency, VolumeTrend, WeekKey, WeeklyVolumes};
pub use recommendation_engine::AdaptiveEngine;

/// Kind of adaptive suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    ProgressiveOverload,
    DeloadRecommended,
    ReadinessAdjustment,
    ComplianceAlert,
    VolumeCheck,
    RecoveryNeeded,
}

impl SuggestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProgressiveOverload => "progressive_overload",
            Self::DeloadRecommended => "deload_recommended",
            Self::ReadinessAdjustment => "readiness_adjustment",
            Self::ComplianceAlert => "compliance_alert",
            Self::VolumeCheck => "volume_check",
            Self::RecoveryNeeded => "recovery_needed",
        }
    }
}

/// Priority of a suggestion, most urgent first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl SuggestionPriority {
    /// Sort rank: critical=0 .. low=3
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

/// Heuristic confidence in the range 0-100 (not a probability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(u8);

impl Confidence {
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// What a suggestion applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    Plan,
    Block,
    Week,
    Session,
    Exercise,
    Athlete,
}

impl ContextKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Block => "block",
            Self::Week => "week",
            Self::Session => "session",
            Self::Exercise => "exercise",
            Self::Athlete => "athlete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "plan" => Some(Self::Plan),
            "block" => Some(Self::Block),
            "week" => Some(Self::Week),
            "session" => Some(Self::Session),
            "exercise" => Some(Self::Exercise),
            "athlete" => Some(Self::Athlete),
            _ => None,
        }
    }
}

/// Context reference: a kind plus an optional id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRef {
    pub kind: ContextKind,
    pub id: Option<Uuid>,
}

impl ContextRef {
    pub fn plan(id: Uuid) -> Self {
        Self { kind: ContextKind::Plan, id: Some(id) }
    }

    pub fn athlete(id: Uuid) -> Self {
        Self { kind: ContextKind::Athlete, id: Some(id) }
    }

    pub fn exercise(id: Uuid) -> Self {
        Self { kind: ContextKind::Exercise, id: Some(id) }
    }
}

/// Session type proposed when a session is swapped out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Recovery,
}

/// Machine-actionable change attached to a suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Recommendation {
    IncreaseWeight {
        exercise_id: Option<Uuid>,
        exercise_name: String,
        current_load_kg: f64,
        suggested_load_kg: f64,
        rpe_basis: f64,
    },
    InsertDeload {
        min_days: u8,
        max_days: u8,
        volume_reduction_pct: u8,
        intensity_cap_pct: u8,
    },
    ReduceVolume {
        acwr: f64,
        acute_load: f64,
        chronic_avg: f64,
        suggested_reduction_pct: i64,
    },
    IncreaseVolume {
        acwr: f64,
        suggested_increase_pct: i64,
    },
    SwapToRecovery {
        readiness_score: f64,
        suggested_session_type: SessionType,
        volume_reduction_pct: u8,
        intensity_cap_pct: u8,
    },
    ReduceSession {
        readiness_score: f64,
        volume_reduction_pct: u8,
        intensity_cap_pct: u8,
    },
    SimplifyProgram {
        compliance_rate_pct: i64,
        sessions_missed: usize,
        reduce_frequency: bool,
        suggested_sessions_per_week: u8,
    },
    CheckIn {
        compliance_rate_pct: i64,
        sessions_missed: usize,
    },
}

impl Recommendation {
    /// Volume reduction carried by deload and readiness recommendations
    pub fn volume_reduction_pct(&self) -> Option<u8> {
        match self {
            Self::InsertDeload { volume_reduction_pct, .. }
            | Self::SwapToRecovery { volume_reduction_pct, .. }
            | Self::ReduceSession { volume_reduction_pct, .. } => Some(*volume_reduction_pct),
            _ => None,
        }
    }
}

/// An adaptive coaching suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub priority: SuggestionPriority,
    pub title: String,
    pub description: String,
    pub rationale: String,
    pub recommendation: Recommendation,
    pub confidence: Confidence,
    pub context: ContextRef,
}

/// Stable sort by priority; equal priorities keep insertion order
pub fn sort_by_priority(suggestions: &mut [Suggestion]) {
    suggestions.sort_by_key(|suggestion| suggestion.priority.rank());
}

/// Errors raised while producing suggestions or summaries
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("No active coach-athlete relationship between coach {coach_id} and athlete {athlete_id}")]
    NoActiveRelationship { coach_id: Uuid, athlete_id: Uuid },

    #[error("Training data unavailable: {0}")]
    DataSource(#[from] anyhow::Error),

    #[error("Invalid training data: {0}")]
    InvalidData(String),
}

impl AnalysisError {
    /// Authorization failures must reach the caller
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::NoActiveRelationship { .. })
    }
}

/// Fail with [`AnalysisError::NoActiveRelationship`] unless the coach
/// actively coaches the athlete
pub(crate) async fn ensure_relationship(
    repository: &dyn TrainingRepository,
    coach_id: Uuid,
    athlete_id: Uuid,
) -> Result<(), AnalysisError> {
    if repository.has_active_relationship(coach_id, athlete_id).await? {
        Ok(())
    } else {
        Err(AnalysisError::NoActiveRelationship { coach_id, athlete_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(priority: SuggestionPriority, title: &str) -> Suggestion {
        Suggestion {
            kind: SuggestionKind::VolumeCheck,
            priority,
            title: title.to_string(),
            description: String::new(),
            rationale: String::new(),
            recommendation: Recommendation::CheckIn {
                compliance_rate_pct: 0,
                sessions_missed: 0,
            },
            confidence: Confidence::new(50),
            context: ContextRef::plan(Uuid::nil()),
        }
    }

    #[test]
    fn test_sort_by_priority_orders_critical_first() {
        let mut suggestions = vec![
            suggestion(SuggestionPriority::Low, "low"),
            suggestion(SuggestionPriority::Critical, "critical"),
            suggestion(SuggestionPriority::Medium, "medium"),
            suggestion(SuggestionPriority::High, "high"),
        ];

        sort_by_priority(&mut suggestions);

        let priorities: Vec<_> = suggestions.iter().map(|s| s.priority).collect();
        assert_eq!(
            priorities,
            vec![
                SuggestionPriority::Critical,
                SuggestionPriority::High,
                SuggestionPriority::Medium,
                SuggestionPriority::Low,
            ]
        );
    }

    #[test]
    fn test_sort_is_stable_within_priority() {
        let mut suggestions = vec![
            suggestion(SuggestionPriority::Low, "first"),
            suggestion(SuggestionPriority::High, "urgent"),
            suggestion(SuggestionPriority::Low, "second"),
        ];

        sort_by_priority(&mut suggestions);

        let titles: Vec<_> = suggestions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["urgent", "first", "second"]);
    }

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(Confidence::new(140).value(), 100);
        assert_eq!(Confidence::new(85).value(), 85);
    }

    #[test]
    fn test_recommendation_serializes_with_action_tag() {
        let recommendation = Recommendation::InsertDeload {
            min_days: 3,
            max_days: 5,
            volume_reduction_pct: 40,
            intensity_cap_pct: 70,
        };

        let json = serde_json::to_value(&recommendation).unwrap();
        assert_eq!(json["action"], "insert_deload");
        assert_eq!(json["volume_reduction_pct"], 40);
        assert_eq!(recommendation.volume_reduction_pct(), Some(40));
    }

    #[test]
    fn test_authorization_error_detected() {
        let error = AnalysisError::NoActiveRelationship {
            coach_id: Uuid::new_v4(),
            athlete_id: Uuid::new_v4(),
        };
        assert!(error.is_authorization());

        let error = AnalysisError::DataSource(anyhow::anyhow!("connection reset"));
        assert!(!error.is_authorization());
    }
}
