// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Athlete history digest
//!
//! Summarizes recent training for downstream consumers (for example a plan
//! generation step) as a structured [`AthleteHistorySummary`] plus a compact
//! text block.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::metrics::{
    acwr, exercise_frequency, round_to, volume_trend, weekly_volumes, ExerciseFrequency,
    VolumeTrend, WeekKey,
};
use super::{ensure_relationship, AnalysisError};
use crate::config::AnalyticsConfig;
use crate::constants::{limits, thresholds};
use crate::repository::{SessionQuery, TrainingRepository};

const DEFAULT_DISPLAY_NAME: &str = "Athlete";

/// Structured training history of one athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteHistorySummary {
    pub athlete_id: Uuid,
    pub display_name: String,
    pub level: Option<String>,
    pub injury_notes: Option<String>,
    /// Weeks from the first week with a session up to the current week,
    /// leaving the current week out until it holds a session
    pub weeks_analyzed: usize,
    pub weekly_volumes: Vec<(WeekKey, f64)>,
    pub total_volume_load: f64,
    pub avg_weekly_volume: f64,
    pub volume_trend: VolumeTrend,
    pub avg_session_rpe: Option<f64>,
    /// Mean subjective readiness over the trend window
    pub avg_readiness: Option<f64>,
    pub avg_soreness: Option<f64>,
    pub acwr: Option<f64>,
    pub top_exercises: Vec<ExerciseFrequency>,
    pub flags: Vec<String>,
    pub context_text: String,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Builds [`AthleteHistorySummary`] values from repository data
pub struct HistorySummarizer {
    repository: Arc<dyn TrainingRepository>,
    config: AnalyticsConfig,
    clock: Option<DateTime<Utc>>,
}

impl HistorySummarizer {
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

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    /// Summarize the last `weeks_back` weeks (configured default when `None`)
    ///
    /// Requires an active coach-athlete relationship.
    pub async fn athlete_summary(
        &self,
        coach_id: Uuid,
        athlete_id: Uuid,
        weeks_back: Option<u32>,
    ) -> Result<AthleteHistorySummary, AnalysisError> {
        let weeks = weeks_back.unwrap_or(self.config.history.default_weeks);
        if weeks == 0 {
            return Err(AnalysisError::InvalidData(
                "History lookback must cover at least one week".to_string(),
            ));
        }

        ensure_relationship(self.repository.as_ref(), coach_id, athlete_id).await?;

        let now = self.clock.unwrap_or_else(Utc::now);
        let today = now.date_naive();
        let from = now - Duration::weeks(i64::from(weeks));
        let readiness_from = today - Duration::days(limits::READINESS_TREND_DAYS);

        let query = SessionQuery::new().athlete(athlete_id).since(from);
        let (profile, sessions, readiness) = tokio::join!(
            self.repository.athlete_profile(athlete_id),
            self.repository.completed_sessions(&query),
            self.repository.readiness_since(athlete_id, readiness_from),
        );
        let profile = profile?.unwrap_or_default();
        let sessions = sessions?;
        let readiness = readiness?;

        let weekly = weekly_volumes(&sessions, from.date_naive(), today);
        let current_week = WeekKey::from_date(today);
        let mut series = weekly.since_first_session();
        // An in-progress week with nothing logged yet is not a zero-volume week
        if weekly.sessions_in(&current_week) == 0 {
            series.retain(|(week, _)| *week != current_week);
        }
        let values: Vec<f64> = series.iter().map(|(_, volume)| *volume).collect();

        let total_volume_load: f64 = values.iter().sum();
        let avg_weekly_volume = mean(&values).map(f64::round).unwrap_or(0.0);
        let trend = volume_trend(&values);

        // The current week is still in progress and would understate acute load
        let complete_weeks: Vec<f64> = series
            .iter()
            .filter(|(week, _)| *week < current_week)
            .map(|(_, volume)| *volume)
            .collect();
        let acwr = acwr(&complete_weeks).map(|ratio| round_to(ratio, 2));

        let rpe_values: Vec<f64> = sessions.iter().filter_map(|s| s.overall_rpe).collect();
        let avg_session_rpe = mean(&rpe_values).map(|value| round_to(value, 1));

        let scores: Vec<f64> = readiness.iter().filter_map(|e| e.subjective_score).collect();
        let avg_readiness = mean(&scores).map(|value| round_to(value, 1));

        let soreness: Vec<f64> = readiness
            .iter()
            .filter_map(|e| e.muscle_soreness.map(f64::from))
            .collect();
        let avg_soreness = mean(&soreness);

        let mut summary = AthleteHistorySummary {
            athlete_id,
            display_name: profile
                .display_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
            level: profile.competition_level,
            injury_notes: profile.injury_notes,
            weeks_analyzed: series.len(),
            weekly_volumes: series,
            total_volume_load: total_volume_load.round(),
            avg_weekly_volume,
            volume_trend: trend,
            avg_session_rpe,
            avg_readiness,
            avg_soreness,
            acwr,
            top_exercises: exercise_frequency(&sessions),
            flags: Vec::new(),
            context_text: String::new(),
        };
        summary.flags = history_flags(&summary);
        summary.context_text = build_context_text(&summary);

        Ok(summary)
    }
}

/// Qualitative warnings raised by the summary metrics
pub fn history_flags(summary: &AthleteHistorySummary) -> Vec<String> {
    let mut flags = Vec::new();

    if let Some(acwr) = summary.acwr {
        if acwr > thresholds::ACWR_HIGH_RISK {
            flags.push(format!("High ACWR ({acwr}): injury risk"));
        }
        if acwr < thresholds::ACWR_LOW_RISK && acwr > 0.0 {
            flags.push(format!("Low ACWR ({acwr}): possible detraining"));
        }
    }
    if let Some(rpe) = summary.avg_session_rpe.filter(|rpe| *rpe >= thresholds::HIGH_AVG_RPE) {
        flags.push(format!("High avg RPE ({rpe}): possible overreaching"));
    }
    if let Some(readiness) = summary
        .avg_readiness
        .filter(|r| *r > 0.0 && *r <= thresholds::LOW_AVG_READINESS)
    {
        flags.push(format!("Low readiness trend ({readiness}/10)"));
    }
    if summary.volume_trend == VolumeTrend::Decreasing {
        flags.push("Volume trend: decreasing".to_string());
    }
    if let Some(soreness) = summary
        .avg_soreness
        .filter(|s| *s >= thresholds::HIGH_AVG_SORENESS)
    {
        flags.push(format!("Elevated soreness (avg {soreness:.1}/5)"));
    }

    flags
}

/// Render the digest, one labelled line per available value
pub fn build_context_text(summary: &AthleteHistorySummary) -> String {
    let mut lines = vec![format!("Athlete: {}", summary.display_name)];

    if let Some(level) = summary.level.as_deref().filter(|l| !l.is_empty()) {
        lines.push(format!("Level: {level}"));
    }
    if let Some(notes) = summary.injury_notes.as_deref().filter(|n| !n.is_empty()) {
        lines.push(format!("Injuries/Notes: {notes}"));
    }
    lines.push(format!(
        "Training data: {} weeks analyzed",
        summary.weeks_analyzed
    ));
    lines.push(format!(
        "Avg weekly volume: {:.1} tonnes ({})",
        summary.avg_weekly_volume / 1000.0,
        summary.volume_trend
    ));
    if let Some(rpe) = summary.avg_session_rpe {
        lines.push(format!("Avg session RPE: {rpe}/10"));
    }
    if let Some(readiness) = summary.avg_readiness {
        lines.push(format!("Recent readiness: {readiness}/10"));
    }
    if let Some(acwr) = summary.acwr {
        lines.push(format!("ACWR: {acwr}"));
    }

    if !summary.top_exercises.is_empty() {
        let exercises: Vec<String> = summary
            .top_exercises
            .iter()
            .take(limits::TOP_EXERCISES_IN_DIGEST)
            .map(|exercise| match exercise.best_load_kg {
                Some(best) => format!("{} (best: {best}kg)", exercise.name),
                None => exercise.name.clone(),
            })
            .collect();
        lines.push(format!("Top exercises: {}", exercises.join(", ")));
    }

    if !summary.flags.is_empty() {
        lines.push(format!("Flags: {}", summary.flags.join("; ")));
    }

    lines.join("\n")
}
