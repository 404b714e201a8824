// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Rule classifiers turning aggregated training metrics into suggestions
//!
//! Every function here is pure: it receives already-fetched data and
//! returns zero or more [`Suggestion`]s. Thresholds come from
//! [`crate::constants::thresholds`].

use std::collections::HashSet;

use chrono::NaiveDate;
use uuid::Uuid;

use super::metrics::{parse_leading_int, round_to, AcwrReading};
use super::{
    Confidence, ContextRef, Recommendation, SessionType, Suggestion, SuggestionKind,
    SuggestionPriority,
};
use crate::constants::{confidence, thresholds};
use crate::models::{
    AssignmentStatus, CompletedSession, ExerciseOutcome, PrescribedExercise, ReadinessEntry,
    ScheduledSession,
};

fn progression_confidence(rpe: f64) -> Confidence {
    if rpe <= thresholds::EASY_RPE {
        Confidence::new(confidence::PROGRESSION_EASY)
    } else {
        Confidence::new(confidence::PROGRESSION_MODERATE)
    }
}

fn leading_int(text: Option<&str>) -> i64 {
    text.and_then(parse_leading_int).unwrap_or(0)
}

/// Progressive overload over the most recent plan sessions
///
/// `sessions` must be ordered newest first. Only the most recent result of
/// each exercise is judged: it must meet the prescribed load and reps at a
/// reported RPE of 7.5 or less.
pub fn aggregate_overload(sessions: &[CompletedSession]) -> Vec<Suggestion> {
    let mut seen = HashSet::new();
    let mut suggestions = Vec::new();

    for outcome in sessions.iter().flat_map(|session| &session.outcomes) {
        if !seen.insert(outcome.exercise_id) {
            continue;
        }
        if let Some(suggestion) = overload_for_outcome(outcome) {
            suggestions.push(suggestion);
        }
    }

    suggestions
}

fn overload_for_outcome(outcome: &ExerciseOutcome) -> Option<Suggestion> {
    let name = outcome.exercise_name.as_deref()?;
    let prescription = outcome.prescription.as_ref()?;

    let prescribed_load = prescription.load_kg.unwrap_or(0.0);
    let actual_load = outcome.load_kg.unwrap_or(0.0);
    let prescribed_reps = leading_int(prescription.reps.as_deref());
    let actual_reps = leading_int(outcome.reps_completed.as_deref());
    let rpe = outcome.rpe.filter(|rpe| *rpe > 0.0)?;

    if prescribed_load <= 0.0
        || actual_load < prescribed_load
        || actual_reps < prescribed_reps
        || rpe > thresholds::OVERLOAD_MAX_RPE
    {
        return None;
    }

    let increment = round_to(prescribed_load * thresholds::OVERLOAD_INCREMENT, 1);
    let increment_pct = thresholds::OVERLOAD_INCREMENT * 100.0;

    Some(Suggestion {
        kind: SuggestionKind::ProgressiveOverload,
        priority: SuggestionPriority::Low,
        title: format!("Increase {name}"),
        description: format!(
            "{name}: completed at RPE {rpe}. Consider +{increment}kg ({increment_pct}%)."
        ),
        rationale: format!(
            "Athlete completed {actual_reps} reps x {actual_load}kg at RPE {rpe}, indicating room for progression."
        ),
        recommendation: Recommendation::IncreaseWeight {
            exercise_id: Some(outcome.exercise_id),
            exercise_name: name.to_string(),
            current_load_kg: prescribed_load,
            suggested_load_kg: round_to(prescribed_load + increment, 1),
            rpe_basis: rpe,
        },
        confidence: progression_confidence(rpe),
        context: ContextRef::exercise(outcome.exercise_id),
    })
}

/// Progression for one exercise of an upcoming session
///
/// Triggers when the latest result reached the prescribed load at RPE 7 or
/// less. Lighter lifts (40kg or less) progress by 1.25kg, heavier by 2.5kg.
pub fn exercise_progression(
    exercise: &PrescribedExercise,
    latest: Option<&ExerciseOutcome>,
) -> Option<Suggestion> {
    let latest = latest?;
    let last_rpe = latest.rpe.unwrap_or(0.0);
    let last_load = latest.load_kg.unwrap_or(0.0);
    let prescribed_load = exercise.load_kg.unwrap_or(0.0);

    if last_rpe <= 0.0
        || last_rpe > thresholds::PROGRESSION_MAX_RPE
        || prescribed_load <= 0.0
        || last_load < prescribed_load
    {
        return None;
    }

    let increment = if prescribed_load <= thresholds::PROGRESSION_LIGHT_LOAD_KG {
        thresholds::PROGRESSION_SMALL_STEP_KG
    } else {
        thresholds::PROGRESSION_LARGE_STEP_KG
    };
    let suggested = prescribed_load + increment;

    Some(Suggestion {
        kind: SuggestionKind::ProgressiveOverload,
        priority: SuggestionPriority::Low,
        title: format!("Progress {}", exercise.name),
        description: format!(
            "Last session: {last_load}kg x RPE {last_rpe}. Suggest {suggested}kg (+{increment}kg)."
        ),
        rationale: format!(
            "Based on previous performance at RPE {last_rpe}, there is room for progressive overload."
        ),
        recommendation: Recommendation::IncreaseWeight {
            exercise_id: Some(exercise.id),
            exercise_name: exercise.name.clone(),
            current_load_kg: prescribed_load,
            suggested_load_kg: suggested,
            rpe_basis: last_rpe,
        },
        confidence: progression_confidence(last_rpe),
        context: ContextRef::exercise(exercise.id),
    })
}

/// Session RPE paired with the target of the workout it belonged to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RpeObservation {
    pub actual_rpe: f64,
    /// `None` falls back to the default target of 7
    pub target_rpe: Option<f64>,
}

impl RpeObservation {
    pub fn is_overreaching(&self) -> bool {
        let target = self.target_rpe.unwrap_or(thresholds::DEFAULT_TARGET_RPE);
        self.actual_rpe > target + thresholds::RPE_OVERREACH_MARGIN
    }
}

/// Length of the overreaching streak, walking newest to oldest
///
/// The walk stops at the first session that did not overreach, so an
/// earlier streak behind a normal session is not counted.
pub fn overreach_streak(observations: &[RpeObservation]) -> usize {
    observations
        .iter()
        .take_while(|observation| observation.is_overreaching())
        .count()
}

/// Deload when two or more consecutive recent sessions overreached
///
/// `observations` must be ordered newest first.
pub fn rpe_overreach(observations: &[RpeObservation], plan_id: Uuid) -> Option<Suggestion> {
    let streak = overreach_streak(observations);
    if streak < thresholds::RPE_OVERREACH_STREAK {
        return None;
    }

    let margin = thresholds::RPE_OVERREACH_MARGIN;
    let level = if streak >= thresholds::RPE_OVERREACH_STRONG_STREAK {
        confidence::DELOAD_STRONG_STREAK
    } else {
        confidence::DELOAD_STREAK
    };

    Some(Suggestion {
        kind: SuggestionKind::DeloadRecommended,
        priority: SuggestionPriority::High,
        title: "Deload recommended".to_string(),
        description: format!(
            "{streak} consecutive sessions exceeded target RPE by {margin}+. Consider a deload or reduced volume week."
        ),
        rationale: format!(
            "Sustained overreaching detected. Session RPE has been {margin}+ points above prescribed targets for {streak} sessions, indicating accumulated fatigue."
        ),
        recommendation: Recommendation::InsertDeload {
            min_days: 3,
            max_days: 5,
            volume_reduction_pct: 40,
            intensity_cap_pct: 70,
        },
        confidence: Confidence::new(level),
        context: ContextRef::plan(plan_id),
    })
}

/// Workload spike (deload) or undertraining (volume check) from ACWR
pub fn acwr_risk(reading: Option<AcwrReading>, plan_id: Uuid) -> Option<Suggestion> {
    let AcwrReading { ratio, acute, chronic } = reading?;
    let ratio_text = format!("{ratio:.2}");

    if ratio > thresholds::ACWR_HIGH_RISK {
        let high = thresholds::ACWR_HIGH_RISK;
        return Some(Suggestion {
            kind: SuggestionKind::DeloadRecommended,
            priority: SuggestionPriority::High,
            title: "High workload spike detected".to_string(),
            description: format!(
                "ACWR is {ratio_text} (threshold: {high}). This week's load is significantly higher than the 4-week average."
            ),
            rationale: format!(
                "Acute:Chronic Workload Ratio of {ratio_text} exceeds the {high} threshold, which is associated with increased injury risk. Acute load: {}kg, chronic avg: {}kg.",
                acute.round(),
                chronic.round()
            ),
            recommendation: Recommendation::ReduceVolume {
                acwr: round_to(ratio, 2),
                acute_load: acute.round(),
                chronic_avg: chronic.round(),
                suggested_reduction_pct: ((1.0 - high / ratio) * 100.0).round() as i64,
            },
            confidence: Confidence::new(confidence::ACWR_SPIKE),
            context: ContextRef::plan(plan_id),
        });
    }

    if ratio < thresholds::ACWR_LOW_RISK && acute > 0.0 {
        let low = thresholds::ACWR_LOW_RISK;
        return Some(Suggestion {
            kind: SuggestionKind::VolumeCheck,
            priority: SuggestionPriority::Low,
            title: "Training volume may be too low".to_string(),
            description: format!(
                "ACWR is {ratio_text} (below {low}). Current training load may be insufficient for adaptation."
            ),
            rationale: format!(
                "Acute:Chronic Workload Ratio of {ratio_text} is below the optimal range. This may indicate detraining risk."
            ),
            recommendation: Recommendation::IncreaseVolume {
                acwr: round_to(ratio, 2),
                suggested_increase_pct: ((low / ratio - 1.0) * 100.0).round() as i64,
            },
            confidence: Confidence::new(confidence::ACWR_LOW),
            context: ContextRef::plan(plan_id),
        });
    }

    None
}

/// Rationale listing only the readiness components that crossed their limits
pub fn readiness_rationale(entry: &ReadinessEntry) -> String {
    let mut factors = Vec::new();

    if let Some(quality) = entry.sleep_quality.filter(|q| *q > 0 && *q <= thresholds::POOR_SLEEP_QUALITY) {
        factors.push(format!("poor sleep quality ({quality}/5)"));
    }
    if let Some(hours) = entry.sleep_hours.filter(|h| *h > 0.0 && *h < thresholds::SHORT_SLEEP_HOURS) {
        factors.push(format!("only {hours}h sleep"));
    }
    if let Some(soreness) = entry.muscle_soreness.filter(|s| *s >= thresholds::HIGH_SORENESS) {
        factors.push(format!("high soreness ({soreness}/5)"));
    }
    if let Some(energy) = entry.energy_level.filter(|e| *e > 0 && *e <= thresholds::LOW_ENERGY) {
        factors.push(format!("low energy ({energy}/5)"));
    }
    if let Some(stress) = entry.stress_level.filter(|s| *s >= thresholds::HIGH_STRESS) {
        factors.push(format!("high stress ({stress}/5)"));
    }

    let score = entry
        .subjective_score
        .map(|score| score.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let base = format!("Overall readiness score: {score}/10.");

    if factors.is_empty() {
        format!("{base} Athlete self-reported low readiness today.")
    } else {
        format!("{base} Contributing factors: {}.", factors.join(", "))
    }
}

/// Modify today's session when the readiness check-in is low
pub fn readiness_adjustment(entry: Option<&ReadinessEntry>, athlete_id: Uuid) -> Option<Suggestion> {
    let entry = entry?;
    let score = entry.subjective_score.filter(|score| *score > 0.0)?;

    if score <= thresholds::READINESS_VERY_LOW {
        return Some(Suggestion {
            kind: SuggestionKind::ReadinessAdjustment,
            priority: SuggestionPriority::Critical,
            title: "Very low readiness: modify session".to_string(),
            description: format!(
                "Readiness score: {score}/10. Consider replacing with a recovery/mobility session or a rest day."
            ),
            rationale: readiness_rationale(entry),
            recommendation: Recommendation::SwapToRecovery {
                readiness_score: score,
                suggested_session_type: SessionType::Recovery,
                volume_reduction_pct: 60,
                intensity_cap_pct: 50,
            },
            confidence: Confidence::new(confidence::READINESS_VERY_LOW),
            context: ContextRef::athlete(athlete_id),
        });
    }

    if score <= thresholds::READINESS_LOW {
        let volume_reduction_pct = 25;
        return Some(Suggestion {
            kind: SuggestionKind::ReadinessAdjustment,
            priority: SuggestionPriority::Medium,
            title: "Low readiness: reduce intensity".to_string(),
            description: format!(
                "Readiness score: {score}/10. Suggest reducing volume by {volume_reduction_pct}% and capping intensity."
            ),
            rationale: readiness_rationale(entry),
            recommendation: Recommendation::ReduceSession {
                readiness_score: score,
                volume_reduction_pct,
                intensity_cap_pct: 75,
            },
            confidence: Confidence::new(confidence::READINESS_LOW),
            context: ContextRef::athlete(athlete_id),
        });
    }

    None
}

/// Assignment counts for one athlete and plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplianceStats {
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub pending: usize,
    /// Pending assignments scheduled strictly before today
    pub overdue: usize,
}

impl ComplianceStats {
    pub fn from_assignments(assignments: &[ScheduledSession], today: NaiveDate) -> Self {
        let mut stats = Self {
            total: assignments.len(),
            ..Self::default()
        };

        for assignment in assignments {
            match assignment.status {
                AssignmentStatus::Completed => stats.completed += 1,
                AssignmentStatus::Skipped => stats.skipped += 1,
                AssignmentStatus::Pending => {
                    stats.pending += 1;
                    if assignment.scheduled_date < today {
                        stats.overdue += 1;
                    }
                }
            }
        }

        stats
    }

    /// Completed over total; `None` without assignments
    pub fn rate(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.completed as f64 / self.total as f64)
        }
    }

    /// Skipped plus overdue
    pub fn missed(&self) -> usize {
        self.skipped + self.overdue
    }
}

/// At most one compliance alert; critical wins over warning
pub fn compliance_alert(stats: &ComplianceStats, athlete_id: Uuid) -> Option<Suggestion> {
    if stats.total < thresholds::COMPLIANCE_MIN_ASSIGNMENTS {
        return None;
    }
    let rate = stats.rate()?;
    let rate_pct = (rate * 100.0).round() as i64;
    let missed = stats.missed();

    if rate < thresholds::COMPLIANCE_CRITICAL {
        return Some(Suggestion {
            kind: SuggestionKind::ComplianceAlert,
            priority: SuggestionPriority::Critical,
            title: "Very low compliance".to_string(),
            description: format!(
                "Only {rate_pct}% of sessions completed. {missed} sessions missed/overdue. Consider simplifying the program."
            ),
            rationale: format!(
                "Athlete has completed {} of {} assigned sessions ({rate_pct}%). {} skipped, {} overdue. The program may be too demanding or not well suited.",
                stats.completed, stats.total, stats.skipped, stats.overdue
            ),
            recommendation: Recommendation::SimplifyProgram {
                compliance_rate_pct: rate_pct,
                sessions_missed: missed,
                reduce_frequency: true,
                suggested_sessions_per_week: 3,
            },
            confidence: Confidence::new(confidence::COMPLIANCE_CRITICAL),
            context: ContextRef::athlete(athlete_id),
        });
    }

    if rate < thresholds::COMPLIANCE_WARNING {
        let warning_pct = (thresholds::COMPLIANCE_WARNING * 100.0).round();
        return Some(Suggestion {
            kind: SuggestionKind::ComplianceAlert,
            priority: SuggestionPriority::Medium,
            title: "Low compliance: check in with athlete".to_string(),
            description: format!("{rate_pct}% compliance. {missed} sessions missed recently."),
            rationale: format!(
                "Compliance has dropped below the {warning_pct}% threshold. A check-in may help identify barriers such as schedule, motivation or difficulty."
            ),
            recommendation: Recommendation::CheckIn {
                compliance_rate_pct: rate_pct,
                sessions_missed: missed,
            },
            confidence: Confidence::new(confidence::COMPLIANCE_WARNING),
            context: ContextRef::athlete(athlete_id),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Prescription;
    use chrono::Utc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
    }

    fn observation(actual: f64, target: f64) -> RpeObservation {
        RpeObservation {
            actual_rpe: actual,
            target_rpe: Some(target),
        }
    }

    fn assignments(total: usize, completed: usize) -> Vec<ScheduledSession> {
        (0..total)
            .map(|i| ScheduledSession {
                id: Uuid::new_v4(),
                athlete_id: Uuid::nil(),
                coach_id: Uuid::nil(),
                plan_id: None,
                workout_id: Uuid::new_v4(),
                scheduled_date: today() - chrono::Duration::days(i as i64 + 1),
                status: if i < completed {
                    AssignmentStatus::Completed
                } else {
                    AssignmentStatus::Skipped
                },
            })
            .collect()
    }

    fn readiness(score: f64) -> ReadinessEntry {
        ReadinessEntry::with_score(Uuid::nil(), today(), score)
    }

    fn graded_outcome(load: f64, reps: &str, rpe: f64, prescribed: f64) -> ExerciseOutcome {
        let mut outcome = ExerciseOutcome::new(Uuid::new_v4(), Some(3), Some(reps), Some(load));
        outcome.exercise_name = Some("Back Squat".to_string());
        outcome.rpe = Some(rpe);
        outcome.prescription = Some(Prescription {
            sets: Some(3),
            reps: Some("5".to_string()),
            load_kg: Some(prescribed),
        });
        outcome
    }

    fn session(outcomes: Vec<ExerciseOutcome>) -> CompletedSession {
        CompletedSession {
            id: Uuid::new_v4(),
            athlete_id: Uuid::nil(),
            assignment_id: None,
            workout_id: None,
            plan_id: None,
            completed_at: Utc::now(),
            overall_rpe: None,
            duration_minutes: None,
            outcomes,
        }
    }

    #[test]
    fn test_overreach_streak_of_three_gives_high_confidence() {
        let observations = vec![
            observation(9.5, 7.0),
            observation(9.5, 7.0),
            observation(9.5, 7.0),
            observation(6.0, 7.0),
        ];

        let suggestion = rpe_overreach(&observations, Uuid::nil()).unwrap();
        assert_eq!(suggestion.kind, SuggestionKind::DeloadRecommended);
        assert_eq!(suggestion.priority, SuggestionPriority::High);
        assert_eq!(suggestion.confidence.value(), 90);
    }

    #[test]
    fn test_overreach_streak_of_two_gives_base_confidence() {
        let observations = vec![observation(9.0, 7.0), observation(8.6, 7.0)];
        let suggestion = rpe_overreach(&observations, Uuid::nil()).unwrap();
        assert_eq!(suggestion.confidence.value(), 75);
    }

    #[test]
    fn test_overreach_walk_stops_at_first_normal_session() {
        // An older streak behind a normal session is not counted
        let observations = vec![
            observation(9.5, 7.0),
            observation(7.0, 7.0),
            observation(9.5, 7.0),
            observation(9.5, 7.0),
        ];
        assert_eq!(overreach_streak(&observations), 1);
        assert!(rpe_overreach(&observations, Uuid::nil()).is_none());
    }

    #[test]
    fn test_overreach_margin_is_strict() {
        // 8.5 is exactly target + 1.5 and does not overreach
        assert!(!observation(8.5, 7.0).is_overreaching());
        let default_target = RpeObservation { actual_rpe: 8.6, target_rpe: None };
        assert!(default_target.is_overreaching());
    }

    #[test]
    fn test_readiness_very_low_is_critical() {
        let suggestion = readiness_adjustment(Some(&readiness(2.0)), Uuid::nil()).unwrap();
        assert_eq!(suggestion.priority, SuggestionPriority::Critical);
        assert_eq!(suggestion.recommendation.volume_reduction_pct(), Some(60));
        assert_eq!(suggestion.confidence.value(), 90);
    }

    #[test]
    fn test_readiness_low_is_medium() {
        let suggestion = readiness_adjustment(Some(&readiness(4.0)), Uuid::nil()).unwrap();
        assert_eq!(suggestion.priority, SuggestionPriority::Medium);
        assert_eq!(suggestion.recommendation.volume_reduction_pct(), Some(25));
        assert_eq!(suggestion.confidence.value(), 75);
    }

    #[test]
    fn test_readiness_boundary_three_is_critical() {
        let suggestion = readiness_adjustment(Some(&readiness(3.0)), Uuid::nil()).unwrap();
        assert_eq!(suggestion.priority, SuggestionPriority::Critical);

        let suggestion = readiness_adjustment(Some(&readiness(3.5)), Uuid::nil()).unwrap();
        assert_eq!(suggestion.priority, SuggestionPriority::Medium);
    }

    #[test]
    fn test_readiness_good_or_missing_gives_nothing() {
        assert!(readiness_adjustment(Some(&readiness(8.0)), Uuid::nil()).is_none());
        assert!(readiness_adjustment(None, Uuid::nil()).is_none());

        let mut no_score = readiness(1.0);
        no_score.subjective_score = None;
        assert!(readiness_adjustment(Some(&no_score), Uuid::nil()).is_none());
    }

    #[test]
    fn test_readiness_rationale_lists_contributing_factors() {
        let mut entry = readiness(3.0);
        entry.sleep_quality = Some(2);
        entry.sleep_hours = Some(5.5);
        entry.muscle_soreness = Some(3);
        entry.stress_level = Some(5);

        let rationale = readiness_rationale(&entry);
        assert_eq!(
            rationale,
            "Overall readiness score: 3/10. Contributing factors: poor sleep quality (2/5), only 5.5h sleep, high stress (5/5)."
        );
    }

    #[test]
    fn test_readiness_rationale_falls_back_to_generic() {
        let rationale = readiness_rationale(&readiness(4.0));
        assert_eq!(
            rationale,
            "Overall readiness score: 4/10. Athlete self-reported low readiness today."
        );
    }

    #[test]
    fn test_compliance_critical() {
        let stats = ComplianceStats::from_assignments(&assignments(10, 4), today());
        let suggestion = compliance_alert(&stats, Uuid::nil()).unwrap();
        assert_eq!(suggestion.priority, SuggestionPriority::Critical);
        assert_eq!(
            suggestion.recommendation,
            Recommendation::SimplifyProgram {
                compliance_rate_pct: 40,
                sessions_missed: 6,
                reduce_frequency: true,
                suggested_sessions_per_week: 3,
            }
        );
    }

    #[test]
    fn test_compliance_warning() {
        let stats = ComplianceStats::from_assignments(&assignments(10, 6), today());
        let suggestion = compliance_alert(&stats, Uuid::nil()).unwrap();
        assert_eq!(suggestion.priority, SuggestionPriority::Medium);
        assert_eq!(suggestion.confidence.value(), 70);
    }

    #[test]
    fn test_compliance_good_or_too_few_assignments() {
        let stats = ComplianceStats::from_assignments(&assignments(10, 8), today());
        assert!(compliance_alert(&stats, Uuid::nil()).is_none());

        let stats = ComplianceStats::from_assignments(&assignments(2, 0), today());
        assert!(compliance_alert(&stats, Uuid::nil()).is_none());

        let stats = ComplianceStats::default();
        assert_eq!(stats.rate(), None);
    }

    #[test]
    fn test_compliance_overdue_counts_only_past_pending() {
        let mut list = assignments(3, 0);
        list[0].status = AssignmentStatus::Pending;
        list[0].scheduled_date = today();
        list[1].status = AssignmentStatus::Pending;

        let stats = ComplianceStats::from_assignments(&list, today());
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.missed(), 2);
    }

    #[test]
    fn test_acwr_spike_and_low() {
        let spike = AcwrReading { ratio: 1.6, acute: 200.0, chronic: 125.0 };
        let suggestion = acwr_risk(Some(spike), Uuid::nil()).unwrap();
        assert_eq!(suggestion.kind, SuggestionKind::DeloadRecommended);
        assert_eq!(suggestion.confidence.value(), 80);
        if let Recommendation::ReduceVolume { suggested_reduction_pct, .. } = suggestion.recommendation {
            assert_eq!(suggested_reduction_pct, 19);
        } else {
            panic!("expected reduce_volume");
        }

        let low = AcwrReading { ratio: 0.5, acute: 50.0, chronic: 100.0 };
        let suggestion = acwr_risk(Some(low), Uuid::nil()).unwrap();
        assert_eq!(suggestion.kind, SuggestionKind::VolumeCheck);
        assert_eq!(suggestion.priority, SuggestionPriority::Low);
        assert_eq!(suggestion.confidence.value(), 65);
    }

    #[test]
    fn test_acwr_zero_acute_or_optimal_gives_nothing() {
        let idle = AcwrReading { ratio: 0.0, acute: 0.0, chronic: 100.0 };
        assert!(acwr_risk(Some(idle), Uuid::nil()).is_none());

        let optimal = AcwrReading { ratio: 1.0, acute: 100.0, chronic: 100.0 };
        assert!(acwr_risk(Some(optimal), Uuid::nil()).is_none());
        assert!(acwr_risk(None, Uuid::nil()).is_none());
    }

    #[test]
    fn test_aggregate_overload_suggests_two_and_a_half_percent() {
        let sessions = vec![session(vec![graded_outcome(100.0, "5", 6.0, 100.0)])];

        let suggestions = aggregate_overload(&sessions);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].confidence.value(), 85);
        match &suggestions[0].recommendation {
            Recommendation::IncreaseWeight { suggested_load_kg, current_load_kg, .. } => {
                assert_eq!(*current_load_kg, 100.0);
                assert_eq!(*suggested_load_kg, 102.5);
            }
            other => panic!("unexpected recommendation {other:?}"),
        }
    }

    #[test]
    fn test_aggregate_overload_uses_most_recent_result_per_exercise() {
        let recent = graded_outcome(100.0, "5", 9.0, 100.0);
        let mut older = graded_outcome(100.0, "5", 6.0, 100.0);
        older.exercise_id = recent.exercise_id;

        let sessions = vec![session(vec![recent]), session(vec![older])];
        assert!(aggregate_overload(&sessions).is_empty());
    }

    #[test]
    fn test_aggregate_overload_requires_prescribed_reps() {
        let sessions = vec![session(vec![graded_outcome(100.0, "4", 7.0, 100.0)])];
        assert!(aggregate_overload(&sessions).is_empty());

        let sessions = vec![session(vec![graded_outcome(100.0, "5", 7.5, 100.0)])];
        assert_eq!(aggregate_overload(&sessions)[0].confidence.value(), 70);
    }

    #[test]
    fn test_aggregate_overload_skips_bodyweight_prescriptions() {
        let sessions = vec![session(vec![graded_outcome(0.0, "12", 6.0, 0.0)])];
        assert!(aggregate_overload(&sessions).is_empty());

        let mut unloaded = graded_outcome(0.0, "12", 6.0, 0.0);
        if let Some(prescription) = unloaded.prescription.as_mut() {
            prescription.load_kg = None;
        }
        assert!(aggregate_overload(&[session(vec![unloaded])]).is_empty());
    }

    #[test]
    fn test_exercise_progression_increments() {
        let mut exercise = PrescribedExercise {
            id: Uuid::new_v4(),
            workout_id: Uuid::new_v4(),
            name: "Overhead Press".to_string(),
            sets: Some(3),
            reps: Some("8".to_string()),
            load_kg: Some(40.0),
            target_rpe: None,
            order_index: 0,
        };
        let mut latest = ExerciseOutcome::new(exercise.id, Some(3), Some("8"), Some(40.0));
        latest.rpe = Some(7.0);

        let suggestion = exercise_progression(&exercise, Some(&latest)).unwrap();
        assert_eq!(suggestion.confidence.value(), 70);
        match suggestion.recommendation {
            Recommendation::IncreaseWeight { suggested_load_kg, .. } => assert_eq!(suggested_load_kg, 41.25),
            other => panic!("unexpected recommendation {other:?}"),
        }

        exercise.load_kg = Some(60.0);
        latest.load_kg = Some(62.5);
        latest.rpe = Some(6.0);
        let suggestion = exercise_progression(&exercise, Some(&latest)).unwrap();
        assert_eq!(suggestion.confidence.value(), 85);
        match suggestion.recommendation {
            Recommendation::IncreaseWeight { suggested_load_kg, .. } => assert_eq!(suggested_load_kg, 62.5),
            other => panic!("unexpected recommendation {other:?}"),
        }
    }

    #[test]
    fn test_exercise_progression_skips_hard_or_light_results() {
        let exercise = PrescribedExercise {
            id: Uuid::new_v4(),
            workout_id: Uuid::new_v4(),
            name: "Row".to_string(),
            sets: Some(3),
            reps: Some("10".to_string()),
            load_kg: Some(50.0),
            target_rpe: None,
            order_index: 0,
        };
        let mut latest = ExerciseOutcome::new(exercise.id, Some(3), Some("10"), Some(50.0));
        latest.rpe = Some(7.5);
        assert!(exercise_progression(&exercise, Some(&latest)).is_none());

        latest.rpe = Some(6.0);
        latest.load_kg = Some(47.5);
        assert!(exercise_progression(&exercise, Some(&latest)).is_none());

        assert!(exercise_progression(&exercise, None).is_none());
    }
}
