// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Constants Module
//!
//! Fixed classifier thresholds and environment-based defaults.
//! Thresholds are compile-time constants; they are not configurable at runtime.

/// Evidence-informed thresholds used by the classifiers
pub mod thresholds {
    /// Acute:chronic ratio above which a week is a dangerous spike
    pub const ACWR_HIGH_RISK: f64 = 1.3;
    /// Acute:chronic ratio below which the athlete may be detraining
    pub const ACWR_LOW_RISK: f64 = 0.8;
    /// Weeks with recorded volume needed for a chronic average
    pub const ACWR_CHRONIC_WEEKS: usize = 4;

    /// Session RPE above target by more than this counts as overreaching
    pub const RPE_OVERREACH_MARGIN: f64 = 1.5;
    /// Consecutive overreaching sessions that trigger a deload
    pub const RPE_OVERREACH_STREAK: usize = 2;
    /// Streak length at which the deload confidence is raised
    pub const RPE_OVERREACH_STRONG_STREAK: usize = 3;
    /// Target RPE assumed when a workout has none
    pub const DEFAULT_TARGET_RPE: f64 = 7.0;

    /// Readiness at or below this modifies the session
    pub const READINESS_LOW: f64 = 4.0;
    /// Readiness at or below this swaps to recovery
    pub const READINESS_VERY_LOW: f64 = 3.0;

    /// Completion rate below this triggers a check-in
    pub const COMPLIANCE_WARNING: f64 = 0.7;
    /// Completion rate below this triggers a program simplification
    pub const COMPLIANCE_CRITICAL: f64 = 0.5;
    /// Assignments needed before compliance is judged
    pub const COMPLIANCE_MIN_ASSIGNMENTS: usize = 3;

    /// Aggregate overload: RPE at or below which progression is suggested
    pub const OVERLOAD_MAX_RPE: f64 = 7.5;
    /// Aggregate overload: relative load increment (2.5%)
    pub const OVERLOAD_INCREMENT: f64 = 0.025;
    /// Per-exercise progression: RPE at or below which progression is suggested
    pub const PROGRESSION_MAX_RPE: f64 = 7.0;
    /// Per-exercise progression: loads up to this use the small step
    pub const PROGRESSION_LIGHT_LOAD_KG: f64 = 40.0;
    pub const PROGRESSION_SMALL_STEP_KG: f64 = 1.25;
    pub const PROGRESSION_LARGE_STEP_KG: f64 = 2.5;
    /// RPE at or below which progression confidence is high
    pub const EASY_RPE: f64 = 6.0;

    /// History flags
    pub const HIGH_AVG_RPE: f64 = 8.5;
    pub const LOW_AVG_READINESS: f64 = 4.0;
    pub const HIGH_AVG_SORENESS: f64 = 3.5;

    /// Volume trend: relative change (percent) separating stable from moving
    pub const VOLUME_TREND_CHANGE_PCT: f64 = 10.0;
    /// Volume trend: weekly points required before a trend is claimed
    pub const VOLUME_TREND_MIN_POINTS: usize = 4;

    /// Readiness rationale sub-thresholds (component scales are 1-5)
    pub const POOR_SLEEP_QUALITY: u8 = 2;
    pub const SHORT_SLEEP_HOURS: f64 = 6.0;
    pub const HIGH_SORENESS: u8 = 4;
    pub const LOW_ENERGY: u8 = 2;
    pub const HIGH_STRESS: u8 = 4;
}

/// Confidence tiers reported by each classifier
pub mod confidence {
    pub const PROGRESSION_EASY: u8 = 85;
    pub const PROGRESSION_MODERATE: u8 = 70;
    pub const DELOAD_STRONG_STREAK: u8 = 90;
    pub const DELOAD_STREAK: u8 = 75;
    pub const ACWR_SPIKE: u8 = 80;
    pub const ACWR_LOW: u8 = 65;
    pub const READINESS_VERY_LOW: u8 = 90;
    pub const READINESS_LOW: u8 = 75;
    pub const COMPLIANCE_CRITICAL: u8 = 85;
    pub const COMPLIANCE_WARNING: u8 = 70;
}

/// Numeric limits and windows
pub mod limits {
    /// Default lookback for the athlete history summary
    pub const DEFAULT_HISTORY_WEEKS: u32 = 10;
    /// Readiness trend window used by the history summary
    pub const READINESS_TREND_DAYS: i64 = 14;
    /// Entries kept in the exercise frequency table
    pub const TOP_EXERCISES: usize = 8;
    /// Entries printed on the digest's exercise line
    pub const TOP_EXERCISES_IN_DIGEST: usize = 5;
    /// Most recent plan sessions inspected for aggregate overload
    pub const OVERLOAD_SESSION_LOOKBACK: usize = 5;
    /// Most recent sessions walked for RPE overreach
    pub const DELOAD_SESSION_LOOKBACK: usize = 10;
    /// Previous results fetched per exercise for progression
    pub const PROGRESSION_RESULT_LOOKBACK: usize = 3;
}

/// Environment-based configuration
pub mod env_config {
    use std::env;

    /// Get database URL from environment or default
    pub fn database_url() -> String {
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./data/coaching.db".to_string())
    }

    /// Get analytics config file path from environment
    pub fn config_path() -> Option<String> {
        env::var("ADAPTIVE_CONFIG").ok()
    }

    /// Whether shown suggestions are written to the audit log
    pub fn audit_suggestions() -> bool {
        env::var("AUDIT_SUGGESTIONS")
            .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(true)
    }

    /// Get log level from environment or default
    pub fn log_level() -> String {
        env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    }
}
