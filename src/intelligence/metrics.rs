// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Training volume aggregation: volume load, ISO-week buckets, ACWR and trend

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{limits, thresholds};
use crate::models::{CompletedSession, ExerciseOutcome};

/// Parse the leading integer of a free-text rep count
///
/// `"8-10"` yields 8, `" 12 reps"` yields 12, `"AMRAP"` yields `None`.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse::<i64>().ok().map(|value| sign * value)
}

/// Volume load of one outcome: sets x reps x load
///
/// Any missing or unparseable factor contributes zero; the result is never negative.
pub fn volume_load(outcome: &ExerciseOutcome) -> f64 {
    let sets = outcome.sets_completed.unwrap_or(0) as f64;
    let reps = outcome
        .reps_completed
        .as_deref()
        .and_then(parse_leading_int)
        .unwrap_or(0) as f64;
    let load = outcome.load_kg.filter(|load| load.is_finite()).unwrap_or(0.0);

    (sets * reps * load).max(0.0)
}

/// Total volume load of a session
pub fn session_volume(session: &CompletedSession) -> f64 {
    session.outcomes.iter().map(volume_load).sum()
}

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// ISO 8601 week identifier (Monday start, week 1 holds the first Thursday)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekKey {
    pub year: i32,
    pub week: u32,
}

impl WeekKey {
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// Monday of the ISO week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Midnight UTC at the start of `date`
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct WeekBucket {
    volume: f64,
    sessions: usize,
}

/// Volume totals per ISO week, oldest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklyVolumes {
    weeks: BTreeMap<WeekKey, WeekBucket>,
}

impl WeeklyVolumes {
    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn get(&self, key: &WeekKey) -> Option<f64> {
        self.weeks.get(key).map(|bucket| bucket.volume)
    }

    /// Sessions bucketed into `key`, zero for weeks outside the window
    pub fn sessions_in(&self, key: &WeekKey) -> usize {
        self.weeks.get(key).map_or(0, |bucket| bucket.sessions)
    }

    /// `(week, volume)` pairs in chronological order
    pub fn entries(&self) -> Vec<(WeekKey, f64)> {
        self.weeks.iter().map(|(key, bucket)| (*key, bucket.volume)).collect()
    }

    /// Volumes in chronological order
    pub fn values(&self) -> Vec<f64> {
        self.weeks.values().map(|bucket| bucket.volume).collect()
    }

    /// Entries starting at the first week that holds a session
    pub fn since_first_session(&self) -> Vec<(WeekKey, f64)> {
        self.weeks
            .iter()
            .skip_while(|(_, bucket)| bucket.sessions == 0)
            .map(|(key, bucket)| (*key, bucket.volume))
            .collect()
    }

    pub fn total(&self) -> f64 {
        self.weeks.values().map(|bucket| bucket.volume).sum()
    }
}

/// Bucket sessions into ISO weeks
///
/// Every week between `window_start` and `window_end` is present, weeks
/// without sessions hold zero. Callers filter sessions to the window at
/// query level; stray sessions still get their own bucket.
pub fn weekly_volumes(
    sessions: &[CompletedSession],
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> WeeklyVolumes {
    let mut weeks = BTreeMap::new();

    let mut monday = week_start(window_start);
    while monday <= window_end {
        weeks.insert(WeekKey::from_date(monday), WeekBucket::default());
        monday += Duration::days(7);
    }

    for session in sessions {
        let bucket = weeks
            .entry(WeekKey::from_date(session.completed_at.date_naive()))
            .or_insert_with(WeekBucket::default);
        bucket.volume += session_volume(session);
        bucket.sessions += 1;
    }

    WeeklyVolumes { weeks }
}

/// Acute and chronic loads behind an ACWR value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcwrReading {
    pub ratio: f64,
    /// Volume of the most recent week in the series
    pub acute: f64,
    /// Mean of the last four weeks with recorded volume
    pub chronic: f64,
}

/// Acute:chronic workload ratio over a chronological weekly series
///
/// The last element is the acute week. `None` when fewer than four weeks
/// carry volume or the chronic mean is zero.
pub fn acwr_reading(weekly_volumes: &[f64]) -> Option<AcwrReading> {
    let recorded: Vec<f64> = weekly_volumes.iter().copied().filter(|v| *v > 0.0).collect();
    if recorded.len() < thresholds::ACWR_CHRONIC_WEEKS {
        return None;
    }

    let acute = *weekly_volumes.last()?;
    let chronic_weeks = &recorded[recorded.len() - thresholds::ACWR_CHRONIC_WEEKS..];
    let chronic = chronic_weeks.iter().sum::<f64>() / chronic_weeks.len() as f64;
    if chronic <= 0.0 {
        return None;
    }

    Some(AcwrReading {
        ratio: acute / chronic,
        acute,
        chronic,
    })
}

/// See [`acwr_reading`]
pub fn acwr(weekly_volumes: &[f64]) -> Option<f64> {
    acwr_reading(weekly_volumes).map(|reading| reading.ratio)
}

/// How often an exercise appears and its heaviest load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseFrequency {
    pub name: String,
    pub frequency: usize,
    /// `None` when no positive load was ever recorded
    pub best_load_kg: Option<f64>,
}

/// Most frequent exercises, ties kept in first-seen order, top eight
pub fn exercise_frequency(sessions: &[CompletedSession]) -> Vec<ExerciseFrequency> {
    let mut order: Vec<ExerciseFrequency> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for outcome in sessions.iter().flat_map(|session| &session.outcomes) {
        let Some(name) = outcome.exercise_name.as_deref().filter(|n| !n.is_empty()) else {
            continue;
        };

        let position = *index.entry(name.to_string()).or_insert_with(|| {
            order.push(ExerciseFrequency {
                name: name.to_string(),
                frequency: 0,
                best_load_kg: None,
            });
            order.len() - 1
        });

        let entry = &mut order[position];
        entry.frequency += 1;
        if let Some(load) = outcome.load_kg.filter(|load| *load > 0.0) {
            if entry.best_load_kg.map_or(true, |best| load > best) {
                entry.best_load_kg = Some(load);
            }
        }
    }

    order.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    order.truncate(limits::TOP_EXERCISES);
    order
}

/// Direction of weekly volume over a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeTrend {
    Increasing,
    Stable,
    Decreasing,
}

impl VolumeTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Stable => "stable",
            Self::Decreasing => "decreasing",
        }
    }
}

impl fmt::Display for VolumeTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compare the mean of the first half of the series with the second half
///
/// Fewer than four points is always `Stable` (insufficient data).
pub fn volume_trend(weekly_volumes: &[f64]) -> VolumeTrend {
    if weekly_volumes.len() < thresholds::VOLUME_TREND_MIN_POINTS {
        return VolumeTrend::Stable;
    }

    let midpoint = weekly_volumes.len() / 2;
    let (first, second) = weekly_volumes.split_at(midpoint);
    let first_mean = first.iter().sum::<f64>() / first.len() as f64;
    let second_mean = second.iter().sum::<f64>() / second.len() as f64;

    let change_pct = if first_mean > 0.0 {
        (second_mean - first_mean) / first_mean * 100.0
    } else {
        0.0
    };

    if change_pct > thresholds::VOLUME_TREND_CHANGE_PCT {
        VolumeTrend::Increasing
    } else if change_pct < -thresholds::VOLUME_TREND_CHANGE_PCT {
        VolumeTrend::Decreasing
    } else {
        VolumeTrend::Stable
    }
}
