// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration management for the adaptive analytics engine
//!
//! Classifier thresholds are compile-time constants in
//! [`crate::constants::thresholds`]. What is configurable here are the data
//! windows: how far back the engine and the history digest look.

pub mod environment;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants::limits;

pub use environment::EnvironmentConfig;

/// Default file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "adaptive_config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub history: HistoryConfig,
    pub lookback: LookbackConfig,
}

/// Windows used by the athlete history digest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Lookback when the caller does not pass one
    pub default_weeks: u32,
}

/// How many records each classifier fetches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookbackConfig {
    /// Most recent plan sessions judged for aggregate overload
    pub overload_sessions: usize,
    /// Most recent sessions walked for RPE overreach
    pub deload_sessions: usize,
    /// Previous results fetched per exercise for progression
    pub progression_results: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_weeks: limits::DEFAULT_HISTORY_WEEKS,
        }
    }
}

impl Default for LookbackConfig {
    fn default() -> Self {
        Self {
            overload_sessions: limits::OVERLOAD_SESSION_LOOKBACK,
            deload_sessions: limits::DELOAD_SESSION_LOOKBACK,
            progression_results: limits::PROGRESSION_RESULT_LOOKBACK,
        }
    }
}

impl AnalyticsConfig {
    /// Load configuration from an explicit path, the default file, or defaults
    pub fn load(path: Option<String>) -> Result<Self> {
        if let Some(config_path) = path {
            return Self::load_from_file(&config_path);
        }

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::load_from_file(DEFAULT_CONFIG_FILE);
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read analytics config file: {}", path))?;

        let config: AnalyticsConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse analytics config file: {}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject windows that would make every classifier silent
    pub fn validate(&self) -> Result<()> {
        if self.history.default_weeks == 0 {
            return Err(anyhow::anyhow!("history.default_weeks must be at least 1"));
        }
        if self.lookback.overload_sessions == 0
            || self.lookback.deload_sessions == 0
            || self.lookback.progression_results == 0
        {
            return Err(anyhow::anyhow!("lookback values must be at least 1"));
        }
        Ok(())
    }
}
