// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Environment-based configuration for the reporting binary

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::AnalyticsConfig;
use crate::constants::env_config;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// SQLite connection string
    pub database_url: String,
    /// Explicit analytics config file (`ADAPTIVE_CONFIG`)
    pub config_path: Option<String>,
    /// Write shown suggestions to the audit log
    pub audit_suggestions: bool,
    pub log_level: String,
}

impl EnvironmentConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        if let Err(e) = dotenv::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        let config = Self {
            database_url: env_config::database_url(),
            config_path: env_config::config_path(),
            audit_suggestions: env_config::audit_suggestions(),
            log_level: env_config::log_level(),
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.is_empty() {
            return Err(anyhow::anyhow!("DATABASE_URL cannot be empty"));
        }
        if !self.database_url.starts_with("sqlite:") {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a sqlite: connection string"
            ));
        }
        Ok(())
    }

    /// Analytics windows from `ADAPTIVE_CONFIG`, the default file, or defaults
    pub fn analytics(&self) -> Result<AnalyticsConfig> {
        AnalyticsConfig::load(self.config_path.clone())
            .context("Failed to load analytics configuration")
    }

    /// Configuration summary for logging
    pub fn summary(&self) -> String {
        format!(
            "Adaptive Coaching Configuration:\n\
             - Database: {}\n\
             - Analytics config: {}\n\
             - Suggestion audit: {}\n\
             - Log Level: {}",
            self.database_url,
            self.config_path.as_deref().unwrap_or("default"),
            if self.audit_suggestions { "Enabled" } else { "Disabled" },
            self.log_level
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> EnvironmentConfig {
        EnvironmentConfig {
            database_url: url.to_string(),
            config_path: None,
            audit_suggestions: true,
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(config("sqlite::memory:").validate().is_ok());
        assert!(config("").validate().is_err());
        assert!(config("postgres://localhost/coaching").validate().is_err());
    }

    #[test]
    fn test_summary_mentions_audit() {
        let summary = config("sqlite:./data/coaching.db").summary();
        assert!(summary.contains("Suggestion audit: Enabled"));
        assert!(summary.contains("Analytics config: default"));
    }
}
