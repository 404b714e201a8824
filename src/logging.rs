// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Structured logging for the analytics engine and its reporting binary
//!
//! Output goes to stderr; stdout carries the report itself.

use anyhow::{anyhow, Result};
use std::env;
use std::io;
use tracing::{info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::constants::env_config;

/// Logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` does not parse
    pub level: String,
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Emit span open/close events around suggestion runs
    pub include_spans: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, for log shippers
    Json,
    Pretty,
    /// Single-line output without targets
    Compact,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            include_location: false,
            include_spans: false,
        }
    }
}

impl LoggingConfig {
    /// Read `RUST_LOG`, `LOG_FORMAT`, `LOG_INCLUDE_LOCATION` and `LOG_INCLUDE_SPANS`
    pub fn from_env() -> Self {
        let format = env::var("LOG_FORMAT")
            .ok()
            .and_then(|value| LogFormat::parse(&value))
            .unwrap_or(LogFormat::Compact);

        Self {
            level: env_config::log_level(),
            format,
            include_location: env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
        }
    }

    /// Raise the level to `debug` with file and line info
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.level = "debug".to_string();
            self.include_location = true;
        }
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn filter(&self) -> EnvFilter {
        // An explicit level from the command line wins over RUST_LOG
        if self.level != env_config::log_level() {
            return EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new("info"));
        }
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let layer = fmt::layer()
            .with_writer(io::stderr)
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_span_events(span_events);

        match self.format {
            LogFormat::Json => layer.json().with_current_span(self.include_spans).boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Compact => layer.compact().with_target(false).boxed(),
        }
    }

    /// Install the global subscriber
    ///
    /// Fails instead of panicking when a subscriber is already installed.
    pub fn init(&self) -> Result<()> {
        tracing_subscriber::registry()
            .with(self.layer())
            .with(self.filter())
            .try_init()
            .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

        info!(
            log.level = %self.level,
            log.format = ?self.format,
            log.location = self.include_location,
            "Adaptive coaching logging initialized"
        );
        Ok(())
    }
}

/// Application-specific logging utilities
pub struct AppLogger;

impl AppLogger {
    /// Log a completed orchestration run
    pub fn log_suggestion_run(context: &str, context_id: &str, suggestions: usize, duration_ms: u64) {
        info!(
            adaptive.context = %context,
            adaptive.context_id = %context_id,
            adaptive.suggestions = %suggestions,
            adaptive.duration_ms = %duration_ms,
            "Adaptive suggestion run"
        );
    }

    /// Log a classifier whose output was dropped
    pub fn log_classifier_failure(classifier: &str, error: &str) {
        warn!(
            classifier.name = %classifier,
            classifier.error = %error,
            "Classifier failed; contributing no suggestions"
        );
    }

    /// Log a suggestion audit write
    pub fn log_audit_write(coach_id: &str, summary: &str, success: bool) {
        if success {
            info!(
                user.id = %coach_id,
                audit.summary = %summary,
                "Suggestion audit record written"
            );
        } else {
            warn!(
                user.id = %coach_id,
                audit.summary = %summary,
                "Suggestion audit record write failed"
            );
        }
    }

    /// Log database operations
    pub fn log_database_operation(operation: &str, table: &str, success: bool, duration_ms: u64) {
        info!(
            db.operation = %operation,
            db.table = %table,
            db.success = %success,
            db.duration_ms = %duration_ms,
            "Database operation"
        );
    }

    /// Log security events
    pub fn log_security_event(event_type: &str, severity: &str, details: &str, user_id: Option<&str>) {
        warn!(
            security.event = %event_type,
            security.severity = %severity,
            security.details = %details,
            user.id = user_id.unwrap_or("unknown"),
            "Security event"
        );
    }
}
