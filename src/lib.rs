// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Adaptive Coaching
//!
//! Training-load analytics for strength and conditioning coaches. The crate
//! reads completed sessions, assignments and daily readiness check-ins and
//! turns them into prioritized, rule-based coaching suggestions.
//!
//! ## Features
//!
//! - **Metric aggregation**: ISO-week volume load, ACWR and volume trend
//! - **Rule classifiers**: progressive overload, deload, readiness and compliance
//! - **Suggestion orchestration**: concurrent classifiers merged by priority
//! - **History digest**: a per-athlete summary with risk flags and context text
//! - **Completion pipeline**: session recording, personal bests and streaks
//!
//! ## Architecture
//!
//! - **Models**: records the analytics read
//! - **Repository**: the storage seam, with in-memory and SQLite implementations
//! - **Intelligence**: metrics, classifiers, orchestrator and summarizer
//! - **Config**: analytics windows and environment settings
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use adaptive_coaching::database::Database;
//! use adaptive_coaching::intelligence::AdaptiveEngine;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let database = Database::new("sqlite:./data/coaching.db").await?;
//!     let engine = AdaptiveEngine::new(Arc::new(database));
//!
//!     let (plan_id, coach_id, athlete_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
//!     for suggestion in engine.get_suggestions_for_plan(plan_id, coach_id, Some(athlete_id)).await {
//!         println!("[{:?}] {}", suggestion.priority, suggestion.title);
//!     }
//!
//!     Ok(())
//! }
//! ```

/// Common data models for training records
pub mod models;

/// Configuration management
pub mod config;

/// Thresholds, defaults and environment lookups
pub mod constants;

/// Training-load analytics and coaching suggestions
pub mod intelligence;

/// Storage abstraction and in-memory implementation
pub mod repository;

/// SQLite storage
pub mod database;

/// Post-completion bookkeeping
pub mod completion;

/// Production logging and structured output
pub mod logging;
