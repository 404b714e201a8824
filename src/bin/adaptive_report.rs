// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::sync::Arc;

use adaptive_coaching::config::EnvironmentConfig;
use adaptive_coaching::database::Database;
use adaptive_coaching::intelligence::{AdaptiveEngine, HistorySummarizer, Suggestion};
use adaptive_coaching::logging::{LogFormat, LoggingConfig};
use adaptive_coaching::models::ActionTaken;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "adaptive-report")]
#[command(about = "Print adaptive coaching suggestions and athlete summaries as JSON")]
struct Cli {
    /// Overrides DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    /// Analytics config file (overrides ADAPTIVE_CONFIG)
    #[arg(long)]
    config: Option<String>,

    /// Skip writing shown suggestions to the audit log
    #[arg(long)]
    no_audit: bool,

    /// Debug-level logs with source locations
    #[arg(short, long)]
    verbose: bool,

    /// Log output format: json, pretty or compact (overrides LOG_FORMAT)
    #[arg(long, value_parser = parse_log_format)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan-level suggestions
    Plan {
        #[arg(long)]
        plan_id: Uuid,

        #[arg(long)]
        coach_id: Uuid,

        /// Adds readiness and compliance checks for this athlete
        #[arg(long)]
        athlete_id: Option<Uuid>,
    },
    /// Readiness and progression suggestions for an upcoming workout
    Session {
        #[arg(long)]
        workout_id: Uuid,

        #[arg(long)]
        athlete_id: Uuid,

        /// Coach to attribute audit records to
        #[arg(long)]
        coach_id: Option<Uuid>,
    },
    /// Training history digest for one athlete
    Summary {
        #[arg(long)]
        coach_id: Uuid,

        #[arg(long)]
        athlete_id: Uuid,

        /// Weeks of history (default from config)
        #[arg(long)]
        weeks: Option<u32>,
    },
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    LogFormat::parse(value).ok_or_else(|| format!("unknown log format: {value}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env().verbose(cli.verbose);
    if let Some(format) = cli.log_format {
        logging = logging.format(format);
    }
    logging.init()?;

    let mut env = EnvironmentConfig::from_env()?;
    if let Some(url) = cli.database_url {
        env.database_url = url;
        env.validate()?;
    }
    if cli.config.is_some() {
        env.config_path = cli.config;
    }
    if cli.no_audit {
        env.audit_suggestions = false;
    }
    info!("{}", env.summary());

    let analytics = env.analytics()?;
    let database = Database::new(&env.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", env.database_url))?;
    let repository = Arc::new(database);

    match cli.command {
        Commands::Plan {
            plan_id,
            coach_id,
            athlete_id,
        } => {
            let engine = AdaptiveEngine::with_config(repository, analytics);
            let suggestions = engine
                .get_suggestions_for_plan(plan_id, coach_id, athlete_id)
                .await;
            print_json(&suggestions)?;
            if env.audit_suggestions {
                audit(&engine, coach_id, &suggestions).await;
            }
        }
        Commands::Session {
            workout_id,
            athlete_id,
            coach_id,
        } => {
            let engine = AdaptiveEngine::with_config(repository, analytics);
            let suggestions = engine
                .get_suggestions_for_session(workout_id, athlete_id)
                .await;
            print_json(&suggestions)?;
            if let (true, Some(coach_id)) = (env.audit_suggestions, coach_id) {
                audit(&engine, coach_id, &suggestions).await;
            }
        }
        Commands::Summary {
            coach_id,
            athlete_id,
            weeks,
        } => {
            let summarizer = HistorySummarizer::with_config(repository, analytics);
            let summary = summarizer
                .athlete_summary(coach_id, athlete_id, weeks)
                .await?;
            print_json(&summary)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Record every printed suggestion as shown and still pending a decision
async fn audit(engine: &AdaptiveEngine, coach_id: Uuid, suggestions: &[Suggestion]) {
    let handles: Vec<_> = suggestions
        .iter()
        .filter_map(|suggestion| {
            engine.log_suggestion(coach_id, suggestion, ActionTaken::Pending, None)
        })
        .collect();

    // The process exits right after, so wait for the background writes
    for handle in handles {
        if let Err(e) = handle.await {
            warn!("Audit task did not finish: {}", e);
        }
    }
}
