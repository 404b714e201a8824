// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Database Management
//!
//! SQLite storage for the coaching records the analytics engine reads, and
//! for the few things it writes: readiness check-ins, completions, personal
//! bests, streaks and the suggestion audit log.
//!
//! Identifiers are stored as text UUIDs, instants as fixed-width RFC 3339
//! strings (so they compare lexicographically) and calendar days as
//! `YYYY-MM-DD`.

use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::intelligence::{ContextKind, ContextRef};
use crate::logging::AppLogger;
use crate::models::{
    ActionTaken, AssignmentStatus, AthleteProfile, CompletedSession, ExerciseOutcome,
    PersonalBest, PersonalBestKind, PrescribedExercise, Prescription, ReadinessEntry,
    ScheduledSession, SuggestionAuditRecord, TrainingStreak, Workout,
};
use crate::repository::{SessionQuery, TrainingRepository};

const OUTCOME_COLUMNS: &str = r#"
    r.exercise_id, r.sets_completed, r.reps_completed, r.weight_used_kg,
    r.duration_seconds, r.distance_meters, r.rpe, r.is_pb, r.created_at,
    COALESCE(r.exercise_name, e.name) AS exercise_name,
    e.id AS prescribed_id, e.sets AS prescribed_sets, e.reps AS prescribed_reps,
    e.weight_kg AS prescribed_weight_kg
"#;

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid timestamp: {value}"))?
        .with_timezone(&Utc))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").with_context(|| format!("Invalid date: {value}"))
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).with_context(|| format!("Invalid id: {value}"))
}

fn parse_optional_uuid(value: Option<String>) -> Result<Option<Uuid>> {
    value.as_deref().map(parse_uuid).transpose()
}

fn narrow<T: TryFrom<i64>>(value: Option<i64>) -> Option<T> {
    value.and_then(|v| T::try_from(v).ok())
}

/// SQLite-backed [`TrainingRepository`]
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = if database_url.contains(":memory:") {
            // Every in-memory connection would otherwise see its own database
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect(database_url)
                .await?
        } else {
            // Ensure SQLite creates the database file if it doesn't exist
            SqlitePool::connect(&format!("{database_url}?mode=rwc")).await?
        };

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                display_name TEXT,
                competition_level TEXT,
                injury_notes TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS coach_athletes (
                coach_id TEXT NOT NULL,
                athlete_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                PRIMARY KEY (coach_id, athlete_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS workouts (
                id TEXT PRIMARY KEY,
                plan_id TEXT,
                name TEXT NOT NULL,
                target_rpe REAL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS exercises (
                id TEXT PRIMARY KEY,
                workout_id TEXT NOT NULL,
                name TEXT NOT NULL,
                sets INTEGER,
                reps TEXT,
                weight_kg REAL,
                target_rpe REAL,
                order_index INTEGER NOT NULL DEFAULT 0
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS workout_assignments (
                id TEXT PRIMARY KEY,
                athlete_id TEXT NOT NULL,
                coach_id TEXT NOT NULL,
                plan_id TEXT,
                workout_id TEXT NOT NULL,
                assigned_date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS workout_completions (
                id TEXT PRIMARY KEY,
                athlete_id TEXT NOT NULL,
                assignment_id TEXT,
                workout_id TEXT,
                plan_id TEXT,
                completed_at TEXT NOT NULL,
                overall_rpe REAL,
                duration_minutes INTEGER
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS exercise_results (
                id TEXT PRIMARY KEY,
                completion_id TEXT NOT NULL,
                exercise_id TEXT NOT NULL,
                exercise_name TEXT,
                sets_completed INTEGER,
                reps_completed TEXT,
                weight_used_kg REAL,
                duration_seconds INTEGER,
                distance_meters REAL,
                rpe REAL,
                is_pb BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS readiness_logs (
                athlete_id TEXT NOT NULL,
                log_date TEXT NOT NULL,
                subjective_score REAL,
                sleep_quality INTEGER,
                sleep_hours REAL,
                muscle_soreness INTEGER,
                energy_level INTEGER,
                stress_level INTEGER,
                notes TEXT,
                UNIQUE (athlete_id, log_date)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS personal_bests (
                athlete_id TEXT NOT NULL,
                exercise_name TEXT NOT NULL,
                pb_type TEXT NOT NULL,
                value REAL NOT NULL,
                achieved_at TEXT NOT NULL,
                completion_id TEXT NOT NULL,
                UNIQUE (athlete_id, exercise_name, pb_type)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS user_streaks (
                user_id TEXT PRIMARY KEY,
                current_streak INTEGER NOT NULL,
                longest_streak INTEGER NOT NULL,
                last_workout_date TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS suggestion_logs (
                id TEXT PRIMARY KEY,
                coach_id TEXT NOT NULL,
                context_type TEXT NOT NULL,
                context_id TEXT,
                prompt_summary TEXT NOT NULL,
                suggestion TEXT NOT NULL,
                action_taken TEXT NOT NULL,
                coach_notes TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_completions_athlete ON workout_completions(athlete_id, completed_at)",
            "CREATE INDEX IF NOT EXISTS idx_results_exercise ON exercise_results(exercise_id, created_at)",
            "CREATE INDEX IF NOT EXISTS idx_assignments_athlete ON workout_assignments(athlete_id, plan_id)",
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// Create or replace an athlete profile
    pub async fn create_profile(&self, profile: &AthleteProfile) -> Result<Uuid> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO profiles (id, display_name, competition_level, injury_notes)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(profile.id.to_string())
        .bind(&profile.display_name)
        .bind(&profile.competition_level)
        .bind(&profile.injury_notes)
        .execute(&self.pool)
        .await?;

        Ok(profile.id)
    }

    /// Record an active coach-athlete relationship
    pub async fn link_coach_athlete(&self, coach_id: Uuid, athlete_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO coach_athletes (coach_id, athlete_id, status, created_at)
            VALUES (?1, ?2, 'active', ?3)
            ON CONFLICT (coach_id, athlete_id) DO UPDATE SET status = 'active'
            "#,
        )
        .bind(coach_id.to_string())
        .bind(athlete_id.to_string())
        .bind(timestamp(&Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn create_workout(&self, workout: &Workout) -> Result<Uuid> {
        sqlx::query("INSERT INTO workouts (id, plan_id, name, target_rpe) VALUES (?1, ?2, ?3, ?4)")
            .bind(workout.id.to_string())
            .bind(workout.plan_id.map(|id| id.to_string()))
            .bind(&workout.name)
            .bind(workout.target_rpe)
            .execute(&self.pool)
            .await?;

        Ok(workout.id)
    }

    pub async fn add_exercise(&self, exercise: &PrescribedExercise) -> Result<Uuid> {
        sqlx::query(
            r#"
            INSERT INTO exercises (id, workout_id, name, sets, reps, weight_kg, target_rpe, order_index)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(exercise.id.to_string())
        .bind(exercise.workout_id.to_string())
        .bind(&exercise.name)
        .bind(exercise.sets.map(i64::from))
        .bind(&exercise.reps)
        .bind(exercise.load_kg)
        .bind(exercise.target_rpe)
        .bind(exercise.order_index)
        .execute(&self.pool)
        .await?;

        Ok(exercise.id)
    }

    pub async fn create_assignment(&self, assignment: &ScheduledSession) -> Result<Uuid> {
        sqlx::query(
            r#"
            INSERT INTO workout_assignments (id, athlete_id, coach_id, plan_id, workout_id, assigned_date, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(assignment.id.to_string())
        .bind(assignment.athlete_id.to_string())
        .bind(assignment.coach_id.to_string())
        .bind(assignment.plan_id.map(|id| id.to_string()))
        .bind(assignment.workout_id.to_string())
        .bind(assignment.scheduled_date.to_string())
        .bind(assignment.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(assignment.id)
    }

    /// Audit records written for a coach, oldest first
    pub async fn audit_records(&self, coach_id: Uuid) -> Result<Vec<SuggestionAuditRecord>> {
        let rows = sqlx::query("SELECT * FROM suggestion_logs WHERE coach_id = ?1 ORDER BY created_at ASC")
            .bind(coach_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_audit_record).collect()
    }

    async fn session_outcomes(&self, completion_id: Uuid) -> Result<Vec<ExerciseOutcome>> {
        let sql = format!(
            r#"
            SELECT {OUTCOME_COLUMNS}
            FROM exercise_results r
            LEFT JOIN exercises e ON e.id = r.exercise_id
            WHERE r.completion_id = ?1
            ORDER BY r.rowid ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(completion_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_outcome).collect()
    }
}

fn row_to_outcome(row: &SqliteRow) -> Result<ExerciseOutcome> {
    let exercise_id: String = row.try_get("exercise_id")?;
    let created_at: String = row.try_get("created_at")?;
    let prescribed_id: Option<String> = row.try_get("prescribed_id")?;

    let prescription = match prescribed_id {
        Some(_) => Some(Prescription {
            sets: narrow(row.try_get("prescribed_sets")?),
            reps: row.try_get("prescribed_reps")?,
            load_kg: row.try_get("prescribed_weight_kg")?,
        }),
        None => None,
    };

    Ok(ExerciseOutcome {
        exercise_id: parse_uuid(&exercise_id)?,
        exercise_name: row.try_get("exercise_name")?,
        prescription,
        sets_completed: narrow(row.try_get("sets_completed")?),
        reps_completed: row.try_get("reps_completed")?,
        load_kg: row.try_get("weight_used_kg")?,
        duration_seconds: narrow(row.try_get("duration_seconds")?),
        distance_meters: row.try_get("distance_meters")?,
        rpe: row.try_get("rpe")?,
        is_personal_best: row.try_get("is_pb")?,
        recorded_at: parse_timestamp(&created_at)?,
    })
}

fn row_to_session(row: &SqliteRow) -> Result<CompletedSession> {
    let id: String = row.try_get("id")?;
    let athlete_id: String = row.try_get("athlete_id")?;
    let completed_at: String = row.try_get("completed_at")?;

    Ok(CompletedSession {
        id: parse_uuid(&id)?,
        athlete_id: parse_uuid(&athlete_id)?,
        assignment_id: parse_optional_uuid(row.try_get("assignment_id")?)?,
        workout_id: parse_optional_uuid(row.try_get("workout_id")?)?,
        plan_id: parse_optional_uuid(row.try_get("plan_id")?)?,
        completed_at: parse_timestamp(&completed_at)?,
        overall_rpe: row.try_get("overall_rpe")?,
        duration_minutes: narrow(row.try_get("duration_minutes")?),
        outcomes: Vec::new(),
    })
}

fn row_to_assignment(row: &SqliteRow) -> Result<ScheduledSession> {
    let id: String = row.try_get("id")?;
    let athlete_id: String = row.try_get("athlete_id")?;
    let coach_id: String = row.try_get("coach_id")?;
    let workout_id: String = row.try_get("workout_id")?;
    let assigned_date: String = row.try_get("assigned_date")?;
    let status: String = row.try_get("status")?;

    Ok(ScheduledSession {
        id: parse_uuid(&id)?,
        athlete_id: parse_uuid(&athlete_id)?,
        coach_id: parse_uuid(&coach_id)?,
        plan_id: parse_optional_uuid(row.try_get("plan_id")?)?,
        workout_id: parse_uuid(&workout_id)?,
        scheduled_date: parse_date(&assigned_date)?,
        status: AssignmentStatus::parse(&status)
            .ok_or_else(|| anyhow!("Unknown assignment status: {status}"))?,
    })
}

fn row_to_readiness(row: &SqliteRow) -> Result<ReadinessEntry> {
    let athlete_id: String = row.try_get("athlete_id")?;
    let log_date: String = row.try_get("log_date")?;

    Ok(ReadinessEntry {
        athlete_id: parse_uuid(&athlete_id)?,
        log_date: parse_date(&log_date)?,
        subjective_score: row.try_get("subjective_score")?,
        sleep_quality: narrow(row.try_get("sleep_quality")?),
        sleep_hours: row.try_get("sleep_hours")?,
        muscle_soreness: narrow(row.try_get("muscle_soreness")?),
        energy_level: narrow(row.try_get("energy_level")?),
        stress_level: narrow(row.try_get("stress_level")?),
        notes: row.try_get("notes")?,
    })
}

fn row_to_audit_record(row: &SqliteRow) -> Result<SuggestionAuditRecord> {
    let id: String = row.try_get("id")?;
    let coach_id: String = row.try_get("coach_id")?;
    let context_type: String = row.try_get("context_type")?;
    let suggestion: String = row.try_get("suggestion")?;
    let action_taken: String = row.try_get("action_taken")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(SuggestionAuditRecord {
        id: parse_uuid(&id)?,
        coach_id: parse_uuid(&coach_id)?,
        context: ContextRef {
            kind: ContextKind::parse(&context_type)
                .ok_or_else(|| anyhow!("Unknown context type: {context_type}"))?,
            id: parse_optional_uuid(row.try_get("context_id")?)?,
        },
        summary: row.try_get("prompt_summary")?,
        suggestion: serde_json::from_str(&suggestion)?,
        action_taken: ActionTaken::parse(&action_taken)
            .ok_or_else(|| anyhow!("Unknown action: {action_taken}"))?,
        coach_notes: row.try_get("coach_notes")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait]
impl TrainingRepository for Database {
    async fn completed_sessions(&self, query: &SessionQuery) -> Result<Vec<CompletedSession>> {
        let order = if query.newest_first { "DESC" } else { "ASC" };
        let sql = format!(
            r#"
            SELECT * FROM workout_completions
            WHERE (?1 IS NULL OR athlete_id = ?1)
              AND (?2 IS NULL OR plan_id = ?2)
              AND (?3 IS NULL OR completed_at >= ?3)
              AND (?4 IS NULL OR completed_at < ?4)
            ORDER BY completed_at {order}
            LIMIT ?5
            "#
        );

        let limit = query.limit.map_or(-1, |limit| limit as i64);
        let rows = sqlx::query(&sql)
            .bind(query.athlete_id.map(|id| id.to_string()))
            .bind(query.plan_id.map(|id| id.to_string()))
            .bind(query.since.as_ref().map(timestamp))
            .bind(query.until.as_ref().map(timestamp))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut session = row_to_session(row)?;
            session.outcomes = self.session_outcomes(session.id).await?;
            sessions.push(session);
        }
        Ok(sessions)
    }

    async fn scheduled_sessions(
        &self,
        athlete_id: Uuid,
        plan_id: Option<Uuid>,
    ) -> Result<Vec<ScheduledSession>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM workout_assignments
            WHERE athlete_id = ?1 AND (?2 IS NULL OR plan_id = ?2)
            ORDER BY assigned_date ASC
            "#,
        )
        .bind(athlete_id.to_string())
        .bind(plan_id.map(|id| id.to_string()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_assignment).collect()
    }

    async fn readiness_for_day(
        &self,
        athlete_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ReadinessEntry>> {
        let row = sqlx::query("SELECT * FROM readiness_logs WHERE athlete_id = ?1 AND log_date = ?2")
            .bind(athlete_id.to_string())
            .bind(date.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_readiness).transpose()
    }

    async fn readiness_since(
        &self,
        athlete_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<ReadinessEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM readiness_logs
            WHERE athlete_id = ?1 AND log_date >= ?2
            ORDER BY log_date DESC
            "#,
        )
        .bind(athlete_id.to_string())
        .bind(since.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_readiness).collect()
    }

    async fn upsert_readiness(&self, entry: &ReadinessEntry) -> Result<ReadinessEntry> {
        let started = Instant::now();
        let result = sqlx::query(
            r#"
            INSERT INTO readiness_logs (
                athlete_id, log_date, subjective_score, sleep_quality, sleep_hours,
                muscle_soreness, energy_level, stress_level, notes
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT (athlete_id, log_date) DO UPDATE SET
                subjective_score = excluded.subjective_score,
                sleep_quality = excluded.sleep_quality,
                sleep_hours = excluded.sleep_hours,
                muscle_soreness = excluded.muscle_soreness,
                energy_level = excluded.energy_level,
                stress_level = excluded.stress_level,
                notes = excluded.notes
            "#,
        )
        .bind(entry.athlete_id.to_string())
        .bind(entry.log_date.to_string())
        .bind(entry.subjective_score)
        .bind(entry.sleep_quality.map(i64::from))
        .bind(entry.sleep_hours)
        .bind(entry.muscle_soreness.map(i64::from))
        .bind(entry.energy_level.map(i64::from))
        .bind(entry.stress_level.map(i64::from))
        .bind(&entry.notes)
        .execute(&self.pool)
        .await;

        AppLogger::log_database_operation(
            "upsert",
            "readiness_logs",
            result.is_ok(),
            started.elapsed().as_millis() as u64,
        );
        result?;

        self.readiness_for_day(entry.athlete_id, entry.log_date)
            .await?
            .ok_or_else(|| anyhow!("Readiness entry missing after upsert"))
    }

    async fn workout(&self, workout_id: Uuid) -> Result<Option<Workout>> {
        let row = sqlx::query("SELECT * FROM workouts WHERE id = ?1")
            .bind(workout_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let id: String = row.try_get("id")?;
                Ok(Some(Workout {
                    id: parse_uuid(&id)?,
                    plan_id: parse_optional_uuid(row.try_get("plan_id")?)?,
                    name: row.try_get("name")?,
                    target_rpe: row.try_get("target_rpe")?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn workout_exercises(&self, workout_id: Uuid) -> Result<Vec<PrescribedExercise>> {
        let rows = sqlx::query("SELECT * FROM exercises WHERE workout_id = ?1 ORDER BY order_index ASC")
            .bind(workout_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                Ok(PrescribedExercise {
                    id: parse_uuid(&id)?,
                    workout_id,
                    name: row.try_get("name")?,
                    sets: narrow(row.try_get("sets")?),
                    reps: row.try_get("reps")?,
                    load_kg: row.try_get("weight_kg")?,
                    target_rpe: row.try_get("target_rpe")?,
                    order_index: row.try_get("order_index")?,
                })
            })
            .collect()
    }

    async fn latest_outcomes(
        &self,
        exercise_id: Uuid,
        athlete_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ExerciseOutcome>> {
        let sql = format!(
            r#"
            SELECT {OUTCOME_COLUMNS}
            FROM exercise_results r
            JOIN workout_completions c ON c.id = r.completion_id
            LEFT JOIN exercises e ON e.id = r.exercise_id
            WHERE r.exercise_id = ?1 AND c.athlete_id = ?2
            ORDER BY r.created_at DESC
            LIMIT ?3
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(exercise_id.to_string())
            .bind(athlete_id.to_string())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_outcome).collect()
    }

    async fn athlete_profile(&self, athlete_id: Uuid) -> Result<Option<AthleteProfile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ?1")
            .bind(athlete_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(AthleteProfile {
                id: athlete_id,
                display_name: row.try_get("display_name")?,
                competition_level: row.try_get("competition_level")?,
                injury_notes: row.try_get("injury_notes")?,
            })),
            None => Ok(None),
        }
    }

    async fn has_active_relationship(&self, coach_id: Uuid, athlete_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM coach_athletes WHERE coach_id = ?1 AND athlete_id = ?2 AND status = 'active'",
        )
        .bind(coach_id.to_string())
        .bind(athlete_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn append_audit_record(&self, record: &SuggestionAuditRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO suggestion_logs (
                id, coach_id, context_type, context_id, prompt_summary,
                suggestion, action_taken, coach_notes, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.coach_id.to_string())
        .bind(record.context.kind.as_str())
        .bind(record.context.id.map(|id| id.to_string()))
        .bind(&record.summary)
        .bind(serde_json::to_string(&record.suggestion)?)
        .bind(record.action_taken.as_str())
        .bind(&record.coach_notes)
        .bind(timestamp(&record.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_completion(&self, session: &CompletedSession) -> Result<()> {
        let started = Instant::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO workout_completions (
                id, athlete_id, assignment_id, workout_id, plan_id,
                completed_at, overall_rpe, duration_minutes
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(session.id.to_string())
        .bind(session.athlete_id.to_string())
        .bind(session.assignment_id.map(|id| id.to_string()))
        .bind(session.workout_id.map(|id| id.to_string()))
        .bind(session.plan_id.map(|id| id.to_string()))
        .bind(timestamp(&session.completed_at))
        .bind(session.overall_rpe)
        .bind(session.duration_minutes.map(i64::from))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM exercise_results WHERE completion_id = ?1")
            .bind(session.id.to_string())
            .execute(&mut *tx)
            .await?;

        for outcome in &session.outcomes {
            sqlx::query(
                r#"
                INSERT INTO exercise_results (
                    id, completion_id, exercise_id, exercise_name, sets_completed,
                    reps_completed, weight_used_kg, duration_seconds, distance_meters,
                    rpe, is_pb, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(session.id.to_string())
            .bind(outcome.exercise_id.to_string())
            .bind(&outcome.exercise_name)
            .bind(outcome.sets_completed.map(i64::from))
            .bind(&outcome.reps_completed)
            .bind(outcome.load_kg)
            .bind(outcome.duration_seconds.map(i64::from))
            .bind(outcome.distance_meters)
            .bind(outcome.rpe)
            .bind(outcome.is_personal_best)
            .bind(timestamp(&outcome.recorded_at))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        AppLogger::log_database_operation(
            "insert",
            "workout_completions",
            true,
            started.elapsed().as_millis() as u64,
        );
        Ok(())
    }

    async fn mark_assignment_completed(&self, assignment_id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE workout_assignments SET status = 'completed' WHERE id = ?1")
            .bind(assignment_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("Assignment {assignment_id} not found"));
        }
        Ok(())
    }

    async fn personal_best(
        &self,
        athlete_id: Uuid,
        exercise_name: &str,
        kind: PersonalBestKind,
    ) -> Result<Option<PersonalBest>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM personal_bests
            WHERE athlete_id = ?1 AND exercise_name = ?2 AND pb_type = ?3
            "#,
        )
        .bind(athlete_id.to_string())
        .bind(exercise_name)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let achieved_at: String = row.try_get("achieved_at")?;
                let completion_id: String = row.try_get("completion_id")?;
                Ok(Some(PersonalBest {
                    athlete_id,
                    exercise_name: exercise_name.to_string(),
                    kind,
                    value: row.try_get("value")?,
                    achieved_at: parse_timestamp(&achieved_at)?,
                    completion_id: parse_uuid(&completion_id)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn upsert_personal_best(&self, best: &PersonalBest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO personal_bests (athlete_id, exercise_name, pb_type, value, achieved_at, completion_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (athlete_id, exercise_name, pb_type) DO UPDATE SET
                value = excluded.value,
                achieved_at = excluded.achieved_at,
                completion_id = excluded.completion_id
            "#,
        )
        .bind(best.athlete_id.to_string())
        .bind(&best.exercise_name)
        .bind(best.kind.as_str())
        .bind(best.value)
        .bind(timestamp(&best.achieved_at))
        .bind(best.completion_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn streak(&self, user_id: Uuid) -> Result<Option<TrainingStreak>> {
        let row = sqlx::query("SELECT * FROM user_streaks WHERE user_id = ?1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let current: i64 = row.try_get("current_streak")?;
                let longest: i64 = row.try_get("longest_streak")?;
                let last_workout_date: String = row.try_get("last_workout_date")?;
                Ok(Some(TrainingStreak {
                    user_id,
                    current_streak: u32::try_from(current)?,
                    longest_streak: u32::try_from(longest)?,
                    last_workout_date: parse_date(&last_workout_date)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn save_streak(&self, streak: &TrainingStreak) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_streaks (user_id, current_streak, longest_streak, last_workout_date)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (user_id) DO UPDATE SET
                current_streak = excluded.current_streak,
                longest_streak = excluded.longest_streak,
                last_workout_date = excluded.last_workout_date
            "#,
        )
        .bind(streak.user_id.to_string())
        .bind(i64::from(streak.current_streak))
        .bind(i64::from(streak.longest_streak))
        .bind(streak.last_workout_date.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
