// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::sync::Arc;

use adaptive_coaching::database::Database;
use adaptive_coaching::intelligence::{AdaptiveEngine, HistorySummarizer, Recommendation};
use adaptive_coaching::models::{
    ActionTaken, AssignmentStatus, AthleteProfile, CompletedSession, ExerciseOutcome,
    PersonalBest, PersonalBestKind, PrescribedExercise, ReadinessEntry, ScheduledSession,
    Workout,
};
use adaptive_coaching::repository::{SessionQuery, TrainingRepository};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

async fn create_test_db() -> Database {
    Database::new("sqlite::memory:").await.unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 11, 12, 0, 0).unwrap()
}

fn completed(athlete_id: Uuid, plan_id: Option<Uuid>, completed_at: DateTime<Utc>) -> CompletedSession {
    CompletedSession {
        id: Uuid::new_v4(),
        athlete_id,
        assignment_id: None,
        workout_id: None,
        plan_id,
        completed_at,
        overall_rpe: Some(7.5),
        duration_minutes: Some(50),
        outcomes: Vec::new(),
    }
}

async fn bench_workout(db: &Database, plan_id: Uuid) -> (Workout, PrescribedExercise) {
    let workout = Workout {
        id: Uuid::new_v4(),
        plan_id: Some(plan_id),
        name: "Upper A".to_string(),
        target_rpe: Some(7.0),
    };
    let exercise = PrescribedExercise {
        id: Uuid::new_v4(),
        workout_id: workout.id,
        name: "Bench Press".to_string(),
        sets: Some(4),
        reps: Some("6-8".to_string()),
        load_kg: Some(60.0),
        target_rpe: Some(7.0),
        order_index: 0,
    };
    db.create_workout(&workout).await.unwrap();
    db.add_exercise(&exercise).await.unwrap();
    (workout, exercise)
}

#[tokio::test]
async fn test_session_query_filters_and_ordering() {
    let db = create_test_db().await;
    let athlete = Uuid::new_v4();
    let plan = Uuid::new_v4();

    for days_back in [10, 6, 3, 1] {
        db.record_completion(&completed(athlete, Some(plan), now() - Duration::days(days_back)))
            .await
            .unwrap();
    }
    db.record_completion(&completed(athlete, None, now() - Duration::days(2)))
        .await
        .unwrap();
    db.record_completion(&completed(Uuid::new_v4(), Some(plan), now()))
        .await
        .unwrap();

    let plan_sessions = db
        .completed_sessions(&SessionQuery::new().athlete(athlete).plan(plan))
        .await
        .unwrap();
    assert_eq!(plan_sessions.len(), 4);
    assert!(plan_sessions
        .windows(2)
        .all(|pair| pair[0].completed_at <= pair[1].completed_at));

    let window = db
        .completed_sessions(
            &SessionQuery::new()
                .athlete(athlete)
                .since(now() - Duration::days(6))
                .until(now() - Duration::days(1)),
        )
        .await
        .unwrap();
    // Inclusive lower bound, exclusive upper bound
    assert_eq!(window.len(), 3);

    let newest = db
        .completed_sessions(&SessionQuery::new().plan(plan).newest_first().limit(2))
        .await
        .unwrap();
    assert_eq!(newest.len(), 2);
    assert_eq!(newest[0].completed_at, now());
    assert_eq!(newest[1].completed_at, now() - Duration::days(1));
}

#[tokio::test]
async fn test_outcomes_join_prescription() {
    let db = create_test_db().await;
    let athlete = Uuid::new_v4();
    let plan = Uuid::new_v4();
    let (workout, exercise) = bench_workout(&db, plan).await;

    let mut session = completed(athlete, Some(plan), now() - Duration::days(1));
    session.workout_id = Some(workout.id);
    let mut bench = ExerciseOutcome::new(exercise.id, Some(4), Some("8"), Some(62.5));
    bench.rpe = Some(7.0);
    bench.recorded_at = session.completed_at;
    session.outcomes = vec![bench];
    db.record_completion(&session).await.unwrap();

    let stored = db
        .completed_sessions(&SessionQuery::new().athlete(athlete))
        .await
        .unwrap();
    let outcome = &stored[0].outcomes[0];
    assert_eq!(outcome.exercise_name.as_deref(), Some("Bench Press"));
    let prescription = outcome.prescription.as_ref().unwrap();
    assert_eq!(prescription.sets, Some(4));
    assert_eq!(prescription.reps.as_deref(), Some("6-8"));
    assert_eq!(prescription.load_kg, Some(60.0));
    assert_eq!(stored[0].workout_id, Some(workout.id));

    // Recording the same completion again replaces its results
    db.record_completion(&session).await.unwrap();
    let latest = db.latest_outcomes(exercise.id, athlete, 3).await.unwrap();
    assert_eq!(latest.len(), 1);
}

#[tokio::test]
async fn test_engine_runs_against_sqlite() {
    let db = Arc::new(create_test_db().await);
    let athlete = Uuid::new_v4();
    let coach = Uuid::new_v4();
    let plan = Uuid::new_v4();
    let (workout, exercise) = bench_workout(&db, plan).await;

    let mut session = completed(athlete, Some(plan), now() - Duration::days(2));
    session.workout_id = Some(workout.id);
    let mut bench = ExerciseOutcome::new(exercise.id, Some(4), Some("8"), Some(60.0));
    bench.rpe = Some(6.5);
    session.outcomes = vec![bench];
    db.record_completion(&session).await.unwrap();

    let engine = AdaptiveEngine::new(db.clone()).at(now());
    let suggestions = engine.get_suggestions_for_session(workout.id, athlete).await;

    assert_eq!(suggestions.len(), 1);
    match &suggestions[0].recommendation {
        Recommendation::IncreaseWeight {
            exercise_name,
            suggested_load_kg,
            ..
        } => {
            assert_eq!(exercise_name, "Bench Press");
            assert_eq!(*suggested_load_kg, 62.5);
        }
        other => panic!("unexpected recommendation: {other:?}"),
    }

    engine
        .log_suggestion(coach, &suggestions[0], ActionTaken::Accepted, Some("  ".to_string()))
        .unwrap()
        .await
        .unwrap();
    let records = db.audit_records(coach).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].summary, "[Rules] progressive_overload: Progress Bench Press");
    assert_eq!(records[0].action_taken, ActionTaken::Accepted);
    assert_eq!(records[0].coach_notes, None);
    assert_eq!(records[0].context, suggestions[0].context);
}

#[tokio::test]
async fn test_compliance_from_stored_assignments() {
    let db = Arc::new(create_test_db().await);
    let athlete = Uuid::new_v4();
    let coach = Uuid::new_v4();
    let plan = Uuid::new_v4();
    db.link_coach_athlete(coach, athlete).await.unwrap();

    let today = now().date_naive();
    for (days_ago, status) in [
        (6, AssignmentStatus::Completed),
        (5, AssignmentStatus::Skipped),
        (4, AssignmentStatus::Pending),
        (3, AssignmentStatus::Pending),
    ] {
        db.create_assignment(&ScheduledSession {
            id: Uuid::new_v4(),
            athlete_id: athlete,
            coach_id: coach,
            plan_id: Some(plan),
            workout_id: Uuid::new_v4(),
            scheduled_date: today - Duration::days(days_ago),
            status,
        })
        .await
        .unwrap();
    }
    // Another plan does not count
    db.create_assignment(&ScheduledSession {
        id: Uuid::new_v4(),
        athlete_id: athlete,
        coach_id: coach,
        plan_id: Some(Uuid::new_v4()),
        workout_id: Uuid::new_v4(),
        scheduled_date: today,
        status: AssignmentStatus::Completed,
    })
    .await
    .unwrap();

    assert_eq!(db.scheduled_sessions(athlete, Some(plan)).await.unwrap().len(), 4);
    assert_eq!(db.scheduled_sessions(athlete, None).await.unwrap().len(), 5);

    let engine = AdaptiveEngine::new(db.clone()).at(now());
    let suggestions = engine
        .check_compliance_alerts(plan, coach, athlete)
        .await
        .unwrap();
    match &suggestions[0].recommendation {
        Recommendation::SimplifyProgram {
            compliance_rate_pct,
            sessions_missed,
            ..
        } => {
            assert_eq!(*compliance_rate_pct, 25);
            assert_eq!(*sessions_missed, 3);
        }
        other => panic!("unexpected recommendation: {other:?}"),
    }
}

#[tokio::test]
async fn test_personal_best_upsert_replaces_value() {
    let db = create_test_db().await;
    let athlete = Uuid::new_v4();
    let best = PersonalBest {
        athlete_id: athlete,
        exercise_name: "Deadlift".to_string(),
        kind: PersonalBestKind::Weight,
        value: 180.0,
        achieved_at: now() - Duration::days(30),
        completion_id: Uuid::new_v4(),
    };
    db.upsert_personal_best(&best).await.unwrap();
    db.upsert_personal_best(&PersonalBest {
        value: 185.0,
        achieved_at: now(),
        ..best.clone()
    })
    .await
    .unwrap();

    let stored = db
        .personal_best(athlete, "Deadlift", PersonalBestKind::Weight)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.value, 185.0);
    assert_eq!(stored.achieved_at, now());
    assert!(db
        .personal_best(athlete, "Deadlift", PersonalBestKind::Reps)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_summary_reads_profile_and_readiness() {
    let db = Arc::new(create_test_db().await);
    let athlete = Uuid::new_v4();
    let coach = Uuid::new_v4();
    db.link_coach_athlete(coach, athlete).await.unwrap();
    db.create_profile(&AthleteProfile {
        id: athlete,
        display_name: Some("Jordan".to_string()),
        competition_level: None,
        injury_notes: None,
    })
    .await
    .unwrap();

    let day = |d| NaiveDate::from_ymd_opt(2025, 6, d).unwrap();
    for (d, score) in [(8, 5.0), (9, 6.0), (10, 7.0)] {
        db.upsert_readiness(&ReadinessEntry::with_score(athlete, day(d), score))
            .await
            .unwrap();
    }

    let summary = HistorySummarizer::new(db.clone())
        .at(now())
        .athlete_summary(coach, athlete, None)
        .await
        .unwrap();

    assert_eq!(summary.display_name, "Jordan");
    assert_eq!(summary.avg_readiness, Some(6.0));
    assert!(summary.context_text.contains("Recent readiness: 6/10"));
}
