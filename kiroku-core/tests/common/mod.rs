#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use kiroku::catalog;
use kiroku::db::{self, models::*, operations};
use kiroku::identity;
use sqlx::SqlitePool;

pub async fn setup() -> anyhow::Result<SqlitePool> {
    db::connect_in_memory().await
}

pub async fn user(pool: &SqlitePool, name: &str) -> anyhow::Result<i64> {
    let user = identity::create_user(
        pool,
        &NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            is_admin: false,
        },
    )
    .await?;
    Ok(user.id)
}

pub async fn exercise(pool: &SqlitePool, name: &str) -> anyhow::Result<i64> {
    let exercise = catalog::create_exercise(
        pool,
        &NewExercise {
            name: name.to_string(),
            ..Default::default()
        },
    )
    .await?;
    Ok(exercise.id)
}

pub fn suggestion(exercise_id: i64, order_index: i64, sets: Option<i64>, reps: Option<i64>) -> NewTemplateExercise {
    NewTemplateExercise {
        exercise_id,
        order_index,
        suggested_sets: sets,
        suggested_reps: reps,
        ..Default::default()
    }
}

pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap()
}

/// Insert an already completed workout started on `day`, with one entry for
/// `exercise_id` holding one set per element of `reps`.
pub async fn completed_workout(
    pool: &SqlitePool,
    user_id: i64,
    exercise_id: i64,
    day: u32,
    reps: &[i64],
) -> anyhow::Result<i64> {
    let mut conn = pool.acquire().await?;
    let mut workout = operations::insert_workout(&mut conn, user_id, Some("logged"), None, None, at(day)).await?;
    let entry = operations::insert_workout_exercise(&mut conn, workout.id, exercise_id, 0, None).await?;
    for (i, r) in reps.iter().enumerate() {
        let set = NewSet {
            set_number: i as i64 + 1,
            reps: Some(*r),
            weight: Some(60.0),
            completed: true,
            ..Default::default()
        };
        operations::insert_set(&mut conn, entry.id, &set).await?;
    }
    workout.completed_at = Some(at(day) + chrono::Duration::hours(1));
    operations::update_workout_row(&mut conn, &workout).await?;
    Ok(workout.id)
}

pub async fn count(pool: &SqlitePool, sql: &str) -> anyhow::Result<i64> {
    Ok(sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await?)
}
