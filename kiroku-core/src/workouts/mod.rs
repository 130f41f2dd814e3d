//! Workout aggregates: a workout, its exercise entries and their sets.
//!
//! Every mutation runs in one transaction, goes through [`crate::guard`]
//! first, and hands back the refreshed aggregate (or the touched entry/set).
//! A user has at most one active workout; the store enforces this with a
//! partial unique index in addition to the check done here.

mod exercises;
mod lifecycle;
mod sets;

pub use exercises::{add_exercise, update_exercise_notes, update_notes};
pub use lifecycle::{cancel, complete, create_blank, create_from_template, update};
pub use sets::{add_set, delete_set, update_set};

use log::debug;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;

use crate::catalog::ExerciseLookup;
use crate::db::models::{ExerciseSet, Page, Workout, WorkoutDetail, WorkoutExercise, WorkoutExerciseDetail};
use crate::db::operations;
use crate::errors::{KirokuError, Result};
use crate::guard;

pub(crate) async fn load_detail(conn: &mut SqliteConnection, workout: Workout) -> Result<WorkoutDetail> {
    let entries = operations::workout_exercises(conn, workout.id).await?;
    let mut sets_by_entry: HashMap<i64, Vec<ExerciseSet>> = HashMap::new();
    for set in operations::sets_for_workout(conn, workout.id).await? {
        sets_by_entry
            .entry(set.workout_exercise_id)
            .or_default()
            .push(set);
    }

    let mut lookup = ExerciseLookup::new();
    let mut workout_exercises = Vec::with_capacity(entries.len());
    for entry in entries {
        let exercise = lookup.get(conn, entry.exercise_id).await?;
        let sets = sets_by_entry.remove(&entry.id).unwrap_or_default();
        workout_exercises.push(WorkoutExerciseDetail {
            entry,
            exercise,
            sets,
        });
    }

    Ok(WorkoutDetail {
        workout,
        workout_exercises,
    })
}

async fn load_details(conn: &mut SqliteConnection, workouts: Vec<Workout>) -> Result<Vec<WorkoutDetail>> {
    let mut details = Vec::with_capacity(workouts.len());
    for workout in workouts {
        details.push(load_detail(conn, workout).await?);
    }
    Ok(details)
}

pub(crate) async fn load_entry_detail(
    conn: &mut SqliteConnection,
    entry: WorkoutExercise,
) -> Result<WorkoutExerciseDetail> {
    let exercise = ExerciseLookup::new().get(conn, entry.exercise_id).await?;
    let sets = operations::sets_for_entry(conn, entry.id).await?;
    Ok(WorkoutExerciseDetail {
        entry,
        exercise,
        sets,
    })
}

/// The entry `entry_id`, provided it belongs to `workout_id`.
pub(crate) async fn entry_in_workout(
    conn: &mut SqliteConnection,
    workout_id: i64,
    entry_id: i64,
) -> Result<WorkoutExercise> {
    operations::find_workout_exercise(conn, workout_id, entry_id)
        .await?
        .ok_or_else(|| {
            KirokuError::NotFound(format!("exercise {entry_id} in workout {workout_id}"))
        })
}

/// Fetch a workout with its entries and sets. Only the owner may read it.
pub async fn get_workout(pool: &SqlitePool, workout_id: i64, reader_id: i64) -> Result<WorkoutDetail> {
    let mut conn = pool.acquire().await?;
    let workout = guard::authorize_read(&mut conn, workout_id, reader_id).await?;
    load_detail(&mut conn, workout).await
}

/// All workouts of a user, most recently started first.
pub async fn list_workouts(pool: &SqlitePool, user_id: i64, page: Page) -> Result<Vec<WorkoutDetail>> {
    let mut conn = pool.acquire().await?;
    let workouts = operations::workouts_by_user(&mut conn, user_id, page).await?;
    load_details(&mut conn, workouts).await
}

pub async fn get_active_workout(pool: &SqlitePool, user_id: i64) -> Result<WorkoutDetail> {
    let mut conn = pool.acquire().await?;
    let workout = operations::active_workout_for_user(&mut conn, user_id)
        .await?
        .ok_or_else(|| KirokuError::NotFound(format!("active workout for user {user_id}")))?;
    debug!("User {} has active workout {}", user_id, workout.id);
    load_detail(&mut conn, workout).await
}

/// Completed workouts of a user, most recently completed first.
pub async fn workout_history(pool: &SqlitePool, user_id: i64, page: Page) -> Result<Vec<WorkoutDetail>> {
    let mut conn = pool.acquire().await?;
    let workouts = operations::completed_workouts_by_user(&mut conn, user_id, page).await?;
    load_details(&mut conn, workouts).await
}
