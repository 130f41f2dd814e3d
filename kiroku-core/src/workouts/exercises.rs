use log::info;
use sqlx::SqlitePool;

use crate::db;
use crate::db::models::{NewWorkoutExercise, WorkoutDetail, WorkoutExerciseDetail};
use crate::db::operations;
use crate::errors::Result;
use crate::guard::{self, Completed};
use crate::workouts::{entry_in_workout, load_detail, load_entry_detail};

/// Append an exercise entry, with any initial sets, to an active workout.
pub async fn add_exercise(
    pool: &SqlitePool,
    workout_id: i64,
    acting_user_id: i64,
    new: &NewWorkoutExercise,
) -> Result<WorkoutExerciseDetail> {
    let mut tx = db::begin_write(pool).await?;
    guard::authorize(&mut tx, workout_id, acting_user_id, Completed::Reject).await?;

    let entry = operations::insert_workout_exercise(
        &mut tx,
        workout_id,
        new.exercise_id,
        new.order_index,
        new.notes.as_deref(),
    )
    .await?;
    for set in &new.sets {
        operations::insert_set(&mut tx, entry.id, set).await?;
    }
    let detail = load_entry_detail(&mut tx, entry).await?;
    tx.commit().await?;

    info!(
        "Added exercise {} to workout {} with {} set(s)",
        detail.entry.exercise_id,
        workout_id,
        detail.sets.len()
    );
    Ok(detail)
}

/// Replace the workout notes. `None` clears them.
pub async fn update_notes(
    pool: &SqlitePool,
    workout_id: i64,
    acting_user_id: i64,
    notes: Option<String>,
) -> Result<WorkoutDetail> {
    let mut tx = db::begin_write(pool).await?;
    let mut workout = guard::authorize(&mut tx, workout_id, acting_user_id, Completed::Reject).await?;

    workout.notes = notes;
    let workout = operations::update_workout_row(&mut tx, &workout).await?;
    let detail = load_detail(&mut tx, workout).await?;
    tx.commit().await?;

    info!("Updated notes of workout {}", workout_id);
    Ok(detail)
}

/// Replace the notes of one exercise entry. `None` clears them.
pub async fn update_exercise_notes(
    pool: &SqlitePool,
    workout_id: i64,
    acting_user_id: i64,
    entry_id: i64,
    notes: Option<String>,
) -> Result<WorkoutExerciseDetail> {
    let mut tx = db::begin_write(pool).await?;
    guard::authorize(&mut tx, workout_id, acting_user_id, Completed::Reject).await?;
    entry_in_workout(&mut tx, workout_id, entry_id).await?;

    let entry = operations::update_workout_exercise_notes(&mut tx, entry_id, notes.as_deref()).await?;
    let detail = load_entry_detail(&mut tx, entry).await?;
    tx.commit().await?;

    info!("Updated notes of exercise {} in workout {}", entry_id, workout_id);
    Ok(detail)
}
