use log::info;
use sqlx::{SqliteConnection, SqlitePool};

use crate::db;
use crate::db::models::{Ack, ExerciseSet, NewSet, SetPatch};
use crate::db::operations;
use crate::errors::{KirokuError, Result};
use crate::guard::{self, Completed};
use crate::workouts::entry_in_workout;

async fn set_in_entry(conn: &mut SqliteConnection, entry_id: i64, set_id: i64) -> Result<ExerciseSet> {
    operations::find_set(conn, entry_id, set_id)
        .await?
        .ok_or_else(|| KirokuError::NotFound(format!("exercise set {set_id} in exercise {entry_id}")))
}

pub async fn add_set(
    pool: &SqlitePool,
    workout_id: i64,
    acting_user_id: i64,
    entry_id: i64,
    new: &NewSet,
) -> Result<ExerciseSet> {
    let mut tx = db::begin_write(pool).await?;
    guard::authorize(&mut tx, workout_id, acting_user_id, Completed::Reject).await?;
    entry_in_workout(&mut tx, workout_id, entry_id).await?;

    let set = operations::insert_set(&mut tx, entry_id, new).await?;
    tx.commit().await?;

    info!(
        "Added set {} to exercise {} in workout {}",
        set.set_number, entry_id, workout_id
    );
    Ok(set)
}

/// Partial update: fields absent from `patch` keep their stored value.
pub async fn update_set(
    pool: &SqlitePool,
    workout_id: i64,
    acting_user_id: i64,
    entry_id: i64,
    set_id: i64,
    patch: SetPatch,
) -> Result<ExerciseSet> {
    let mut tx = db::begin_write(pool).await?;
    guard::authorize(&mut tx, workout_id, acting_user_id, Completed::Reject).await?;
    entry_in_workout(&mut tx, workout_id, entry_id).await?;

    let mut set = set_in_entry(&mut tx, entry_id, set_id).await?;
    patch.apply_to(&mut set);
    let set = operations::update_set_row(&mut tx, &set).await?;
    tx.commit().await?;

    info!("Updated set {} in workout {}", set_id, workout_id);
    Ok(set)
}

pub async fn delete_set(
    pool: &SqlitePool,
    workout_id: i64,
    acting_user_id: i64,
    entry_id: i64,
    set_id: i64,
) -> Result<Ack> {
    let mut tx = db::begin_write(pool).await?;
    guard::authorize(&mut tx, workout_id, acting_user_id, Completed::Reject).await?;
    entry_in_workout(&mut tx, workout_id, entry_id).await?;
    set_in_entry(&mut tx, entry_id, set_id).await?;

    operations::delete_by_id::<ExerciseSet>(&mut tx, set_id).await?;
    tx.commit().await?;

    info!("Deleted set {} from workout {}", set_id, workout_id);
    Ok(Ack::new("Exercise set deleted successfully"))
}
