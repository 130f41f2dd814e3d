//! Ownership and lifecycle checks run before touching a workout.

use log::debug;
use sqlx::SqliteConnection;

use crate::db::models::Workout;
use crate::db::operations::find_by_id;
use crate::errors::{KirokuError, Result};

/// Whether an operation may run against a workout that is already completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completed {
    Allow,
    Reject,
}

/// Load `workout_id` for a mutation by `acting_user_id`.
///
/// Fails with `NotFound` when the workout is missing, `Forbidden` when it
/// belongs to someone else, and `InvalidState` when it is completed and
/// `completed` is [`Completed::Reject`]. The loaded row is returned so the
/// caller does not fetch it again.
pub async fn authorize(
    conn: &mut SqliteConnection,
    workout_id: i64,
    acting_user_id: i64,
    completed: Completed,
) -> Result<Workout> {
    let workout = authorize_read(conn, workout_id, acting_user_id).await?;
    if completed == Completed::Reject && !workout.is_active() {
        debug!("Workout {} is completed, rejecting mutation", workout_id);
        return Err(KirokuError::invalid_state("cannot modify completed workout"));
    }
    Ok(workout)
}

/// Read access: only the owner may see a workout, whatever template it came
/// from.
pub async fn authorize_read(
    conn: &mut SqliteConnection,
    workout_id: i64,
    acting_user_id: i64,
) -> Result<Workout> {
    let workout = find_by_id::<Workout>(conn, workout_id)
        .await?
        .ok_or_else(|| KirokuError::not_found("workout", workout_id))?;
    if workout.user_id != acting_user_id {
        debug!(
            "User {} is not the owner of workout {}",
            acting_user_id, workout_id
        );
        return Err(KirokuError::forbidden("not enough permissions"));
    }
    Ok(workout)
}
