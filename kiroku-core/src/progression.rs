//! Per-exercise performance history drawn from completed workouts.

use log::debug;
use sqlx::SqlitePool;

use crate::db::models::{Progression, ProgressionEntry, ProgressionSet};
use crate::db::operations;
use crate::errors::Result;

pub const DEFAULT_PROGRESSION_LIMIT: i64 = 10;

/// Up to `limit` occurrences of `exercise_id` in the completed workouts of
/// `user_id`, newest workout first. Active workouts are not included.
pub async fn get_progression(
    pool: &SqlitePool,
    user_id: i64,
    exercise_id: i64,
    limit: i64,
) -> Result<Progression> {
    let mut conn = pool.acquire().await?;
    let rows = operations::completed_entries_for_exercise(&mut conn, user_id, exercise_id, limit).await?;

    let mut progression = Vec::with_capacity(rows.len());
    for row in rows {
        let sets = operations::sets_for_entry(&mut conn, row.id)
            .await?
            .into_iter()
            .map(ProgressionSet::from)
            .collect();
        progression.push(ProgressionEntry {
            workout_id: row.workout_id,
            date: row.started_at,
            sets,
        });
    }

    debug!(
        "Progression for user {} exercise {}: {} entr(ies)",
        user_id,
        exercise_id,
        progression.len()
    );
    Ok(Progression {
        exercise_id,
        progression,
    })
}
