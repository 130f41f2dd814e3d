use chrono::Utc;
use log::info;
use sqlx::{SqliteConnection, SqlitePool};

use crate::db;
use crate::db::models::{Ack, NewSet, Workout, WorkoutDetail, WorkoutPatch};
use crate::db::operations;
use crate::errors::{KirokuError, Result};
use crate::guard::{self, Completed};
use crate::templates;
use crate::workouts::load_detail;

const ACTIVE_WORKOUT_EXISTS: &str =
    "you already have an active workout, complete it before starting a new one";

async fn ensure_no_active_workout(conn: &mut SqliteConnection, owner_id: i64) -> Result<()> {
    if let Some(active) = operations::active_workout_for_user(conn, owner_id).await? {
        info!(
            "User {} already has active workout {}, refusing to start another",
            owner_id, active.id
        );
        return Err(KirokuError::conflict(ACTIVE_WORKOUT_EXISTS));
    }
    Ok(())
}

/// Writers outside these operations are held to one active workout per user
/// by the partial unique index.
fn active_conflict(e: KirokuError) -> KirokuError {
    match e {
        KirokuError::Conflict(_) => KirokuError::conflict(ACTIVE_WORKOUT_EXISTS),
        other => other,
    }
}

/// Start an empty workout for `owner_id`.
pub async fn create_blank(
    pool: &SqlitePool,
    owner_id: i64,
    name: Option<&str>,
    notes: Option<&str>,
) -> Result<WorkoutDetail> {
    let mut tx = db::begin_write(pool).await?;
    ensure_no_active_workout(&mut tx, owner_id).await?;

    let workout = operations::insert_workout(&mut tx, owner_id, name, notes, None, Utc::now())
        .await
        .map_err(active_conflict)?;
    tx.commit().await?;

    info!("Started workout {} for user {}", workout.id, owner_id);
    Ok(WorkoutDetail {
        workout,
        workout_exercises: Vec::new(),
    })
}

/// Start a workout pre-filled from a template.
///
/// The template is copied by value: each entry becomes a workout entry with
/// `max(suggested_sets, 1)` pending sets carrying the suggested reps, weight
/// and duration. Later edits to the template do not reach this workout.
pub async fn create_from_template(
    pool: &SqlitePool,
    owner_id: i64,
    template_id: i64,
    override_name: Option<&str>,
    notes: Option<&str>,
) -> Result<WorkoutDetail> {
    let mut tx = db::begin_write(pool).await?;
    let template = templates::authorize_read(&mut tx, template_id, owner_id).await?;
    ensure_no_active_workout(&mut tx, owner_id).await?;

    let name = override_name.unwrap_or(&template.name);
    let workout = operations::insert_workout(
        &mut tx,
        owner_id,
        Some(name),
        notes,
        Some(template.id),
        Utc::now(),
    )
    .await
    .map_err(active_conflict)?;

    let entries = operations::template_exercises(&mut tx, template.id).await?;
    let mut set_count = 0;
    for suggestion in &entries {
        let entry = operations::insert_workout_exercise(
            &mut tx,
            workout.id,
            suggestion.exercise_id,
            suggestion.order_index,
            None,
        )
        .await?;

        let planned = suggestion.suggested_sets.unwrap_or(1).max(1);
        for set_number in 1..=planned {
            let set = NewSet {
                set_number,
                reps: suggestion.suggested_reps,
                weight: suggestion.suggested_weight,
                duration: suggestion.suggested_duration,
                rest_duration: None,
                completed: false,
            };
            operations::insert_set(&mut tx, entry.id, &set).await?;
            set_count += 1;
        }
    }

    let detail = load_detail(&mut tx, workout).await?;
    tx.commit().await?;

    info!(
        "Started workout {} for user {} from template {} ({} exercise(s), {} set(s))",
        detail.workout.id,
        owner_id,
        template_id,
        entries.len(),
        set_count
    );
    Ok(detail)
}

/// Mark a workout as completed using the server clock.
pub async fn complete(pool: &SqlitePool, workout_id: i64, acting_user_id: i64) -> Result<WorkoutDetail> {
    let mut tx = db::begin_write(pool).await?;
    let mut workout = guard::authorize(&mut tx, workout_id, acting_user_id, Completed::Allow).await?;
    if !workout.is_active() {
        return Err(KirokuError::invalid_state("workout already completed"));
    }

    workout.completed_at = Some(Utc::now());
    let workout = operations::update_workout_row(&mut tx, &workout).await?;
    let detail = load_detail(&mut tx, workout).await?;
    tx.commit().await?;

    info!("Completed workout {} for user {}", workout_id, acting_user_id);
    Ok(detail)
}

/// Delete an active workout with all of its entries and sets.
pub async fn cancel(pool: &SqlitePool, workout_id: i64, acting_user_id: i64) -> Result<Ack> {
    let mut tx = db::begin_write(pool).await?;
    guard::authorize(&mut tx, workout_id, acting_user_id, Completed::Reject).await?;

    let sets = operations::delete_sets_for_workout(&mut tx, workout_id).await?;
    let entries = operations::delete_workout_exercises(&mut tx, workout_id).await?;
    operations::delete_by_id::<Workout>(&mut tx, workout_id).await?;
    tx.commit().await?;

    info!(
        "Cancelled workout {} ({} exercise(s), {} set(s) removed)",
        workout_id, entries, sets
    );
    Ok(Ack::new("Workout cancelled and removed successfully"))
}

/// Apply a metadata patch. Name and notes may change after completion;
/// `completed_at` may only be supplied while the workout is still active.
pub async fn update(
    pool: &SqlitePool,
    workout_id: i64,
    acting_user_id: i64,
    patch: WorkoutPatch,
) -> Result<WorkoutDetail> {
    let mut tx = db::begin_write(pool).await?;
    let mut workout = guard::authorize(&mut tx, workout_id, acting_user_id, Completed::Allow).await?;

    if let Some(completed_at) = patch.completed_at.into_option() {
        if !workout.is_active() {
            return Err(KirokuError::invalid_state(
                "completed_at cannot be changed once set",
            ));
        }
        workout.completed_at = Some(completed_at);
    }
    patch.name.apply_to(&mut workout.name);
    patch.notes.apply_to(&mut workout.notes);

    let workout = operations::update_workout_row(&mut tx, &workout).await?;
    let detail = load_detail(&mut tx, workout).await?;
    tx.commit().await?;

    info!("Updated workout {}", workout_id);
    Ok(detail)
}
