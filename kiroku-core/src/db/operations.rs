//! Row-level queries. Everything here takes a bare connection so callers can
//! run it either on a pooled connection or inside an open transaction.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteConnection};

use crate::db::models::{
    Exercise, ExerciseSet, NewExercise, NewSet, NewTemplateExercise, NewUser, Page,
    TemplateExercise, User, Workout, WorkoutExercise, WorkoutTemplate,
};
use crate::errors::{KirokuError, Result};

/// A table whose rows are addressed by an integer `id`.
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static {
    const TABLE: &'static str;
    /// Human-readable name used in `NotFound` messages.
    const NAME: &'static str;
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const NAME: &'static str = "user";
}

impl Entity for Exercise {
    const TABLE: &'static str = "exercises";
    const NAME: &'static str = "exercise";
}

impl Entity for WorkoutTemplate {
    const TABLE: &'static str = "workout_templates";
    const NAME: &'static str = "template";
}

impl Entity for TemplateExercise {
    const TABLE: &'static str = "workout_template_exercises";
    const NAME: &'static str = "template exercise";
}

impl Entity for Workout {
    const TABLE: &'static str = "workouts";
    const NAME: &'static str = "workout";
}

impl Entity for WorkoutExercise {
    const TABLE: &'static str = "workout_exercises";
    const NAME: &'static str = "workout exercise";
}

impl Entity for ExerciseSet {
    const TABLE: &'static str = "exercise_sets";
    const NAME: &'static str = "exercise set";
}

// Generic
pub async fn find_by_id<E: Entity>(conn: &mut SqliteConnection, id: i64) -> Result<Option<E>> {
    let query = format!("SELECT * FROM {} WHERE id = ?1", E::TABLE);
    sqlx::query_as::<_, E>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Into::into)
}

pub async fn get_by_id<E: Entity>(conn: &mut SqliteConnection, id: i64) -> Result<E> {
    find_by_id::<E>(conn, id)
        .await?
        .ok_or_else(|| KirokuError::not_found(E::NAME, id))
}

pub async fn delete_by_id<E: Entity>(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let query = format!("DELETE FROM {} WHERE id = ?1", E::TABLE);
    let result = sqlx::query(&query).bind(id).execute(&mut *conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_page<E: Entity>(conn: &mut SqliteConnection, page: Page) -> Result<Vec<E>> {
    let query = format!("SELECT * FROM {} ORDER BY id LIMIT ?1 OFFSET ?2", E::TABLE);
    sqlx::query_as::<_, E>(&query)
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&mut *conn)
        .await
        .map_err(Into::into)
}

// Users
pub async fn insert_user(
    conn: &mut SqliteConnection,
    new: &NewUser,
    created_at: DateTime<Utc>,
) -> Result<User> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email, is_active, is_admin, created_at)
         VALUES (?1, ?2, 1, ?3, ?4) RETURNING *",
    )
    .bind(&new.username)
    .bind(&new.email)
    .bind(new.is_admin)
    .bind(created_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn set_user_active(conn: &mut SqliteConnection, user_id: i64, active: bool) -> Result<User> {
    sqlx::query_as::<_, User>("UPDATE users SET is_active = ?1 WHERE id = ?2 RETURNING *")
        .bind(active)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| KirokuError::not_found(User::NAME, user_id))
}

// Exercises
pub async fn insert_exercise(
    conn: &mut SqliteConnection,
    new: &NewExercise,
    created_at: DateTime<Utc>,
) -> Result<Exercise> {
    sqlx::query_as::<_, Exercise>(
        "INSERT INTO exercises
            (name, description, exercise_type, muscle_group, equipment, instructions, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7) RETURNING *",
    )
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.exercise_type)
    .bind(&new.muscle_group)
    .bind(&new.equipment)
    .bind(&new.instructions)
    .bind(created_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn find_exercise_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Exercise>> {
    sqlx::query_as::<_, Exercise>("SELECT * FROM exercises WHERE name = ?1 ORDER BY id LIMIT 1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Into::into)
}

// Templates
pub async fn insert_template(
    conn: &mut SqliteConnection,
    created_by: i64,
    name: &str,
    description: Option<&str>,
    is_public: bool,
    created_at: DateTime<Utc>,
) -> Result<WorkoutTemplate> {
    sqlx::query_as::<_, WorkoutTemplate>(
        "INSERT INTO workout_templates (name, description, created_by, is_public, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5) RETURNING *",
    )
    .bind(name)
    .bind(description)
    .bind(created_by)
    .bind(is_public)
    .bind(created_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn update_template_row(
    conn: &mut SqliteConnection,
    template: &WorkoutTemplate,
) -> Result<WorkoutTemplate> {
    sqlx::query_as::<_, WorkoutTemplate>(
        "UPDATE workout_templates
         SET name = ?1, description = ?2, is_public = ?3, updated_at = ?4
         WHERE id = ?5 RETURNING *",
    )
    .bind(&template.name)
    .bind(&template.description)
    .bind(template.is_public)
    .bind(template.updated_at)
    .bind(template.id)
    .fetch_one(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn touch_template(conn: &mut SqliteConnection, template_id: i64, at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE workout_templates SET updated_at = ?1 WHERE id = ?2")
        .bind(at)
        .bind(template_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn list_public_templates(conn: &mut SqliteConnection, page: Page) -> Result<Vec<WorkoutTemplate>> {
    sqlx::query_as::<_, WorkoutTemplate>(
        "SELECT * FROM workout_templates WHERE is_public = 1 ORDER BY id LIMIT ?1 OFFSET ?2",
    )
    .bind(page.limit)
    .bind(page.skip)
    .fetch_all(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn list_templates_by_owner(conn: &mut SqliteConnection, owner_id: i64) -> Result<Vec<WorkoutTemplate>> {
    sqlx::query_as::<_, WorkoutTemplate>(
        "SELECT * FROM workout_templates WHERE created_by = ?1 ORDER BY id",
    )
    .bind(owner_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn insert_template_exercise(
    conn: &mut SqliteConnection,
    template_id: i64,
    new: &NewTemplateExercise,
) -> Result<TemplateExercise> {
    sqlx::query_as::<_, TemplateExercise>(
        "INSERT INTO workout_template_exercises
            (template_id, exercise_id, order_index, suggested_sets, suggested_reps, suggested_weight, suggested_duration)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING *",
    )
    .bind(template_id)
    .bind(new.exercise_id)
    .bind(new.order_index)
    .bind(new.suggested_sets)
    .bind(new.suggested_reps)
    .bind(new.suggested_weight)
    .bind(new.suggested_duration)
    .fetch_one(&mut *conn)
    .await
    .map_err(Into::into)
}

/// Entries of a template in display order.
pub async fn template_exercises(conn: &mut SqliteConnection, template_id: i64) -> Result<Vec<TemplateExercise>> {
    sqlx::query_as::<_, TemplateExercise>(
        "SELECT * FROM workout_template_exercises WHERE template_id = ?1 ORDER BY order_index, id",
    )
    .bind(template_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn delete_template_exercise(
    conn: &mut SqliteConnection,
    template_id: i64,
    entry_id: i64,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM workout_template_exercises WHERE template_id = ?1 AND id = ?2")
        .bind(template_id)
        .bind(entry_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_template_exercises(conn: &mut SqliteConnection, template_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM workout_template_exercises WHERE template_id = ?1")
        .bind(template_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Unlink workouts that were created from `template_id`. Their copied
/// contents are left as they are.
pub async fn detach_template(conn: &mut SqliteConnection, template_id: i64) -> Result<u64> {
    let result = sqlx::query("UPDATE workouts SET template_id = NULL WHERE template_id = ?1")
        .bind(template_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

// Workouts
pub async fn insert_workout(
    conn: &mut SqliteConnection,
    user_id: i64,
    name: Option<&str>,
    notes: Option<&str>,
    template_id: Option<i64>,
    started_at: DateTime<Utc>,
) -> Result<Workout> {
    sqlx::query_as::<_, Workout>(
        "INSERT INTO workouts (user_id, name, notes, template_id, started_at, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, NULL) RETURNING *",
    )
    .bind(user_id)
    .bind(name)
    .bind(notes)
    .bind(template_id)
    .bind(started_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn update_workout_row(conn: &mut SqliteConnection, workout: &Workout) -> Result<Workout> {
    sqlx::query_as::<_, Workout>(
        "UPDATE workouts SET name = ?1, notes = ?2, completed_at = ?3 WHERE id = ?4 RETURNING *",
    )
    .bind(&workout.name)
    .bind(&workout.notes)
    .bind(workout.completed_at)
    .bind(workout.id)
    .fetch_one(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn active_workout_for_user(conn: &mut SqliteConnection, user_id: i64) -> Result<Option<Workout>> {
    sqlx::query_as::<_, Workout>(
        "SELECT * FROM workouts WHERE user_id = ?1 AND completed_at IS NULL
         ORDER BY started_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn workouts_by_user(conn: &mut SqliteConnection, user_id: i64, page: Page) -> Result<Vec<Workout>> {
    sqlx::query_as::<_, Workout>(
        "SELECT * FROM workouts WHERE user_id = ?1 ORDER BY started_at DESC, id DESC LIMIT ?2 OFFSET ?3",
    )
    .bind(user_id)
    .bind(page.limit)
    .bind(page.skip)
    .fetch_all(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn completed_workouts_by_user(
    conn: &mut SqliteConnection,
    user_id: i64,
    page: Page,
) -> Result<Vec<Workout>> {
    sqlx::query_as::<_, Workout>(
        "SELECT * FROM workouts WHERE user_id = ?1 AND completed_at IS NOT NULL
         ORDER BY completed_at DESC, id DESC LIMIT ?2 OFFSET ?3",
    )
    .bind(user_id)
    .bind(page.limit)
    .bind(page.skip)
    .fetch_all(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn workout_ids_for_user(conn: &mut SqliteConnection, user_id: i64) -> Result<Vec<i64>> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM workouts WHERE user_id = ?1")
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(Into::into)
}

// Workout exercise entries
pub async fn insert_workout_exercise(
    conn: &mut SqliteConnection,
    workout_id: i64,
    exercise_id: i64,
    order_index: i64,
    notes: Option<&str>,
) -> Result<WorkoutExercise> {
    sqlx::query_as::<_, WorkoutExercise>(
        "INSERT INTO workout_exercises (workout_id, exercise_id, order_index, notes)
         VALUES (?1, ?2, ?3, ?4) RETURNING *",
    )
    .bind(workout_id)
    .bind(exercise_id)
    .bind(order_index)
    .bind(notes)
    .fetch_one(&mut *conn)
    .await
    .map_err(Into::into)
}

/// Entries of a workout in display order.
pub async fn workout_exercises(conn: &mut SqliteConnection, workout_id: i64) -> Result<Vec<WorkoutExercise>> {
    sqlx::query_as::<_, WorkoutExercise>(
        "SELECT * FROM workout_exercises WHERE workout_id = ?1 ORDER BY order_index, id",
    )
    .bind(workout_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn find_workout_exercise(
    conn: &mut SqliteConnection,
    workout_id: i64,
    entry_id: i64,
) -> Result<Option<WorkoutExercise>> {
    sqlx::query_as::<_, WorkoutExercise>(
        "SELECT * FROM workout_exercises WHERE workout_id = ?1 AND id = ?2",
    )
    .bind(workout_id)
    .bind(entry_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn update_workout_exercise_notes(
    conn: &mut SqliteConnection,
    entry_id: i64,
    notes: Option<&str>,
) -> Result<WorkoutExercise> {
    sqlx::query_as::<_, WorkoutExercise>(
        "UPDATE workout_exercises SET notes = ?1 WHERE id = ?2 RETURNING *",
    )
    .bind(notes)
    .bind(entry_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn delete_workout_exercises(conn: &mut SqliteConnection, workout_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM workout_exercises WHERE workout_id = ?1")
        .bind(workout_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

// Sets
pub async fn insert_set(conn: &mut SqliteConnection, entry_id: i64, new: &NewSet) -> Result<ExerciseSet> {
    sqlx::query_as::<_, ExerciseSet>(
        "INSERT INTO exercise_sets
            (workout_exercise_id, set_number, reps, weight, duration, rest_duration, completed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING *",
    )
    .bind(entry_id)
    .bind(new.set_number)
    .bind(new.reps)
    .bind(new.weight)
    .bind(new.duration)
    .bind(new.rest_duration)
    .bind(new.completed)
    .fetch_one(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn sets_for_entry(conn: &mut SqliteConnection, entry_id: i64) -> Result<Vec<ExerciseSet>> {
    sqlx::query_as::<_, ExerciseSet>(
        "SELECT * FROM exercise_sets WHERE workout_exercise_id = ?1 ORDER BY set_number, id",
    )
    .bind(entry_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn sets_for_workout(conn: &mut SqliteConnection, workout_id: i64) -> Result<Vec<ExerciseSet>> {
    sqlx::query_as::<_, ExerciseSet>(
        "SELECT s.* FROM exercise_sets s
         JOIN workout_exercises we ON we.id = s.workout_exercise_id
         WHERE we.workout_id = ?1
         ORDER BY s.set_number, s.id",
    )
    .bind(workout_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn find_set(conn: &mut SqliteConnection, entry_id: i64, set_id: i64) -> Result<Option<ExerciseSet>> {
    sqlx::query_as::<_, ExerciseSet>(
        "SELECT * FROM exercise_sets WHERE workout_exercise_id = ?1 AND id = ?2",
    )
    .bind(entry_id)
    .bind(set_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn update_set_row(conn: &mut SqliteConnection, set: &ExerciseSet) -> Result<ExerciseSet> {
    sqlx::query_as::<_, ExerciseSet>(
        "UPDATE exercise_sets
         SET set_number = ?1, reps = ?2, weight = ?3, duration = ?4, rest_duration = ?5, completed = ?6
         WHERE id = ?7 RETURNING *",
    )
    .bind(set.set_number)
    .bind(set.reps)
    .bind(set.weight)
    .bind(set.duration)
    .bind(set.rest_duration)
    .bind(set.completed)
    .bind(set.id)
    .fetch_one(&mut *conn)
    .await
    .map_err(Into::into)
}

pub async fn delete_sets_for_workout(conn: &mut SqliteConnection, workout_id: i64) -> Result<u64> {
    let result = sqlx::query(
        "DELETE FROM exercise_sets WHERE workout_exercise_id IN
            (SELECT id FROM workout_exercises WHERE workout_id = ?1)",
    )
    .bind(workout_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

// Progression
#[derive(FromRow, Debug, Clone)]
pub struct CompletedEntryRow {
    pub id: i64,
    pub workout_id: i64,
    pub started_at: DateTime<Utc>,
}

/// Entries for `exercise_id` in the user's completed workouts, newest first.
pub async fn completed_entries_for_exercise(
    conn: &mut SqliteConnection,
    user_id: i64,
    exercise_id: i64,
    limit: i64,
) -> Result<Vec<CompletedEntryRow>> {
    sqlx::query_as::<_, CompletedEntryRow>(
        "SELECT we.id, we.workout_id, w.started_at
         FROM workout_exercises we
         JOIN workouts w ON w.id = we.workout_id
         WHERE w.user_id = ?1 AND we.exercise_id = ?2 AND w.completed_at IS NOT NULL
         ORDER BY w.started_at DESC, we.id DESC
         LIMIT ?3",
    )
    .bind(user_id)
    .bind(exercise_id)
    .bind(limit)
    .fetch_all(&mut *conn)
    .await
    .map_err(Into::into)
}
