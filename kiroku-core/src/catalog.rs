use chrono::Utc;
use log::info;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;

use crate::db;
use crate::db::models::{Exercise, NewExercise, Page};
use crate::db::operations::{self, get_by_id, list_page};
use crate::errors::Result;

pub async fn create_exercise(pool: &SqlitePool, new: &NewExercise) -> Result<Exercise> {
    let mut conn = pool.acquire().await?;
    let exercise = operations::insert_exercise(&mut conn, new, Utc::now()).await?;
    info!("Created exercise {} ({})", exercise.id, exercise.name);
    Ok(exercise)
}

pub async fn get_exercise(pool: &SqlitePool, exercise_id: i64) -> Result<Exercise> {
    let mut conn = pool.acquire().await?;
    get_by_id::<Exercise>(&mut conn, exercise_id).await
}

pub async fn list_exercises(pool: &SqlitePool, page: Page) -> Result<Vec<Exercise>> {
    let mut conn = pool.acquire().await?;
    list_page::<Exercise>(&mut conn, page).await
}

pub async fn get_or_create_exercise(pool: &SqlitePool, name: &str) -> Result<Exercise> {
    let mut tx = db::begin_write(pool).await?;
    if let Some(exercise) = operations::find_exercise_by_name(&mut tx, name).await? {
        return Ok(exercise);
    }
    let exercise = operations::insert_exercise(
        &mut tx,
        &NewExercise {
            name: name.to_string(),
            ..Default::default()
        },
        Utc::now(),
    )
    .await?;
    tx.commit().await?;
    info!("Created exercise {} ({})", exercise.id, exercise.name);
    Ok(exercise)
}

/// Memoising lookup used while hydrating aggregates, so an exercise that
/// appears in several entries is read once.
pub(crate) struct ExerciseLookup {
    cache: HashMap<i64, Exercise>,
}

impl ExerciseLookup {
    pub(crate) fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    pub(crate) async fn get(&mut self, conn: &mut SqliteConnection, exercise_id: i64) -> Result<Exercise> {
        if let Some(exercise) = self.cache.get(&exercise_id) {
            return Ok(exercise.clone());
        }
        let exercise = get_by_id::<Exercise>(conn, exercise_id).await?;
        self.cache.insert(exercise_id, exercise.clone());
        Ok(exercise)
    }
}
