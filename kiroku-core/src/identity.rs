//! Identity collaborator: the minimal user registry the workout core trusts
//! for ownership checks.

use chrono::Utc;
use log::{debug, info};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db;
use crate::db::models::{Ack, NewUser, User, Workout, WorkoutTemplate};
use crate::db::operations::{self, find_by_id, get_by_id};
use crate::errors::{KirokuError, Result};

/// The acting principal behind a request.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub is_active: bool,
    pub is_admin: bool,
}

impl From<&User> for Identity {
    fn from(u: &User) -> Self {
        Identity {
            id: u.id,
            is_active: u.is_active,
            is_admin: u.is_admin,
        }
    }
}

/// Unknown users are `Unauthorized`, deactivated ones `Forbidden`.
pub async fn resolve_identity(pool: &SqlitePool, user_id: i64) -> Result<Identity> {
    let mut conn = pool.acquire().await?;
    let user = find_by_id::<User>(&mut conn, user_id)
        .await?
        .ok_or_else(|| KirokuError::Unauthorized(format!("unknown user {user_id}")))?;
    if !user.is_active {
        debug!("Rejecting inactive user {}", user_id);
        return Err(KirokuError::forbidden("inactive user"));
    }
    Ok(Identity::from(&user))
}

pub async fn create_user(pool: &SqlitePool, new: &NewUser) -> Result<User> {
    let mut conn = pool.acquire().await?;
    let user = operations::insert_user(&mut conn, new, Utc::now())
        .await
        .map_err(|e| match e {
            KirokuError::Conflict(_) => {
                KirokuError::conflict("a user with this username or email already exists")
            }
            other => other,
        })?;
    info!("Created user {} ({})", user.id, user.username);
    Ok(user)
}

pub async fn get_user(pool: &SqlitePool, user_id: i64) -> Result<User> {
    let mut conn = pool.acquire().await?;
    get_by_id::<User>(&mut conn, user_id).await
}

pub async fn set_user_active(pool: &SqlitePool, user_id: i64, active: bool) -> Result<User> {
    let mut conn = pool.acquire().await?;
    let user = operations::set_user_active(&mut conn, user_id, active).await?;
    info!("User {} active = {}", user_id, active);
    Ok(user)
}

/// Remove a user together with their workouts and templates. Workouts of
/// other users that were created from those templates are detached, not
/// deleted.
pub async fn delete_user(pool: &SqlitePool, user_id: i64) -> Result<Ack> {
    let mut tx = db::begin_write(pool).await?;
    get_by_id::<User>(&mut tx, user_id).await?;

    let workout_ids = operations::workout_ids_for_user(&mut tx, user_id).await?;
    for workout_id in &workout_ids {
        operations::delete_sets_for_workout(&mut tx, *workout_id).await?;
        operations::delete_workout_exercises(&mut tx, *workout_id).await?;
        operations::delete_by_id::<Workout>(&mut tx, *workout_id).await?;
    }

    let templates = operations::list_templates_by_owner(&mut tx, user_id).await?;
    for template in &templates {
        operations::detach_template(&mut tx, template.id).await?;
        operations::delete_template_exercises(&mut tx, template.id).await?;
        operations::delete_by_id::<WorkoutTemplate>(&mut tx, template.id).await?;
    }

    operations::delete_by_id::<User>(&mut tx, user_id).await?;
    tx.commit().await?;

    info!(
        "Deleted user {} with {} workout(s) and {} template(s)",
        user_id,
        workout_ids.len(),
        templates.len()
    );
    Ok(Ack::new("User deleted successfully"))
}
