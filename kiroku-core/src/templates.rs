//! Template catalog: reusable workout blueprints and their suggested
//! exercises.
//!
//! Templates are readable by their owner, and by everyone once public. Only
//! the owner may change or delete one. Entry `order_index` values are stored
//! as given; gaps and duplicates are allowed.

use chrono::Utc;
use log::{debug, info};
use sqlx::{SqliteConnection, SqlitePool};

use crate::catalog::ExerciseLookup;
use crate::db;
use crate::db::models::{
    Ack, NewTemplate, NewTemplateExercise, Page, TemplateDetail, TemplateEntryDetail,
    TemplatePatch, WorkoutTemplate,
};
use crate::db::operations::{self, find_by_id};
use crate::errors::{KirokuError, Result};

impl WorkoutTemplate {
    pub fn is_readable_by(&self, user_id: i64) -> bool {
        self.is_public || self.created_by == user_id
    }
}

pub(crate) async fn load_detail(
    conn: &mut SqliteConnection,
    template: WorkoutTemplate,
) -> Result<TemplateDetail> {
    let entries = operations::template_exercises(conn, template.id).await?;
    let mut lookup = ExerciseLookup::new();
    let mut template_exercises = Vec::with_capacity(entries.len());
    for entry in entries {
        let exercise = lookup.get(conn, entry.exercise_id).await?;
        template_exercises.push(TemplateEntryDetail { entry, exercise });
    }
    Ok(TemplateDetail {
        template,
        template_exercises,
    })
}

async fn load_details(
    conn: &mut SqliteConnection,
    templates: Vec<WorkoutTemplate>,
) -> Result<Vec<TemplateDetail>> {
    let mut details = Vec::with_capacity(templates.len());
    for template in templates {
        details.push(load_detail(conn, template).await?);
    }
    Ok(details)
}

/// Load a template for reading by `reader_id`.
pub(crate) async fn authorize_read(
    conn: &mut SqliteConnection,
    template_id: i64,
    reader_id: i64,
) -> Result<WorkoutTemplate> {
    let template = find_by_id::<WorkoutTemplate>(conn, template_id)
        .await?
        .ok_or_else(|| KirokuError::not_found("template", template_id))?;
    if !template.is_readable_by(reader_id) {
        debug!(
            "User {} denied read access to private template {}",
            reader_id, template_id
        );
        return Err(KirokuError::forbidden("not enough permissions"));
    }
    Ok(template)
}

async fn authorize_write(
    conn: &mut SqliteConnection,
    template_id: i64,
    acting_user_id: i64,
) -> Result<WorkoutTemplate> {
    let template = find_by_id::<WorkoutTemplate>(conn, template_id)
        .await?
        .ok_or_else(|| KirokuError::not_found("template", template_id))?;
    if template.created_by != acting_user_id {
        return Err(KirokuError::forbidden("not enough permissions"));
    }
    Ok(template)
}

pub async fn create_template(
    pool: &SqlitePool,
    owner_id: i64,
    new: &NewTemplate,
) -> Result<TemplateDetail> {
    let mut tx = db::begin_write(pool).await?;
    let template = operations::insert_template(
        &mut tx,
        owner_id,
        &new.name,
        new.description.as_deref(),
        new.is_public,
        Utc::now(),
    )
    .await?;
    for entry in &new.exercises {
        operations::insert_template_exercise(&mut tx, template.id, entry).await?;
    }
    let detail = load_detail(&mut tx, template).await?;
    tx.commit().await?;

    info!(
        "Created template {} for user {} with {} exercise(s)",
        detail.template.id,
        owner_id,
        detail.template_exercises.len()
    );
    Ok(detail)
}

/// Fetch a template as `reader_id`: private templates of other users are
/// `Forbidden`.
pub async fn get_template_for(
    pool: &SqlitePool,
    template_id: i64,
    reader_id: i64,
) -> Result<TemplateDetail> {
    let mut conn = pool.acquire().await?;
    let template = authorize_read(&mut conn, template_id, reader_id).await?;
    load_detail(&mut conn, template).await
}

pub async fn list_public_templates(pool: &SqlitePool, page: Page) -> Result<Vec<TemplateDetail>> {
    let mut conn = pool.acquire().await?;
    let templates = operations::list_public_templates(&mut conn, page).await?;
    load_details(&mut conn, templates).await
}

pub async fn list_templates_by_owner(pool: &SqlitePool, owner_id: i64) -> Result<Vec<TemplateDetail>> {
    let mut conn = pool.acquire().await?;
    let templates = operations::list_templates_by_owner(&mut conn, owner_id).await?;
    load_details(&mut conn, templates).await
}

pub async fn update_template(
    pool: &SqlitePool,
    template_id: i64,
    acting_user_id: i64,
    patch: TemplatePatch,
) -> Result<TemplateDetail> {
    let mut tx = db::begin_write(pool).await?;
    let mut template = authorize_write(&mut tx, template_id, acting_user_id).await?;

    patch.name.apply_to(&mut template.name);
    patch.description.apply_to(&mut template.description);
    patch.is_public.apply_to(&mut template.is_public);
    template.updated_at = Some(Utc::now());

    let template = operations::update_template_row(&mut tx, &template).await?;
    let detail = load_detail(&mut tx, template).await?;
    tx.commit().await?;

    info!("Updated template {}", template_id);
    Ok(detail)
}

pub async fn add_template_exercise(
    pool: &SqlitePool,
    template_id: i64,
    acting_user_id: i64,
    new: &NewTemplateExercise,
) -> Result<TemplateEntryDetail> {
    let mut tx = db::begin_write(pool).await?;
    authorize_write(&mut tx, template_id, acting_user_id).await?;

    let entry = operations::insert_template_exercise(&mut tx, template_id, new).await?;
    operations::touch_template(&mut tx, template_id, Utc::now()).await?;
    let exercise = ExerciseLookup::new().get(&mut tx, entry.exercise_id).await?;
    tx.commit().await?;

    info!(
        "Added exercise {} to template {} at position {}",
        entry.exercise_id, template_id, entry.order_index
    );
    Ok(TemplateEntryDetail { entry, exercise })
}

pub async fn remove_template_exercise(
    pool: &SqlitePool,
    template_id: i64,
    acting_user_id: i64,
    entry_id: i64,
) -> Result<Ack> {
    let mut tx = db::begin_write(pool).await?;
    authorize_write(&mut tx, template_id, acting_user_id).await?;

    if !operations::delete_template_exercise(&mut tx, template_id, entry_id).await? {
        return Err(KirokuError::NotFound(format!(
            "template exercise {entry_id} in template {template_id}"
        )));
    }
    operations::touch_template(&mut tx, template_id, Utc::now()).await?;
    tx.commit().await?;

    info!("Removed entry {} from template {}", entry_id, template_id);
    Ok(Ack::new("Template exercise removed successfully"))
}

/// Swap the whole entry list in one transaction.
pub async fn replace_template_exercises(
    pool: &SqlitePool,
    template_id: i64,
    acting_user_id: i64,
    entries: &[NewTemplateExercise],
) -> Result<TemplateDetail> {
    let mut tx = db::begin_write(pool).await?;
    let template = authorize_write(&mut tx, template_id, acting_user_id).await?;

    let removed = operations::delete_template_exercises(&mut tx, template_id).await?;
    for entry in entries {
        operations::insert_template_exercise(&mut tx, template_id, entry).await?;
    }
    operations::touch_template(&mut tx, template_id, Utc::now()).await?;
    let template = find_by_id::<WorkoutTemplate>(&mut tx, template.id)
        .await?
        .ok_or_else(|| KirokuError::not_found("template", template_id))?;
    let detail = load_detail(&mut tx, template).await?;
    tx.commit().await?;

    info!(
        "Replaced {} entr(ies) of template {} with {}",
        removed,
        template_id,
        entries.len()
    );
    Ok(detail)
}

/// Delete a template and its entries. Workouts created from it keep their
/// copied exercises and lose only the back-reference.
pub async fn delete_template(pool: &SqlitePool, template_id: i64, acting_user_id: i64) -> Result<Ack> {
    let mut tx = db::begin_write(pool).await?;
    authorize_write(&mut tx, template_id, acting_user_id).await?;

    let detached = operations::detach_template(&mut tx, template_id).await?;
    operations::delete_template_exercises(&mut tx, template_id).await?;
    operations::delete_by_id::<WorkoutTemplate>(&mut tx, template_id).await?;
    tx.commit().await?;

    info!(
        "Deleted template {} ({} workout(s) detached)",
        template_id, detached
    );
    Ok(Ack::new("Workout template deleted successfully"))
}
