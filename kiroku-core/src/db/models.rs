use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::patch::Patch;

// Users
#[derive(FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

// Exercise catalog
#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExerciseType {
    #[default]
    WeightBased,
    TimeBased,
}

#[derive(FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub exercise_type: ExerciseType,
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
    pub instructions: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct NewExercise {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub exercise_type: ExerciseType,
    #[serde(default)]
    pub muscle_group: Option<String>,
    #[serde(default)]
    pub equipment: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

// Templates
#[derive(FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct WorkoutTemplate {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_by: i64,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Suggested exercise inside a template. Every hint is optional.
#[derive(FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct TemplateExercise {
    pub id: i64,
    pub template_id: i64,
    pub exercise_id: i64,
    pub order_index: i64,
    pub suggested_sets: Option<i64>,
    pub suggested_reps: Option<i64>,
    pub suggested_weight: Option<f64>,
    pub suggested_duration: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NewTemplateExercise {
    pub exercise_id: i64,
    pub order_index: i64,
    #[serde(default)]
    pub suggested_sets: Option<i64>,
    #[serde(default)]
    pub suggested_reps: Option<i64>,
    #[serde(default)]
    pub suggested_weight: Option<f64>,
    #[serde(default)]
    pub suggested_duration: Option<i64>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub exercises: Vec<NewTemplateExercise>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TemplatePatch {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub description: Patch<Option<String>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub is_public: Patch<bool>,
}

// Workouts
#[derive(FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Workout {
    pub id: i64,
    pub user_id: i64,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub template_id: Option<i64>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Workout {
    pub fn is_active(&self) -> bool {
        self.completed_at.is_none()
    }
}

#[derive(FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct WorkoutExercise {
    pub id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub order_index: i64,
    pub notes: Option<String>,
}

#[derive(FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct ExerciseSet {
    pub id: i64,
    pub workout_exercise_id: i64,
    pub set_number: i64,
    pub reps: Option<i64>,
    pub weight: Option<f64>,
    pub duration: Option<i64>,
    pub rest_duration: Option<i64>,
    pub completed: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NewSet {
    pub set_number: i64,
    #[serde(default)]
    pub reps: Option<i64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub rest_duration: Option<i64>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SetPatch {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub set_number: Patch<i64>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub reps: Patch<Option<i64>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub weight: Patch<Option<f64>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub duration: Patch<Option<i64>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub rest_duration: Patch<Option<i64>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub completed: Patch<bool>,
}

impl SetPatch {
    pub fn apply_to(self, set: &mut ExerciseSet) {
        self.set_number.apply_to(&mut set.set_number);
        self.reps.apply_to(&mut set.reps);
        self.weight.apply_to(&mut set.weight);
        self.duration.apply_to(&mut set.duration);
        self.rest_duration.apply_to(&mut set.rest_duration);
        self.completed.apply_to(&mut set.completed);
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct NewWorkoutExercise {
    pub exercise_id: i64,
    pub order_index: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub sets: Vec<NewSet>,
}

/// Metadata patch for a workout. `completed_at` may only be supplied while
/// the workout is still active.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct WorkoutPatch {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub name: Patch<Option<String>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub notes: Patch<Option<String>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub completed_at: Patch<DateTime<Utc>>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "Page::default_limit")]
    pub limit: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 100;

    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }

    fn default_limit() -> i64 {
        Self::DEFAULT_LIMIT
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Acknowledgement returned by pure deletions.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// Hydrated views returned to callers

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TemplateEntryDetail {
    #[serde(flatten)]
    pub entry: TemplateExercise,
    pub exercise: Exercise,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TemplateDetail {
    #[serde(flatten)]
    pub template: WorkoutTemplate,
    pub template_exercises: Vec<TemplateEntryDetail>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WorkoutExerciseDetail {
    #[serde(flatten)]
    pub entry: WorkoutExercise,
    pub exercise: Exercise,
    pub sets: Vec<ExerciseSet>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WorkoutDetail {
    #[serde(flatten)]
    pub workout: Workout,
    pub workout_exercises: Vec<WorkoutExerciseDetail>,
}

impl WorkoutDetail {
    pub fn set_count(&self) -> usize {
        self.workout_exercises.iter().map(|e| e.sets.len()).sum()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProgressionSet {
    pub set_number: i64,
    pub reps: Option<i64>,
    pub weight: Option<f64>,
    pub duration: Option<i64>,
    pub completed: bool,
}

impl From<ExerciseSet> for ProgressionSet {
    fn from(s: ExerciseSet) -> Self {
        ProgressionSet {
            set_number: s.set_number,
            reps: s.reps,
            weight: s.weight,
            duration: s.duration,
            completed: s.completed,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProgressionEntry {
    pub workout_id: i64,
    pub date: DateTime<Utc>,
    pub sets: Vec<ProgressionSet>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Progression {
    pub exercise_id: i64,
    pub progression: Vec<ProgressionEntry>,
}
