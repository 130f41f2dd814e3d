mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use kiroku::KirokuError;
use kiroku::db::models::*;
use kiroku::patch::Patch;
use kiroku::{templates, workouts};

use common::{count, exercise, setup, suggestion, user};

#[tokio::test]
async fn second_blank_workout_conflicts_until_first_completes() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;

    let first = workouts::create_blank(&pool, alice, Some("Push"), None).await?;
    assert!(first.workout.is_active());
    assert!(first.workout_exercises.is_empty());

    let err = workouts::create_blank(&pool, alice, Some("Pull"), None)
        .await
        .unwrap_err();
    assert_matches!(err, KirokuError::Conflict(_));

    let done = workouts::complete(&pool, first.workout.id, alice).await?;
    assert!(done.workout.completed_at.is_some());

    let second = workouts::create_blank(&pool, alice, Some("Pull"), None).await?;
    assert_ne!(second.workout.id, first.workout.id);

    let active = count(
        &pool,
        &format!("SELECT COUNT(*) FROM workouts WHERE user_id = {alice} AND completed_at IS NULL"),
    )
    .await?;
    assert_eq!(active, 1);
    Ok(())
}

#[tokio::test]
async fn active_workouts_are_per_user() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;
    let bob = user(&pool, "bob").await?;

    workouts::create_blank(&pool, alice, None, None).await?;
    workouts::create_blank(&pool, bob, None, None).await?;
    Ok(())
}

#[tokio::test]
async fn store_rejects_a_second_active_row() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;
    workouts::create_blank(&pool, alice, None, None).await?;

    let raw = sqlx::query("INSERT INTO workouts (user_id, started_at) VALUES (?1, ?2)")
        .bind(alice)
        .bind(Utc::now())
        .execute(&pool)
        .await;
    let err = KirokuError::from(raw.unwrap_err());
    assert_matches!(err, KirokuError::Conflict(_));
    Ok(())
}

#[tokio::test]
async fn completing_twice_is_invalid_state() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;
    let workout = workouts::create_blank(&pool, alice, None, None).await?;

    let done = workouts::complete(&pool, workout.workout.id, alice).await?;
    let first_completion = done.workout.completed_at;

    let err = workouts::complete(&pool, workout.workout.id, alice)
        .await
        .unwrap_err();
    assert_matches!(err, KirokuError::InvalidState(_));

    let reread = workouts::get_workout(&pool, workout.workout.id, alice).await?;
    assert_eq!(reread.workout.completed_at, first_completion);
    Ok(())
}

#[tokio::test]
async fn public_template_instantiates_pending_sets() -> anyhow::Result<()> {
    let pool = setup().await?;
    let coach = user(&pool, "coach").await?;
    let alice = user(&pool, "alice").await?;
    let squat = exercise(&pool, "Squat").await?;

    let template = templates::create_template(
        &pool,
        coach,
        &NewTemplate {
            name: "Leg day".to_string(),
            is_public: true,
            exercises: vec![suggestion(squat, 0, Some(3), Some(10))],
            ..Default::default()
        },
    )
    .await?;

    let workout = workouts::create_from_template(&pool, alice, template.template.id, None, None).await?;
    assert_eq!(workout.workout.name.as_deref(), Some("Leg day"));
    assert_eq!(workout.workout.template_id, Some(template.template.id));
    assert_eq!(workout.workout_exercises.len(), 1);

    let entry = &workout.workout_exercises[0];
    assert_eq!(entry.exercise.name, "Squat");
    assert_eq!(entry.sets.len(), 3);
    for (i, set) in entry.sets.iter().enumerate() {
        assert_eq!(set.set_number, i as i64 + 1);
        assert_eq!(set.reps, Some(10));
        assert!(!set.completed);
        assert_eq!(set.rest_duration, None);
    }
    Ok(())
}

#[tokio::test]
async fn template_copy_follows_order_and_defaults_to_one_set() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;
    let bench = exercise(&pool, "Bench").await?;
    let row = exercise(&pool, "Row").await?;
    let plank = exercise(&pool, "Plank").await?;

    let template = templates::create_template(
        &pool,
        alice,
        &NewTemplate {
            name: "Full body".to_string(),
            exercises: vec![
                suggestion(row, 2, Some(4), Some(8)),
                suggestion(bench, 1, None, Some(5)),
                NewTemplateExercise {
                    exercise_id: plank,
                    order_index: 3,
                    suggested_sets: Some(0),
                    suggested_duration: Some(60),
                    ..Default::default()
                },
            ],
            ..Default::default()
        },
    )
    .await?;

    let workout = workouts::create_from_template(
        &pool,
        alice,
        template.template.id,
        Some("Monday"),
        Some("felt strong"),
    )
    .await?;
    assert_eq!(workout.workout.name.as_deref(), Some("Monday"));
    assert_eq!(workout.workout.notes.as_deref(), Some("felt strong"));

    let ids: Vec<i64> = workout
        .workout_exercises
        .iter()
        .map(|e| e.entry.exercise_id)
        .collect();
    assert_eq!(ids, vec![bench, row, plank]);

    let set_counts: Vec<usize> = workout.workout_exercises.iter().map(|e| e.sets.len()).collect();
    assert_eq!(set_counts, vec![1, 4, 1]);
    assert_eq!(workout.workout_exercises[2].sets[0].duration, Some(60));
    assert_eq!(workout.set_count(), 6);
    Ok(())
}

#[tokio::test]
async fn template_edits_do_not_reach_existing_workouts() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;
    let deadlift = exercise(&pool, "Deadlift").await?;
    let curl = exercise(&pool, "Curl").await?;

    let template = templates::create_template(
        &pool,
        alice,
        &NewTemplate {
            name: "Pull".to_string(),
            exercises: vec![suggestion(deadlift, 0, Some(2), Some(5))],
            ..Default::default()
        },
    )
    .await?;
    let workout = workouts::create_from_template(&pool, alice, template.template.id, None, None).await?;

    templates::replace_template_exercises(
        &pool,
        template.template.id,
        alice,
        &[suggestion(curl, 0, Some(5), Some(12))],
    )
    .await?;
    templates::update_template(
        &pool,
        template.template.id,
        alice,
        TemplatePatch {
            name: Patch::Present("Arms".to_string()),
            ..Default::default()
        },
    )
    .await?;

    let reread = workouts::get_workout(&pool, workout.workout.id, alice).await?;
    assert_eq!(reread, workout);
    Ok(())
}

#[tokio::test]
async fn private_template_of_another_user_is_forbidden() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;
    let bob = user(&pool, "bob").await?;

    let template = templates::create_template(
        &pool,
        alice,
        &NewTemplate {
            name: "Secret".to_string(),
            ..Default::default()
        },
    )
    .await?;

    let err = workouts::create_from_template(&pool, bob, template.template.id, None, None)
        .await
        .unwrap_err();
    assert_matches!(err, KirokuError::Forbidden(_));

    let err = workouts::create_from_template(&pool, bob, 9999, None, None)
        .await
        .unwrap_err();
    assert_matches!(err, KirokuError::NotFound(_));

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM workouts").await?, 0);
    Ok(())
}

#[tokio::test]
async fn from_template_conflicts_with_active_workout() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;
    let template = templates::create_template(
        &pool,
        alice,
        &NewTemplate {
            name: "Any".to_string(),
            ..Default::default()
        },
    )
    .await?;
    workouts::create_blank(&pool, alice, None, None).await?;

    let err = workouts::create_from_template(&pool, alice, template.template.id, None, None)
        .await
        .unwrap_err();
    assert_matches!(err, KirokuError::Conflict(_));
    Ok(())
}

#[tokio::test]
async fn cancel_removes_every_row() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;
    let squat = exercise(&pool, "Squat").await?;
    let press = exercise(&pool, "Press").await?;

    let template = templates::create_template(
        &pool,
        alice,
        &NewTemplate {
            name: "A".to_string(),
            exercises: vec![suggestion(squat, 0, Some(3), Some(5)), suggestion(press, 1, Some(2), Some(8))],
            ..Default::default()
        },
    )
    .await?;
    let workout = workouts::create_from_template(&pool, alice, template.template.id, None, None).await?;
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM exercise_sets").await?, 5);

    let ack = workouts::cancel(&pool, workout.workout.id, alice).await?;
    assert_eq!(ack.message, "Workout cancelled and removed successfully");

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM workouts").await?, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM workout_exercises").await?, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM exercise_sets").await?, 0);
    // The template itself is untouched.
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM workout_template_exercises").await?, 2);

    workouts::create_blank(&pool, alice, None, None).await?;
    Ok(())
}

#[tokio::test]
async fn completed_workouts_cannot_be_cancelled_or_extended() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;
    let squat = exercise(&pool, "Squat").await?;
    let workout = workouts::create_blank(&pool, alice, None, None).await?;
    let id = workout.workout.id;
    let entry = workouts::add_exercise(
        &pool,
        id,
        alice,
        &NewWorkoutExercise {
            exercise_id: squat,
            order_index: 0,
            ..Default::default()
        },
    )
    .await?;
    workouts::complete(&pool, id, alice).await?;

    assert_matches!(
        workouts::cancel(&pool, id, alice).await,
        Err(KirokuError::InvalidState(_))
    );
    assert_matches!(
        workouts::add_exercise(
            &pool,
            id,
            alice,
            &NewWorkoutExercise {
                exercise_id: squat,
                order_index: 1,
                ..Default::default()
            },
        )
        .await,
        Err(KirokuError::InvalidState(_))
    );
    assert_matches!(
        workouts::add_set(
            &pool,
            id,
            alice,
            entry.entry.id,
            &NewSet {
                set_number: 1,
                ..Default::default()
            },
        )
        .await,
        Err(KirokuError::InvalidState(_))
    );
    assert_matches!(
        workouts::update_notes(&pool, id, alice, Some("late".to_string())).await,
        Err(KirokuError::InvalidState(_))
    );
    Ok(())
}

#[tokio::test]
async fn other_users_cannot_touch_a_workout() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;
    let bob = user(&pool, "bob").await?;
    let workout = workouts::create_blank(&pool, alice, None, None).await?;
    let id = workout.workout.id;

    assert_matches!(
        workouts::complete(&pool, id, bob).await,
        Err(KirokuError::Forbidden(_))
    );
    assert_matches!(
        workouts::cancel(&pool, id, bob).await,
        Err(KirokuError::Forbidden(_))
    );
    assert_matches!(
        workouts::update_notes(&pool, id, bob, None).await,
        Err(KirokuError::Forbidden(_))
    );
    assert_matches!(
        workouts::get_workout(&pool, id, bob).await,
        Err(KirokuError::Forbidden(_))
    );
    assert_matches!(
        workouts::complete(&pool, id + 100, alice).await,
        Err(KirokuError::NotFound(_))
    );

    let untouched = workouts::get_workout(&pool, id, alice).await?;
    assert!(untouched.workout.is_active());
    Ok(())
}

#[tokio::test]
async fn sets_can_be_added_patched_and_deleted() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;
    let bench = exercise(&pool, "Bench").await?;
    let workout = workouts::create_blank(&pool, alice, None, None).await?;
    let id = workout.workout.id;

    let entry = workouts::add_exercise(
        &pool,
        id,
        alice,
        &NewWorkoutExercise {
            exercise_id: bench,
            order_index: 0,
            notes: Some("paused reps".to_string()),
            sets: vec![NewSet {
                set_number: 1,
                reps: Some(8),
                weight: Some(80.0),
                ..Default::default()
            }],
        },
    )
    .await?;
    assert_eq!(entry.exercise.name, "Bench");
    assert_eq!(entry.sets.len(), 1);
    let entry_id = entry.entry.id;

    let second = workouts::add_set(
        &pool,
        id,
        alice,
        entry_id,
        &NewSet {
            set_number: 2,
            reps: Some(6),
            weight: Some(85.0),
            rest_duration: Some(120),
            ..Default::default()
        },
    )
    .await?;

    let patched = workouts::update_set(
        &pool,
        id,
        alice,
        entry_id,
        second.id,
        SetPatch {
            completed: Patch::Present(true),
            reps: Patch::Present(Some(7)),
            ..Default::default()
        },
    )
    .await?;
    assert!(patched.completed);
    assert_eq!(patched.reps, Some(7));
    assert_eq!(patched.weight, Some(85.0));
    assert_eq!(patched.rest_duration, Some(120));
    assert_eq!(patched.set_number, 2);

    let cleared = workouts::update_set(
        &pool,
        id,
        alice,
        entry_id,
        second.id,
        SetPatch {
            weight: Patch::Present(None),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(cleared.weight, None);
    assert_eq!(cleared.reps, Some(7));

    let ack = workouts::delete_set(&pool, id, alice, entry_id, entry.sets[0].id).await?;
    assert_eq!(ack.message, "Exercise set deleted successfully");

    let detail = workouts::get_workout(&pool, id, alice).await?;
    assert_eq!(detail.workout_exercises[0].sets, vec![cleared]);
    Ok(())
}

#[tokio::test]
async fn set_operations_check_entry_membership() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;
    let bob = user(&pool, "bob").await?;
    let squat = exercise(&pool, "Squat").await?;

    let mine = workouts::create_blank(&pool, alice, None, None).await?;
    let theirs = workouts::create_blank(&pool, bob, None, None).await?;
    let foreign_entry = workouts::add_exercise(
        &pool,
        theirs.workout.id,
        bob,
        &NewWorkoutExercise {
            exercise_id: squat,
            order_index: 0,
            sets: vec![NewSet {
                set_number: 1,
                ..Default::default()
            }],
            ..Default::default()
        },
    )
    .await?;
    let own_entry = workouts::add_exercise(
        &pool,
        mine.workout.id,
        alice,
        &NewWorkoutExercise {
            exercise_id: squat,
            order_index: 0,
            ..Default::default()
        },
    )
    .await?;

    // An entry of another workout is not reachable through this one.
    assert_matches!(
        workouts::add_set(
            &pool,
            mine.workout.id,
            alice,
            foreign_entry.entry.id,
            &NewSet {
                set_number: 1,
                ..Default::default()
            },
        )
        .await,
        Err(KirokuError::NotFound(_))
    );
    // Nor is a set of another entry.
    assert_matches!(
        workouts::delete_set(
            &pool,
            mine.workout.id,
            alice,
            own_entry.entry.id,
            foreign_entry.sets[0].id,
        )
        .await,
        Err(KirokuError::NotFound(_))
    );
    assert_matches!(
        workouts::update_exercise_notes(&pool, mine.workout.id, alice, foreign_entry.entry.id, None).await,
        Err(KirokuError::NotFound(_))
    );
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM exercise_sets").await?, 1);
    Ok(())
}

#[tokio::test]
async fn unknown_exercise_is_not_found() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;
    let workout = workouts::create_blank(&pool, alice, None, None).await?;

    let err = workouts::add_exercise(
        &pool,
        workout.workout.id,
        alice,
        &NewWorkoutExercise {
            exercise_id: 4242,
            order_index: 0,
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_matches!(err, KirokuError::NotFound(_));
    Ok(())
}

#[tokio::test]
async fn notes_are_replaced_wholesale() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;
    let row = exercise(&pool, "Row").await?;
    let workout = workouts::create_blank(&pool, alice, None, Some("warmup first")).await?;
    let id = workout.workout.id;

    let detail = workouts::update_notes(&pool, id, alice, Some("skipped warmup".to_string())).await?;
    assert_eq!(detail.workout.notes.as_deref(), Some("skipped warmup"));
    let detail = workouts::update_notes(&pool, id, alice, None).await?;
    assert_eq!(detail.workout.notes, None);

    let entry = workouts::add_exercise(
        &pool,
        id,
        alice,
        &NewWorkoutExercise {
            exercise_id: row,
            order_index: 0,
            notes: Some("strap".to_string()),
            ..Default::default()
        },
    )
    .await?;
    let entry = workouts::update_exercise_notes(&pool, id, alice, entry.entry.id, Some("no strap".to_string())).await?;
    assert_eq!(entry.entry.notes.as_deref(), Some("no strap"));
    Ok(())
}

#[tokio::test]
async fn generic_update_applies_only_present_fields() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;
    let workout = workouts::create_blank(&pool, alice, Some("Legs"), Some("heavy")).await?;
    let id = workout.workout.id;

    let renamed = workouts::update(
        &pool,
        id,
        alice,
        WorkoutPatch {
            name: Patch::Present(Some("Lower".to_string())),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(renamed.workout.name.as_deref(), Some("Lower"));
    assert_eq!(renamed.workout.notes.as_deref(), Some("heavy"));
    assert!(renamed.workout.is_active());

    let finished_at = Utc::now();
    let finished = workouts::update(
        &pool,
        id,
        alice,
        WorkoutPatch {
            completed_at: Patch::Present(finished_at),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(
        finished.workout.completed_at.map(|t| t.timestamp_millis()),
        Some(finished_at.timestamp_millis())
    );

    // Name and notes stay editable after completion, the timestamp does not.
    let noted = workouts::update(
        &pool,
        id,
        alice,
        WorkoutPatch {
            notes: Patch::Present(None),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(noted.workout.notes, None);

    let err = workouts::update(
        &pool,
        id,
        alice,
        WorkoutPatch {
            completed_at: Patch::Present(Utc::now()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_matches!(err, KirokuError::InvalidState(_));
    Ok(())
}

#[tokio::test]
async fn reads_list_active_and_history() -> anyhow::Result<()> {
    let pool = setup().await?;
    let alice = user(&pool, "alice").await?;

    assert_matches!(
        workouts::get_active_workout(&pool, alice).await,
        Err(KirokuError::NotFound(_))
    );

    let first = workouts::create_blank(&pool, alice, Some("one"), None).await?;
    workouts::complete(&pool, first.workout.id, alice).await?;
    let second = workouts::create_blank(&pool, alice, Some("two"), None).await?;
    workouts::complete(&pool, second.workout.id, alice).await?;
    let third = workouts::create_blank(&pool, alice, Some("three"), None).await?;

    let active = workouts::get_active_workout(&pool, alice).await?;
    assert_eq!(active.workout.id, third.workout.id);

    let all = workouts::list_workouts(&pool, alice, Page::default()).await?;
    let names: Vec<_> = all.iter().map(|w| w.workout.name.clone().unwrap_or_default()).collect();
    assert_eq!(names, vec!["three", "two", "one"]);

    let page = workouts::list_workouts(&pool, alice, Page::new(1, 1)).await?;
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].workout.id, second.workout.id);

    let history = workouts::workout_history(&pool, alice, Page::default()).await?;
    let ids: Vec<_> = history.iter().map(|w| w.workout.id).collect();
    assert_eq!(ids, vec![second.workout.id, first.workout.id]);
    Ok(())
}
