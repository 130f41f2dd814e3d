use anyhow::{Context, Result, anyhow};
use clap::{Args as ClapArgs, Parser, Subcommand};
use dotenvy::dotenv;
use log::{LevelFilter, debug};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use std::process::ExitCode;

use kiroku::config::Config;
use kiroku::db::models::{
    NewExercise, NewSet, NewTemplate, NewTemplateExercise, NewUser, NewWorkoutExercise, Page,
    SetPatch, TemplatePatch, WorkoutPatch,
};
use kiroku::progression::DEFAULT_PROGRESSION_LIMIT;
use kiroku::{KirokuError, catalog, db, identity, logging, progression, templates, workouts};

#[derive(Parser, Debug)]
#[command(version, about = "Kiroku - Workout Tracker CLI", long_about = None)]
struct Args {
    /// Acting user id
    #[arg(long, global = true, env = "KIROKU_USER")]
    user: Option<i64>,

    /// Log everything down to trace level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug, Clone, Copy)]
struct PageArgs {
    #[arg(long, default_value_t = 0)]
    skip: i64,
    #[arg(long, default_value_t = Page::DEFAULT_LIMIT)]
    limit: i64,
}

impl From<PageArgs> for Page {
    fn from(p: PageArgs) -> Self {
        Page::new(p.skip, p.limit)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage users
    #[command(subcommand)]
    User(UserCommand),
    /// Manage the exercise catalog
    #[command(subcommand)]
    Exercise(ExerciseCommand),
    /// Manage workout templates
    #[command(subcommand)]
    Template(TemplateCommand),
    /// Record workouts
    #[command(subcommand)]
    Workout(WorkoutCommand),
    /// Show the history of one exercise across completed workouts
    Progression {
        exercise_id: i64,
        #[arg(long, default_value_t = DEFAULT_PROGRESSION_LIMIT)]
        limit: i64,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create {
        username: String,
        email: String,
        #[arg(long)]
        admin: bool,
    },
    Show { id: i64 },
    Deactivate { id: i64 },
    Activate { id: i64 },
    /// Delete a user with all of their workouts and templates
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum ExerciseCommand {
    /// Create an exercise from a JSON body, e.g. '{"name":"Squat"}'
    Create { json: String },
    Show { id: i64 },
    List {
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Subcommand, Debug)]
enum TemplateCommand {
    /// Create a template from a JSON body
    Create { json: String },
    Show { id: i64 },
    /// List public templates
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// List templates owned by the acting user
    Mine,
    /// Apply a JSON patch, e.g. '{"is_public":true}'
    Update { id: i64, json: String },
    AddEntry { id: i64, json: String },
    RemoveEntry { id: i64, entry_id: i64 },
    /// Replace all entries with a JSON array
    ReplaceEntries { id: i64, json: String },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum WorkoutCommand {
    /// Start an empty workout
    Start {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Start a workout pre-filled from a template
    FromTemplate {
        template_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Show { id: i64 },
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    Active,
    History {
        #[command(flatten)]
        page: PageArgs,
    },
    AddExercise { id: i64, json: String },
    AddSet { id: i64, entry_id: i64, json: String },
    UpdateSet { id: i64, entry_id: i64, set_id: i64, json: String },
    DeleteSet { id: i64, entry_id: i64, set_id: i64 },
    /// Replace the workout notes, clearing them when omitted
    Notes { id: i64, notes: Option<String> },
    ExerciseNotes { id: i64, entry_id: i64, notes: Option<String> },
    Update { id: i64, json: String },
    Complete { id: i64 },
    Cancel { id: i64 },
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
}

fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw).with_context(|| format!("Invalid JSON input: {raw}"))
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

struct App {
    pool: SqlitePool,
    user: Option<i64>,
}

impl App {
    /// The acting user, checked against the registry.
    async fn acting_user(&self) -> Result<i64> {
        let id = self
            .user
            .ok_or_else(|| KirokuError::Unauthorized("no acting user, pass --user".into()))?;
        let identity = identity::resolve_identity(&self.pool, id).await?;
        debug!("Acting as user {}", identity.id);
        Ok(identity.id)
    }

    async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::User(cmd) => self.user_command(cmd).await,
            Commands::Exercise(cmd) => self.exercise_command(cmd).await,
            Commands::Template(cmd) => self.template_command(cmd).await,
            Commands::Workout(cmd) => self.workout_command(cmd).await,
            Commands::Progression { exercise_id, limit } => {
                let user = self.acting_user().await?;
                emit(&progression::get_progression(&self.pool, user, exercise_id, limit).await?)
            }
        }
    }

    async fn user_command(&self, cmd: UserCommand) -> Result<()> {
        let pool = &self.pool;
        match cmd {
            UserCommand::Create {
                username,
                email,
                admin,
            } => {
                let new = NewUser {
                    username,
                    email,
                    is_admin: admin,
                };
                emit(&identity::create_user(pool, &new).await?)
            }
            UserCommand::Show { id } => emit(&identity::get_user(pool, id).await?),
            UserCommand::Deactivate { id } => emit(&identity::set_user_active(pool, id, false).await?),
            UserCommand::Activate { id } => emit(&identity::set_user_active(pool, id, true).await?),
            UserCommand::Delete { id } => emit(&identity::delete_user(pool, id).await?),
        }
    }

    async fn exercise_command(&self, cmd: ExerciseCommand) -> Result<()> {
        let pool = &self.pool;
        match cmd {
            ExerciseCommand::Create { json } => {
                let new: NewExercise = parse_json(&json)?;
                emit(&catalog::create_exercise(pool, &new).await?)
            }
            ExerciseCommand::Show { id } => emit(&catalog::get_exercise(pool, id).await?),
            ExerciseCommand::List { page } => emit(&catalog::list_exercises(pool, page.into()).await?),
        }
    }

    async fn template_command(&self, cmd: TemplateCommand) -> Result<()> {
        let pool = &self.pool;
        match cmd {
            TemplateCommand::Create { json } => {
                let new: NewTemplate = parse_json(&json)?;
                let user = self.acting_user().await?;
                emit(&templates::create_template(pool, user, &new).await?)
            }
            TemplateCommand::Show { id } => {
                let user = self.acting_user().await?;
                emit(&templates::get_template_for(pool, id, user).await?)
            }
            TemplateCommand::List { page } => {
                emit(&templates::list_public_templates(pool, page.into()).await?)
            }
            TemplateCommand::Mine => {
                let user = self.acting_user().await?;
                emit(&templates::list_templates_by_owner(pool, user).await?)
            }
            TemplateCommand::Update { id, json } => {
                let patch: TemplatePatch = parse_json(&json)?;
                let user = self.acting_user().await?;
                emit(&templates::update_template(pool, id, user, patch).await?)
            }
            TemplateCommand::AddEntry { id, json } => {
                let entry: NewTemplateExercise = parse_json(&json)?;
                let user = self.acting_user().await?;
                emit(&templates::add_template_exercise(pool, id, user, &entry).await?)
            }
            TemplateCommand::RemoveEntry { id, entry_id } => {
                let user = self.acting_user().await?;
                emit(&templates::remove_template_exercise(pool, id, user, entry_id).await?)
            }
            TemplateCommand::ReplaceEntries { id, json } => {
                let entries: Vec<NewTemplateExercise> = parse_json(&json)?;
                let user = self.acting_user().await?;
                emit(&templates::replace_template_exercises(pool, id, user, &entries).await?)
            }
            TemplateCommand::Delete { id } => {
                let user = self.acting_user().await?;
                emit(&templates::delete_template(pool, id, user).await?)
            }
        }
    }

    async fn workout_command(&self, cmd: WorkoutCommand) -> Result<()> {
        let pool = &self.pool;
        let user = self.acting_user().await?;
        match cmd {
            WorkoutCommand::Start { name, notes } => emit(
                &workouts::create_blank(pool, user, name.as_deref(), notes.as_deref()).await?,
            ),
            WorkoutCommand::FromTemplate {
                template_id,
                name,
                notes,
            } => emit(
                &workouts::create_from_template(
                    pool,
                    user,
                    template_id,
                    name.as_deref(),
                    notes.as_deref(),
                )
                .await?,
            ),
            WorkoutCommand::Show { id } => emit(&workouts::get_workout(pool, id, user).await?),
            WorkoutCommand::List { page } => {
                emit(&workouts::list_workouts(pool, user, page.into()).await?)
            }
            WorkoutCommand::Active => emit(&workouts::get_active_workout(pool, user).await?),
            WorkoutCommand::History { page } => {
                emit(&workouts::workout_history(pool, user, page.into()).await?)
            }
            WorkoutCommand::AddExercise { id, json } => {
                let new: NewWorkoutExercise = parse_json(&json)?;
                emit(&workouts::add_exercise(pool, id, user, &new).await?)
            }
            WorkoutCommand::AddSet { id, entry_id, json } => {
                let new: NewSet = parse_json(&json)?;
                emit(&workouts::add_set(pool, id, user, entry_id, &new).await?)
            }
            WorkoutCommand::UpdateSet {
                id,
                entry_id,
                set_id,
                json,
            } => {
                let patch: SetPatch = parse_json(&json)?;
                emit(&workouts::update_set(pool, id, user, entry_id, set_id, patch).await?)
            }
            WorkoutCommand::DeleteSet {
                id,
                entry_id,
                set_id,
            } => emit(&workouts::delete_set(pool, id, user, entry_id, set_id).await?),
            WorkoutCommand::Notes { id, notes } => {
                emit(&workouts::update_notes(pool, id, user, notes).await?)
            }
            WorkoutCommand::ExerciseNotes {
                id,
                entry_id,
                notes,
            } => emit(&workouts::update_exercise_notes(pool, id, user, entry_id, notes).await?),
            WorkoutCommand::Update { id, json } => {
                let patch: WorkoutPatch = parse_json(&json)?;
                emit(&workouts::update(pool, id, user, patch).await?)
            }
            WorkoutCommand::Complete { id } => emit(&workouts::complete(pool, id, user).await?),
            WorkoutCommand::Cancel { id } => emit(&workouts::cancel(pool, id, user).await?),
        }
    }
}

fn report(e: &anyhow::Error) {
    let body = match e.downcast_ref::<KirokuError>() {
        Some(err) => ErrorBody {
            error: err.to_string(),
            code: err.code(),
        },
        None => ErrorBody {
            error: format!("{e:#}"),
            code: "CLI_ERROR",
        },
    };
    match serde_json::to_string_pretty(&body) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("{}: {}", body.code, body.error),
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::from_env()?;
    if args.verbose {
        config.log_level = LevelFilter::Trace;
    }
    logging::init_logger(&config);

    let pool = db::connect(&config)
        .await
        .map_err(|e| anyhow!("Could not open {}: {e:#}", config.database_url))?;
    let app = App {
        pool,
        user: args.user,
    };
    app.run(args.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}
