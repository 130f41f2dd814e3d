pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod guard;
pub mod identity;
pub mod logging;
pub mod patch;
pub mod progression;
pub mod templates;
pub mod workouts;

pub use errors::{KirokuError, Result};
