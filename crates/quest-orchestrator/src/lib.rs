//! Quest Orchestrator
//!
//! Lesson catalog, progression tracking, and run orchestration.

pub mod catalog;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod progress;

pub use catalog::{Lesson, LessonCatalog, LessonStep, LevelId};
pub use config::Config;
pub use error::{QuestError, Result};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use progress::{LessonProgressTracker, ProgressEvent, ProgressState};
