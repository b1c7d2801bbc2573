//! Lesson progression state machine for Quest.
//!
//! This module defines the per-session progress state and the tracker that
//! advances it from observed execution output. The cursor (level, lesson,
//! step) moves along a single forward path from the first beginner step to
//! the last intermediate step; the only back-transitions are explicit jumps.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Lesson, LessonCatalog, LessonStep, LevelId};
use crate::error::{QuestError, Result};

// ============================================================================
// ProgressEvent
// ============================================================================

/// Outcome of evaluating execution output against the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The step's expected output matched and more steps remain in the lesson.
    StepAdvanced,

    /// The lesson's final step matched; the cursor moved to the next lesson,
    /// or stayed in place when there is nowhere further to go.
    LessonCompleted {
        /// Id of the lesson that completed.
        lesson_id: u32,
    },

    /// The level's final lesson completed; the cursor moved to the first
    /// lesson of the next level. Implies lesson completion.
    LevelAdvanced {
        /// Id of the lesson whose completion triggered the level change.
        completed_lesson_id: u32,
        /// The level the cursor moved into.
        level: LevelId,
    },

    /// The current step requires no output, so output matching cannot
    /// advance it; the host must advance explicitly (see
    /// [`LessonProgressTracker::advance_step`]).
    ManualAdvanceRequired,

    /// The expected output did not occur in the program output.
    NoMatch,
}

impl ProgressEvent {
    /// Returns `true` for events worth celebrating in the host UI.
    #[must_use]
    pub const fn is_celebratory(&self) -> bool {
        matches!(
            self,
            Self::LessonCompleted { .. } | Self::LevelAdvanced { .. }
        )
    }
}

// ============================================================================
// ProgressState
// ============================================================================

/// The mutable cursor and completion history for one session.
///
/// Owned exclusively by [`LessonProgressTracker`]; hosts read it through
/// [`LessonProgressTracker::state`]. `lesson_index` is always a valid index
/// into the current level's lessons and `step_index` into the current
/// lesson's steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Current level.
    pub level: LevelId,

    /// Index of the current lesson within the level.
    pub lesson_index: usize,

    /// Index of the current step within the lesson.
    pub step_index: usize,

    /// Ids of every lesson completed this session. Only grows.
    pub completed_lessons: BTreeSet<u32>,

    /// Progress through the current lesson in percent, in `[0, 100]`.
    /// Recomputed as `(step_index + 1) / steps * 100` on every successful
    /// step match.
    pub progress_percent: f64,

    /// When the session started.
    pub started_at: DateTime<Utc>,

    /// When the state last changed.
    pub updated_at: DateTime<Utc>,
}

impl ProgressState {
    /// Creates a fresh state at the first beginner lesson.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            level: LevelId::Beginner,
            lesson_index: 0,
            step_index: 0,
            completed_lessons: BTreeSet::new(),
            progress_percent: 0.0,
            started_at: now,
            updated_at: now,
        }
    }

    /// Updates the `updated_at` timestamp to the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// LessonProgressTracker
// ============================================================================

/// Stateful engine that advances through the catalog from execution output.
///
/// Owns the single [`ProgressState`] for a session. The catalog is shared
/// and immutable; all mutation happens here.
#[derive(Debug, Clone)]
pub struct LessonProgressTracker {
    /// The read-only lesson catalog.
    catalog: Arc<LessonCatalog>,

    /// The session's progress cursor and completion history.
    state: ProgressState,
}

impl LessonProgressTracker {
    /// Creates a tracker positioned at the first step of the first beginner
    /// lesson.
    ///
    /// The catalog must be valid (see [`LessonCatalog::validate`]); the
    /// constructors on `LessonCatalog` guarantee this.
    #[must_use]
    pub fn new(catalog: Arc<LessonCatalog>) -> Self {
        Self {
            catalog,
            state: ProgressState::new(),
        }
    }

    /// Returns the shared catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<LessonCatalog> {
        &self.catalog
    }

    /// Returns the session's progress state.
    #[must_use]
    pub const fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Returns the lesson the cursor currently points at.
    #[must_use]
    pub fn current_lesson(&self) -> &Lesson {
        // Indices are kept valid by construction: the catalog is validated
        // and every cursor move checks bounds before committing.
        &self.catalog.lessons(self.state.level)[self.state.lesson_index]
    }

    /// Returns the step the learner is expected to produce.
    #[must_use]
    pub fn current_step(&self) -> &LessonStep {
        &self.current_lesson().steps[self.state.step_index]
    }

    /// Returns the current step's suggested code for the host to insert
    /// into the editable buffer. Pure accessor, no state change.
    #[must_use]
    pub fn suggested_code(&self) -> &str {
        &self.current_step().suggested_code
    }

    /// Returns `true` if the cursor sits at the final step of the final
    /// lesson of the final level.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        let last_lesson =
            self.state.lesson_index + 1 == self.catalog.lessons(self.state.level).len();
        let last_step = self.state.step_index + 1 == self.current_lesson().steps.len();
        self.state.level.is_last() && last_lesson && last_step
    }

    /// Evaluates execution output against the current step.
    ///
    /// Output lines are joined with newlines and the step's expected output
    /// is matched by substring containment, not equality: extra printed
    /// lines do not break a match. Steps with no expected output yield
    /// [`ProgressEvent::ManualAdvanceRequired`] without inspecting the
    /// output. A match advances the cursor (see [`ProgressEvent`]); no
    /// match leaves state untouched.
    ///
    /// At the terminal step a matching evaluation re-emits
    /// [`ProgressEvent::LessonCompleted`] and changes nothing: the
    /// completion set already holds the id, so repeated submissions are
    /// harmless.
    ///
    /// Never fails; empty output simply yields [`ProgressEvent::NoMatch`].
    pub fn evaluate(&mut self, output_lines: &[String]) -> ProgressEvent {
        let step = self.current_step();
        if !step.expects_output() {
            return ProgressEvent::ManualAdvanceRequired;
        }

        let joined = output_lines.join("\n");
        if !joined.contains(&step.expected_output) {
            return ProgressEvent::NoMatch;
        }

        self.advance_cursor()
    }

    /// Explicitly advances past the current step.
    ///
    /// Intended for steps with no expected output, which output matching
    /// can never advance; the host calls this when the learner confirms the
    /// step. Runs the same completion cascade as a successful match.
    pub fn advance_step(&mut self) -> ProgressEvent {
        self.advance_cursor()
    }

    /// Moves the cursor to the start of an arbitrary lesson.
    ///
    /// Resets the step index to 0 and recomputes the progress percentage.
    /// Completion history is preserved.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::InvalidNavigation` if `lesson_index` is out of
    /// range for the level.
    pub fn jump_to(&mut self, level: LevelId, lesson_index: usize) -> Result<()> {
        let lesson_count = self.catalog.lessons(level).len();
        if lesson_index >= lesson_count {
            return Err(QuestError::invalid_navigation(
                level,
                lesson_index,
                lesson_count,
            ));
        }

        self.state.level = level;
        self.state.lesson_index = lesson_index;
        self.state.step_index = 0;
        self.recompute_progress();
        self.state.touch();
        Ok(())
    }

    /// Advances the cursor one step, cascading through lesson and level
    /// completion.
    fn advance_cursor(&mut self) -> ProgressEvent {
        let lesson = self.current_lesson();
        let lesson_id = lesson.id;
        let step_count = lesson.steps.len();

        let event = if self.state.step_index + 1 < step_count {
            self.state.step_index += 1;
            ProgressEvent::StepAdvanced
        } else {
            self.state.completed_lessons.insert(lesson_id);
            let lessons_in_level = self.catalog.lessons(self.state.level).len();

            if self.state.lesson_index + 1 < lessons_in_level {
                self.state.lesson_index += 1;
                self.state.step_index = 0;
                ProgressEvent::LessonCompleted { lesson_id }
            } else if let Some(next_level) = self.state.level.next() {
                self.state.level = next_level;
                self.state.lesson_index = 0;
                self.state.step_index = 0;
                ProgressEvent::LevelAdvanced {
                    completed_lesson_id: lesson_id,
                    level: next_level,
                }
            } else {
                // Terminal: nowhere further to go, the cursor stays put.
                ProgressEvent::LessonCompleted { lesson_id }
            }
        };

        self.recompute_progress();
        self.state.touch();
        event
    }

    /// Recomputes the progress percentage for the current lesson.
    #[allow(clippy::cast_precision_loss)]
    fn recompute_progress(&mut self) {
        let step_count = self.current_lesson().steps.len();
        self.state.progress_percent =
            (self.state.step_index + 1) as f64 / step_count as f64 * 100.0;
    }
}
