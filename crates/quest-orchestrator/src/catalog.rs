//! Lesson catalog types for Quest.
//!
//! The catalog is a static, ordered definition of levels, lessons, and
//! steps. It is read-only after construction: completion flags live on the
//! per-session progress state, never on the catalog, so one catalog can be
//! shared across sessions.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QuestError, Result};

// ============================================================================
// LevelId
// ============================================================================

/// Difficulty level grouping lessons.
///
/// Levels are ordered: `Beginner` precedes `Intermediate`. Completing the
/// last lesson of a level advances the learner to the first lesson of the
/// next one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelId {
    /// First level.
    #[default]
    Beginner,
    /// Second and final level.
    Intermediate,
}

impl LevelId {
    /// All levels in progression order.
    pub const ALL: [Self; 2] = [Self::Beginner, Self::Intermediate];

    /// Returns the level that follows this one, or `None` for the last level.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Beginner => Some(Self::Intermediate),
            Self::Intermediate => None,
        }
    }

    /// Returns `true` if this is the last level.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.next().is_none()
    }
}

impl std::fmt::Display for LevelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Intermediate => write!(f, "intermediate"),
        }
    }
}

// ============================================================================
// LessonStep and Lesson
// ============================================================================

/// An atomic instruction within a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonStep {
    /// Instruction text shown to the learner.
    pub instruction: String,

    /// Output the step expects. Empty means no output is required; such
    /// steps are never auto-advanced by output checking and need explicit
    /// host-side advancement.
    #[serde(default)]
    pub expected_output: String,

    /// Hint shown on request.
    pub hint: String,

    /// Code fragment the host can insert into the editable buffer.
    pub suggested_code: String,
}

impl LessonStep {
    /// Returns `true` if this step has an expected output to match against.
    #[must_use]
    pub fn expects_output(&self) -> bool {
        !self.expected_output.is_empty()
    }
}

/// A named unit of instruction containing an ordered sequence of steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Unique lesson identifier, stable across the whole catalog.
    pub id: u32,

    /// Lesson title.
    pub title: String,

    /// Ordered steps the learner works through.
    pub steps: Vec<LessonStep>,
}

// ============================================================================
// LessonCatalog
// ============================================================================

/// The full ordered set of levels and lessons.
///
/// Provided at process start and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCatalog {
    /// Lessons in the beginner level, in order.
    beginner: Vec<Lesson>,

    /// Lessons in the intermediate level, in order.
    intermediate: Vec<Lesson>,
}

impl LessonCatalog {
    /// Creates a catalog from explicit level contents.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::CatalogValidationError` if any level is empty,
    /// any lesson has no steps, or lesson ids repeat.
    pub fn new(beginner: Vec<Lesson>, intermediate: Vec<Lesson>) -> Result<Self> {
        let catalog = Self {
            beginner,
            intermediate,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Returns the built-in lesson catalog.
    ///
    /// Two beginner lessons (first program, variables) and one intermediate
    /// lesson (conditionals), all targeting Python.
    #[must_use]
    pub fn builtin() -> Self {
        let step = |instruction: &str, expected: &str, hint: &str, suggestion: &str| LessonStep {
            instruction: instruction.to_string(),
            expected_output: expected.to_string(),
            hint: hint.to_string(),
            suggested_code: suggestion.to_string(),
        };

        Self {
            beginner: vec![
                Lesson {
                    id: 1,
                    title: "Your First Program".to_string(),
                    steps: vec![
                        step(
                            "Type: print('Hello')",
                            "Hello",
                            "Just type exactly what you see above!",
                            "print('Hello')",
                        ),
                        step(
                            "Print two messages on separate lines",
                            "First line\nSecond line",
                            "Use two print statements one after another",
                            "print('First line')\nprint('Second line')",
                        ),
                    ],
                },
                Lesson {
                    id: 2,
                    title: "Variables".to_string(),
                    steps: vec![
                        step(
                            "Create a variable: name = 'Alice'",
                            "",
                            "Variables store information for later use",
                            "name = 'Alice'",
                        ),
                        step(
                            "Print your variable",
                            "Alice",
                            "Use print() with your variable name inside",
                            "print(name)",
                        ),
                    ],
                },
            ],
            intermediate: vec![Lesson {
                id: 3,
                title: "Conditionals".to_string(),
                steps: vec![step(
                    "Create an if statement checking if age > 18",
                    "Adult",
                    "Remember to set age variable first",
                    "age = 20\nif age > 18:\n    print('Adult')",
                )],
            }],
        }
    }

    /// Loads a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::CatalogNotFound` if the file doesn't exist,
    /// `QuestError::CatalogParseError` on invalid JSON, and
    /// `QuestError::CatalogValidationError` on structural problems.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                QuestError::catalog_not_found(path)
            } else {
                QuestError::Io(e)
            }
        })?;

        let catalog: Self = serde_json::from_str(&contents)
            .map_err(|e| QuestError::catalog_parse(path, e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Validates the catalog structure.
    ///
    /// Every level must contain at least one lesson (the progression state
    /// machine indexes into each level), every lesson at least one step,
    /// and lesson ids must be unique across the whole catalog.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::CatalogValidationError` describing the first
    /// violation found.
    pub fn validate(&self) -> Result<()> {
        let mut seen_ids = HashSet::new();
        for level in LevelId::ALL {
            let lessons = self.lessons(level);
            if lessons.is_empty() {
                return Err(QuestError::catalog_validation(format!(
                    "level '{level}' has no lessons"
                )));
            }
            for lesson in lessons {
                if lesson.steps.is_empty() {
                    return Err(QuestError::catalog_validation(format!(
                        "lesson {} ('{}') has no steps",
                        lesson.id, lesson.title
                    )));
                }
                if !seen_ids.insert(lesson.id) {
                    return Err(QuestError::catalog_validation(format!(
                        "duplicate lesson id {}",
                        lesson.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Returns the levels in progression order.
    #[must_use]
    pub const fn levels_in_order(&self) -> [LevelId; 2] {
        LevelId::ALL
    }

    /// Returns the lessons in the given level, in order.
    #[must_use]
    pub fn lessons(&self, level: LevelId) -> &[Lesson] {
        match level {
            LevelId::Beginner => &self.beginner,
            LevelId::Intermediate => &self.intermediate,
        }
    }

    /// Returns the lesson at `index` within `level`, if it exists.
    #[must_use]
    pub fn lesson(&self, level: LevelId, index: usize) -> Option<&Lesson> {
        self.lessons(level).get(index)
    }

    /// Returns the total number of lessons across all levels.
    #[must_use]
    pub fn total_lessons(&self) -> usize {
        LevelId::ALL
            .iter()
            .map(|level| self.lessons(*level).len())
            .sum()
    }
}

impl Default for LessonCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
