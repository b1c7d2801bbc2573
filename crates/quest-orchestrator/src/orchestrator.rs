//! Run orchestration for Quest.
//!
//! The orchestrator coordinates a single run: it submits source code
//! through the execution client, classifies success or failure, feeds the
//! output to the progress tracker, and packages everything into a
//! [`RunOutcome`] for the host to render. Every failure is recovered here;
//! nothing propagates past [`Orchestrator::run`].

use quest_executor::{CodeExecutor, ExecutionRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::QuestError;
use crate::progress::{LessonProgressTracker, ProgressEvent};

/// The host-facing result of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Whether the run executed cleanly (no transport failure, no stderr).
    pub success: bool,

    /// Non-empty trimmed lines of program output, in order.
    pub output_lines: Vec<String>,

    /// Human-readable failure description when `success` is false.
    pub error_message: Option<String>,

    /// The lesson-progression outcome, present only on successful runs.
    pub progress_event: Option<ProgressEvent>,
}

impl RunOutcome {
    /// Builds a failed outcome with no output and no progress event.
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output_lines: Vec::new(),
            error_message: Some(message.into()),
            progress_event: None,
        }
    }

    /// Returns `true` when the host should show a celebration: a lesson or
    /// level completed, or the program simply produced output successfully.
    #[must_use]
    pub fn is_celebratory(&self) -> bool {
        self.success
            && (self
                .progress_event
                .as_ref()
                .is_some_and(ProgressEvent::is_celebratory)
                || !self.output_lines.is_empty())
    }
}

/// Coordinates code execution and lesson progression for one session.
///
/// Generic over [`CodeExecutor`] so tests can substitute an in-memory
/// executor. `run` is the session's only suspension point; the `&mut self`
/// receiver enforces at most one run in flight.
#[derive(Debug)]
pub struct Orchestrator<E: CodeExecutor> {
    /// The execution backend.
    executor: E,

    /// The session's lesson progression engine.
    tracker: LessonProgressTracker,
}

impl<E: CodeExecutor> Orchestrator<E> {
    /// Creates an orchestrator from an executor and a tracker.
    #[must_use]
    pub fn new(executor: E, tracker: LessonProgressTracker) -> Self {
        Self { executor, tracker }
    }

    /// Returns the lesson progression tracker.
    #[must_use]
    pub const fn tracker(&self) -> &LessonProgressTracker {
        &self.tracker
    }

    /// Returns the tracker mutably, for explicit navigation and manual
    /// step advancement.
    pub fn tracker_mut(&mut self) -> &mut LessonProgressTracker {
        &mut self.tracker
    }

    /// Runs the given source code with empty stdin and evaluates its output
    /// against the current lesson step.
    pub async fn run(&mut self, language: &str, source_code: &str) -> RunOutcome {
        self.run_with_stdin(language, source_code, "").await
    }

    /// Runs the given source code and evaluates its output against the
    /// current lesson step.
    ///
    /// Empty or whitespace-only source fails immediately with
    /// "no code to execute" and no executor call. Executor failures and
    /// non-empty stderr both produce a failed outcome with the cause as
    /// `error_message`; the progress state is untouched on any failure.
    #[instrument(skip_all, fields(language = %language))]
    pub async fn run_with_stdin(
        &mut self,
        language: &str,
        source_code: &str,
        stdin: &str,
    ) -> RunOutcome {
        if source_code.trim().is_empty() {
            warn!("run rejected: empty source");
            return RunOutcome::failure(QuestError::EmptyInput.to_string());
        }

        let request = ExecutionRequest::new(language, source_code).with_stdin(stdin);
        let result = match self.executor.execute(&request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "execution failed");
                return RunOutcome::failure(e.to_string());
            }
        };

        if result.is_failure() {
            // The program ran but wrote to stderr; the whole run is treated
            // as failed regardless of what stdout contains.
            warn!("program reported errors on stderr");
            return RunOutcome::failure(result.stderr);
        }

        let output_lines: Vec<String> = result
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect();

        debug!(line_count = output_lines.len(), "evaluating program output");
        let event = self.tracker.evaluate(&output_lines);
        info!(event = ?event, "run evaluated");

        RunOutcome {
            success: true,
            output_lines,
            error_message: None,
            progress_event: Some(event),
        }
    }
}
