//! Intent execution so matched commands become exactly one audited effect.

mod executor;
mod tasks;

use serde::Serialize;

pub use executor::{ActionExecutor, ScreenState};
pub use tasks::{render_task_report, NoteContent, TaskDraft, TaskRecord};

/// Spoken when a transcript matches no rule on the active screen.
pub const UNRECOGNIZED_PROMPT: &str = "Sorry, I didn't understand. Please say it again.";

/// Spoken when a collaborator call fails mid-effect.
pub const EXECUTION_FAILED_PROMPT: &str = "Sorry, something went wrong.";

/// Spoken when an argument rule names a task that does not exist.
pub const TASK_NOT_FOUND_PROMPT: &str = "Task not found, please try again.";

/// Draft field a capture rule writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    Title,
    Description,
    DueDate,
    DueTime,
}

impl DraftField {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DraftField::Title => "title",
            DraftField::Description => "description",
            DraftField::DueDate => "date",
            DraftField::DueTime => "time",
        }
    }
}

/// What a matched intent does. Bound per rule in the catalog so the
/// executor stays a pure dispatch over declarative tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Switch to a named route.
    Navigate { route: String },
    /// Return to the previous route.
    GoBack,
    /// Speak a fixed phrase.
    Speak { text: String },
    /// Cancel any in-flight utterance.
    StopSpeaking,
    /// Speak the note currently open on the screen.
    ReadNote,
    /// Write the captured argument into a task-draft field.
    SetDraftField { field: DraftField },
    /// Persist the draft: create when new, update when editing.
    SaveDraft,
    /// Delete the task whose title contains the captured fragment.
    DeleteTask,
    /// Mark the matched task completed.
    CompleteTask,
    /// Open the edit screen for the matched task.
    EditTask,
    /// Render the grouped task report and store it.
    GenerateReport,
    /// Speak a goodbye and return to the login route.
    LogOut,
}

/// Observable outcome of one dispatch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectReport {
    Navigated { route: String },
    WentBack,
    Spoke { text: String },
    StoppedSpeaking,
    DraftUpdated { field: DraftField },
    DraftSaved { id: String },
    TaskDeleted { title: String },
    TaskCompleted { title: String },
    TaskNotFound { fragment: String },
    ReportGenerated { id: String },
    LoggedOut,
    Unrecognized,
    Failed { message: String },
}

/// Result of dispatching one transcript, kept for observability and tests.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    /// Intent id of the winning rule, or `None` when nothing matched.
    pub matched_intent: Option<String>,
    /// Captured argument for prefix rules (task fragment, field value).
    pub argument: Option<String>,
    pub effect: EffectReport,
}

impl DispatchResult {
    #[must_use]
    pub fn unmatched() -> Self {
        Self {
            matched_intent: None,
            argument: None,
            effect: EffectReport::Unrecognized,
        }
    }
}
