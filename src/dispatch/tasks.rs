//! Task records, draft assembly, and the grouped plain-text report.

use serde::{Deserialize, Serialize};

use crate::collaborators::Document;

/// One scheduled task as stored in the `tasks` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(skip_serializing, default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub due_time: String,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "pending".to_string()
}

impl TaskRecord {
    /// Decode a gateway document, skipping entries that are not tasks.
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let mut task: TaskRecord = serde_json::from_value(doc.data.clone()).ok()?;
        task.id = doc.id.clone();
        Some(task)
    }
}

/// Find the first task whose title contains the spoken fragment.
///
/// Containment is case-insensitive on both sides, matching how the app
/// resolved "delete buy groceries" against "Buy groceries".
#[must_use]
pub fn find_task_by_fragment<'a>(tasks: &'a [TaskRecord], fragment: &str) -> Option<&'a TaskRecord> {
    let fragment = fragment.trim().to_lowercase();
    if fragment.is_empty() {
        return None;
    }
    tasks
        .iter()
        .find(|task| task.title.to_lowercase().contains(&fragment))
}

/// In-progress task assembled one field at a time by capture rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub due_time: Option<String>,
}

impl TaskDraft {
    /// All four fields are required before the draft may be saved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.title.is_some()
            && self.description.is_some()
            && self.due_date.is_some()
            && self.due_time.is_some()
    }

    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "title": self.title.clone().unwrap_or_default(),
            "description": self.description.clone().unwrap_or_default(),
            "due_date": self.due_date.clone().unwrap_or_default(),
            "due_time": self.due_time.clone().unwrap_or_default(),
            "status": "pending",
        })
    }
}

/// Note open on a reading screen, spoken on "read this note".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteContent {
    pub title: String,
    pub description: String,
}

impl NoteContent {
    #[must_use]
    pub fn spoken_form(&self) -> String {
        format!("{}. {}", self.title, self.description)
    }
}

/// Render the task report grouped by due date, in first-seen date order.
#[must_use]
pub fn render_task_report(tasks: &[TaskRecord]) -> String {
    let mut dates: Vec<&str> = Vec::new();
    for task in tasks {
        if !dates.contains(&task.due_date.as_str()) {
            dates.push(&task.due_date);
        }
    }

    let mut out = String::from("InsightEye Task Report\n");
    for date in dates {
        let label = if date.is_empty() { "(no due date)" } else { date };
        out.push_str(&format!("\nDue Date: {label}\n"));
        for task in tasks.iter().filter(|t| t.due_date == date) {
            out.push_str(&format!(
                "  - {} | {} | {} | {}\n",
                task.title, task.description, task.due_time, task.status
            ));
        }
    }
    out
}
