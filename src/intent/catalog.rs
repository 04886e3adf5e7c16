//! Built-in per-screen vocabularies recovered from the InsightEye screens.
//!
//! Rule order is load-bearing wherever keywords overlap: on Home,
//! "schedule" is declared before "science" so "schedule my science quiz"
//! routes to scheduling, matching the app's historical `if` ordering.

use tracing::warn;

use super::{IntentRule, Pattern, RuleSet};
use crate::dispatch::{Action, DraftField};

/// Registry of every screen's rule set, selected by route name.
#[derive(Debug, Clone)]
pub struct Catalog {
    screens: Vec<RuleSet>,
}

fn nav(route: &str) -> Action {
    Action::Navigate {
        route: route.to_string(),
    }
}

impl Catalog {
    /// The full built-in catalog.
    #[must_use]
    pub fn builtin() -> Self {
        let screens = vec![
            RuleSet::new(
                "Home",
                "Welcome to InsightEye. Say schedule, object detection, science, or maths.",
            )
            .with_rule(Pattern::contains("schedule"), "GoToSchedule", nav("ScheduleHome"))
            .with_rule(
                Pattern::contains("object"),
                "GoToObjectDetection",
                nav("HomeScreen"),
            )
            .with_rule(
                Pattern::contains("detection"),
                "GoToObjectDetection",
                nav("HomeScreen"),
            )
            .with_rule(Pattern::contains("science"), "GoToScience", nav("MainHome"))
            .with_rule(Pattern::contains("math"), "GoToMaths", nav("NoteScreen"))
            .with_rule(Pattern::contains("profile"), "GoToProfile", nav("Profile"))
            .with_rule(Pattern::contains("log out"), "LogOut", Action::LogOut),
            RuleSet::new(
                "ScheduleHome",
                "Welcome to scheduling. Say task, emotion, or health.",
            )
            .with_rule(Pattern::contains("task"), "GoToTasks", nav("TasksManagement"))
            .with_rule(
                Pattern::contains("emotion"),
                "GoToEmotionTracker",
                nav("EmotionTracker"),
            )
            .with_rule(
                Pattern::contains("health"),
                "GoToHealthTracker",
                nav("HealthTracker"),
            )
            .with_rule(Pattern::contains("log out"), "LogOut", Action::LogOut)
            .with_rule(Pattern::whole_word("back"), "GoBack", Action::GoBack),
            RuleSet::new(
                "TasksManagement",
                "Task management. Say add task, delete, edit, complete, or generate report.",
            )
            .with_rule(Pattern::contains("add task"), "AddTask", nav("AddTasks"))
            .with_rule(Pattern::prefix("delete"), "DeleteTask", Action::DeleteTask)
            .with_rule(Pattern::prefix("edit"), "EditTask", Action::EditTask)
            .with_rule(Pattern::prefix("complete"), "CompleteTask", Action::CompleteTask)
            .with_rule(
                Pattern::contains("generate report"),
                "GenerateReport",
                Action::GenerateReport,
            )
            .with_rule(Pattern::whole_word("back"), "GoBack", Action::GoBack),
            draft_screen(
                "AddTasks",
                "Add a task. Say title, description, date, or time, then the value.",
                "save task",
                "SaveTask",
            ),
            draft_screen(
                "EditTask",
                "Edit the task. Say title, description, date, or time, then the value.",
                "update task",
                "UpdateTask",
            ),
            RuleSet::new(
                "NoteScreen",
                "Welcome to the Math Lesson Notes. Say add note or generate report.",
            )
            .with_rule(Pattern::contains("add note"), "AddNote", nav("NoteInput"))
            .with_rule(
                Pattern::contains("generate report"),
                "GenerateReport",
                Action::GenerateReport,
            )
            .with_rule(Pattern::whole_word("back"), "GoBack", Action::GoBack),
            RuleSet::new(
                "MainHome",
                "Science learning. Say student or instructor.",
            )
            .with_rule(Pattern::contains("student"), "GoToStudentHome", nav("StudentHome"))
            .with_rule(
                Pattern::contains("instructor"),
                "GoToInstructorHome",
                nav("InstructorHome"),
            )
            .with_rule(Pattern::contains("log out"), "LogOut", Action::LogOut)
            .with_rule(Pattern::whole_word("back"), "GoBack", Action::GoBack),
            RuleSet::new(
                "NoteDescription",
                "Note open. Say read this note, or stop.",
            )
            // "stop" is word-bounded so it cannot fire inside "nonstop".
            .with_rule(Pattern::whole_word("stop"), "StopReading", Action::StopSpeaking)
            .with_rule(Pattern::contains("read this note"), "ReadNote", Action::ReadNote)
            .with_rule(Pattern::whole_word("back"), "GoBack", Action::GoBack),
            RuleSet::new("EmotionTracker", "Emotion tracker. Say back to return.")
                .with_rule(Pattern::whole_word("back"), "GoBack", Action::GoBack),
            RuleSet::new(
                "HomeScreen",
                "Object detection. Say camera or gallery.",
            )
            .with_rule(Pattern::contains("camera"), "GoToCamera", nav("ObjectDetection"))
            .with_rule(Pattern::contains("detect"), "GoToCamera", nav("ObjectDetection"))
            .with_rule(Pattern::contains("gallery"), "GoToGallery", nav("ImageGallery"))
            .with_rule(Pattern::whole_word("back"), "GoBack", Action::GoBack),
        ];
        Self { screens }
    }

    #[must_use]
    pub fn get(&self, screen: &str) -> Option<&RuleSet> {
        self.screens.iter().find(|set| set.screen() == screen)
    }

    /// Screen names in declaration order.
    #[must_use]
    pub fn screen_names(&self) -> Vec<&str> {
        self.screens.iter().map(RuleSet::screen).collect()
    }

    /// Append extension rules after the built-ins of their screen, so
    /// built-in ordering keeps precedence. Unknown screens are skipped.
    pub fn extend(&mut self, extra: Vec<(String, IntentRule)>) {
        for (screen, rule) in extra {
            match self.screens.iter_mut().find(|set| set.screen() == screen) {
                Some(set) => set.push(rule),
                None => warn!(screen, "rules file names an unknown screen, skipping"),
            }
        }
    }
}

fn draft_screen(screen: &str, prompt: &str, save_phrase: &str, save_intent: &str) -> RuleSet {
    RuleSet::new(screen, prompt)
        // Save phrases are declared before the field captures so
        // "save task" never falls into a field rule.
        .with_rule(Pattern::contains(save_phrase), save_intent, Action::SaveDraft)
        .with_rule(
            Pattern::prefix("title"),
            "SetTitle",
            Action::SetDraftField {
                field: DraftField::Title,
            },
        )
        .with_rule(
            Pattern::prefix("description"),
            "SetDescription",
            Action::SetDraftField {
                field: DraftField::Description,
            },
        )
        .with_rule(
            Pattern::prefix("date"),
            "SetDueDate",
            Action::SetDraftField {
                field: DraftField::DueDate,
            },
        )
        .with_rule(
            Pattern::prefix("time"),
            "SetDueTime",
            Action::SetDraftField {
                field: DraftField::DueTime,
            },
        )
        .with_rule(Pattern::whole_word("back"), "GoBack", Action::GoBack)
}
