//! Action execution against the collaborator seams.
//!
//! The executor is pure dispatch: every side effect goes through an
//! injected collaborator, and collaborator failures are converted into an
//! apology utterance rather than a propagated error. Voice UX must never
//! crash the host screen.

use tracing::{debug, warn};

use super::tasks::{find_task_by_fragment, NoteContent, TaskDraft, TaskRecord};
use super::{
    Action, DispatchResult, DraftField, EffectReport, EXECUTION_FAILED_PROMPT,
    TASK_NOT_FOUND_PROMPT, UNRECOGNIZED_PROMPT,
};
use crate::collaborators::{CollaboratorError, Navigator, PersistenceGateway, SpeechSynthesizer};
use crate::intent::MatchedIntent;

/// Gateway collection holding scheduled tasks.
const TASKS_COLLECTION: &str = "tasks";

/// Gateway collection holding generated reports.
const REPORTS_COLLECTION: &str = "reports";

/// Per-screen mutable state the executor may patch.
#[derive(Debug, Default)]
pub struct ScreenState {
    /// Draft assembled field-by-field on the add/edit screens.
    pub draft: TaskDraft,
    /// Task id under edit, so "update task" patches instead of creating.
    pub editing_task_id: Option<String>,
    /// Note currently open on a reading screen.
    pub current_note: Option<NoteContent>,
}

/// Executes one matched intent through the injected collaborators.
pub struct ActionExecutor<'a> {
    navigator: &'a mut dyn Navigator,
    synthesizer: &'a mut dyn SpeechSynthesizer,
    gateway: &'a mut dyn PersistenceGateway,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(
        navigator: &'a mut dyn Navigator,
        synthesizer: &'a mut dyn SpeechSynthesizer,
        gateway: &'a mut dyn PersistenceGateway,
    ) -> Self {
        Self {
            navigator,
            synthesizer,
            gateway,
        }
    }

    /// Perform the side effect for a match result.
    ///
    /// `None` means no rule matched: the retry prompt is spoken and the
    /// result records an unrecognized effect.
    pub fn execute(
        &mut self,
        matched: Option<&MatchedIntent<'_>>,
        state: &mut ScreenState,
    ) -> DispatchResult {
        let Some(m) = matched else {
            self.speak(UNRECOGNIZED_PROMPT);
            return DispatchResult::unmatched();
        };

        debug!(intent = m.intent, "executing intent");
        let effect = match self.run_action(m.action, m.argument.as_deref(), state) {
            Ok(effect) => effect,
            Err(err) => {
                warn!(intent = m.intent, error = err.message(), "effect failed");
                self.speak(EXECUTION_FAILED_PROMPT);
                EffectReport::Failed {
                    message: err.message().to_string(),
                }
            }
        };

        DispatchResult {
            matched_intent: Some(m.intent.to_string()),
            argument: m.argument.clone(),
            effect,
        }
    }

    fn run_action(
        &mut self,
        action: &Action,
        argument: Option<&str>,
        state: &mut ScreenState,
    ) -> Result<EffectReport, CollaboratorError> {
        match action {
            Action::Navigate { route } => {
                // Navigation interrupts any welcome prompt still playing.
                self.synthesizer.stop();
                self.navigator.navigate(route, None)?;
                Ok(EffectReport::Navigated {
                    route: route.clone(),
                })
            }
            Action::GoBack => {
                self.synthesizer.stop();
                self.navigator.go_back()?;
                Ok(EffectReport::WentBack)
            }
            Action::Speak { text } => {
                self.speak(text);
                Ok(EffectReport::Spoke { text: text.clone() })
            }
            Action::StopSpeaking => {
                self.synthesizer.stop();
                Ok(EffectReport::StoppedSpeaking)
            }
            Action::ReadNote => match &state.current_note {
                Some(note) => {
                    let text = note.spoken_form();
                    self.speak(&text);
                    Ok(EffectReport::Spoke { text })
                }
                None => {
                    self.speak("There is no note to read.");
                    Ok(EffectReport::Spoke {
                        text: "There is no note to read.".to_string(),
                    })
                }
            },
            Action::SetDraftField { field } => self.set_draft_field(*field, argument, state),
            Action::SaveDraft => self.save_draft(state),
            Action::DeleteTask => self.delete_task(argument),
            Action::CompleteTask => self.complete_task(argument),
            Action::EditTask => self.edit_task(argument, state),
            Action::GenerateReport => self.generate_report(),
            Action::LogOut => {
                self.speak("Logging out.");
                self.navigator.navigate("Login", None)?;
                Ok(EffectReport::LoggedOut)
            }
        }
    }

    fn set_draft_field(
        &mut self,
        field: DraftField,
        argument: Option<&str>,
        state: &mut ScreenState,
    ) -> Result<EffectReport, CollaboratorError> {
        let Some(value) = argument.filter(|v| !v.trim().is_empty()) else {
            let prompt = format!("Please say the {}.", field.label());
            self.speak(&prompt);
            return Ok(EffectReport::Spoke { text: prompt });
        };
        let value = value.trim().to_string();
        match field {
            DraftField::Title => state.draft.title = Some(value),
            DraftField::Description => state.draft.description = Some(value),
            DraftField::DueDate => state.draft.due_date = Some(value),
            DraftField::DueTime => state.draft.due_time = Some(value),
        }
        self.speak(&format!("{} set.", capitalize(field.label())));
        Ok(EffectReport::DraftUpdated { field })
    }

    fn save_draft(&mut self, state: &mut ScreenState) -> Result<EffectReport, CollaboratorError> {
        if !state.draft.is_complete() {
            self.speak("Please fill in all fields.");
            return Ok(EffectReport::Spoke {
                text: "Please fill in all fields.".to_string(),
            });
        }
        let value = state.draft.to_value();
        let (id, confirmation) = match state.editing_task_id.clone() {
            Some(id) => {
                self.gateway.update(TASKS_COLLECTION, &id, value)?;
                (id, "Task updated.")
            }
            None => {
                let id = self.gateway.create(TASKS_COLLECTION, value)?;
                (id, "Task saved.")
            }
        };
        state.draft = TaskDraft::default();
        state.editing_task_id = None;
        self.speak(confirmation);
        Ok(EffectReport::DraftSaved { id })
    }

    fn delete_task(&mut self, argument: Option<&str>) -> Result<EffectReport, CollaboratorError> {
        let tasks = self.load_tasks()?;
        let Some(task) = argument.and_then(|arg| find_task_by_fragment(&tasks, arg)) else {
            return Ok(self.task_not_found(argument));
        };
        let (id, title) = (task.id.clone(), task.title.clone());
        self.gateway.delete(TASKS_COLLECTION, &id)?;
        self.speak(&format!("{title} has been deleted."));
        Ok(EffectReport::TaskDeleted { title })
    }

    fn complete_task(&mut self, argument: Option<&str>) -> Result<EffectReport, CollaboratorError> {
        let tasks = self.load_tasks()?;
        let Some(task) = argument.and_then(|arg| find_task_by_fragment(&tasks, arg)) else {
            return Ok(self.task_not_found(argument));
        };
        let (id, title) = (task.id.clone(), task.title.clone());
        self.gateway.update(
            TASKS_COLLECTION,
            &id,
            serde_json::json!({ "status": "completed" }),
        )?;
        self.speak(&format!("{title} has been marked as completed."));
        Ok(EffectReport::TaskCompleted { title })
    }

    fn edit_task(
        &mut self,
        argument: Option<&str>,
        state: &mut ScreenState,
    ) -> Result<EffectReport, CollaboratorError> {
        let tasks = self.load_tasks()?;
        let Some(task) = argument.and_then(|arg| find_task_by_fragment(&tasks, arg)) else {
            return Ok(self.task_not_found(argument));
        };
        let id = task.id.clone();
        state.editing_task_id = Some(id.clone());
        self.synthesizer.stop();
        self.navigator
            .navigate("EditTask", Some(serde_json::json!({ "task_id": id })))?;
        Ok(EffectReport::Navigated {
            route: "EditTask".to_string(),
        })
    }

    fn generate_report(&mut self) -> Result<EffectReport, CollaboratorError> {
        let tasks = self.load_tasks()?;
        if tasks.is_empty() {
            self.speak("There are no tasks to report.");
            return Ok(EffectReport::Spoke {
                text: "There are no tasks to report.".to_string(),
            });
        }
        let body = super::tasks::render_task_report(&tasks);
        let id = self.gateway.create(
            REPORTS_COLLECTION,
            serde_json::json!({ "body": body, "task_count": tasks.len() }),
        )?;
        self.speak("Report generated.");
        Ok(EffectReport::ReportGenerated { id })
    }

    fn load_tasks(&mut self) -> Result<Vec<TaskRecord>, CollaboratorError> {
        let docs = self.gateway.read(TASKS_COLLECTION)?;
        Ok(docs.iter().filter_map(TaskRecord::from_document).collect())
    }

    fn task_not_found(&mut self, argument: Option<&str>) -> EffectReport {
        self.speak(TASK_NOT_FOUND_PROMPT);
        EffectReport::TaskNotFound {
            fragment: argument.unwrap_or_default().to_string(),
        }
    }

    /// The TTS engine is a process-wide singleton, so any prior utterance
    /// is cancelled before a new one starts.
    fn speak(&mut self, text: &str) {
        self.synthesizer.stop();
        self.synthesizer.speak(text);
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Document;
    use crate::intent::Catalog;
    use crate::normalize::normalize;

    #[derive(Default)]
    struct MockSynth {
        spoken: Vec<String>,
        stops: usize,
    }

    impl SpeechSynthesizer for MockSynth {
        fn speak(&mut self, text: &str) {
            self.spoken.push(text.to_string());
        }
        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    #[derive(Default)]
    struct MockNavigator {
        routes: Vec<String>,
        fail: bool,
    }

    impl Navigator for MockNavigator {
        fn navigate(
            &mut self,
            route: &str,
            _params: Option<serde_json::Value>,
        ) -> Result<(), CollaboratorError> {
            if self.fail {
                return Err(CollaboratorError::new("route does not exist"));
            }
            self.routes.push(route.to_string());
            Ok(())
        }
        fn go_back(&mut self) -> Result<(), CollaboratorError> {
            self.routes.push("<back>".to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockGateway {
        docs: Vec<Document>,
        deleted: Vec<String>,
        created: usize,
    }

    impl PersistenceGateway for MockGateway {
        fn create(
            &mut self,
            _collection: &str,
            data: serde_json::Value,
        ) -> Result<String, CollaboratorError> {
            self.created += 1;
            let id = format!("doc_{}", self.created);
            self.docs.push(Document {
                id: id.clone(),
                data,
            });
            Ok(id)
        }
        fn read(&mut self, _collection: &str) -> Result<Vec<Document>, CollaboratorError> {
            Ok(self.docs.clone())
        }
        fn update(
            &mut self,
            _collection: &str,
            id: &str,
            patch: serde_json::Value,
        ) -> Result<(), CollaboratorError> {
            let doc = self
                .docs
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| CollaboratorError::new("no such document"))?;
            if let (Some(obj), Some(patch)) = (doc.data.as_object_mut(), patch.as_object()) {
                for (k, v) in patch {
                    obj.insert(k.clone(), v.clone());
                }
            }
            Ok(())
        }
        fn delete(&mut self, _collection: &str, id: &str) -> Result<(), CollaboratorError> {
            self.deleted.push(id.to_string());
            self.docs.retain(|d| d.id != id);
            Ok(())
        }
    }

    fn task_doc(id: &str, title: &str) -> Document {
        Document {
            id: id.to_string(),
            data: serde_json::json!({
                "title": title,
                "description": "desc",
                "due_date": "2026-03-01",
                "due_time": "10:00",
                "status": "pending",
            }),
        }
    }

    fn dispatch(
        screen: &str,
        transcript: &str,
        nav: &mut MockNavigator,
        synth: &mut MockSynth,
        gateway: &mut MockGateway,
        state: &mut ScreenState,
    ) -> DispatchResult {
        let catalog = Catalog::builtin();
        let rules = catalog.get(screen).expect("screen");
        let normalized = normalize(transcript);
        let matched = rules.match_transcript(&normalized);
        let mut executor = ActionExecutor::new(nav, synth, gateway);
        executor.execute(matched.as_ref(), state)
    }

    #[test]
    fn unmatched_transcript_speaks_retry_prompt() {
        let (mut nav, mut synth, mut gw) = Default::default();
        let mut state = ScreenState::default();
        let result = dispatch("Home", "purple elephant", &mut nav, &mut synth, &mut gw, &mut state);
        assert_eq!(result.matched_intent, None);
        assert_eq!(result.effect, EffectReport::Unrecognized);
        assert_eq!(synth.spoken, vec![UNRECOGNIZED_PROMPT.to_string()]);
        assert!(nav.routes.is_empty());
    }

    #[test]
    fn home_schedule_scenario_navigates() {
        let (mut nav, mut synth, mut gw) = Default::default();
        let mut state = ScreenState::default();
        let result = dispatch(
            "Home",
            "i want to go to schedule",
            &mut nav,
            &mut synth,
            &mut gw,
            &mut state,
        );
        assert_eq!(result.matched_intent.as_deref(), Some("GoToSchedule"));
        assert_eq!(
            result.effect,
            EffectReport::Navigated {
                route: "ScheduleHome".to_string()
            }
        );
        assert_eq!(nav.routes, vec!["ScheduleHome".to_string()]);
    }

    #[test]
    fn delete_task_resolves_fragment_and_speaks_confirmation() {
        let mut gw = MockGateway::default();
        gw.docs.push(task_doc("t1", "Buy groceries"));
        let (mut nav, mut synth) = Default::default();
        let mut state = ScreenState::default();
        let result = dispatch(
            "TasksManagement",
            "delete buy groceries",
            &mut nav,
            &mut synth,
            &mut gw,
            &mut state,
        );
        assert_eq!(result.matched_intent.as_deref(), Some("DeleteTask"));
        assert_eq!(
            result.effect,
            EffectReport::TaskDeleted {
                title: "Buy groceries".to_string()
            }
        );
        assert_eq!(gw.deleted, vec!["t1".to_string()]);
        assert_eq!(synth.spoken, vec!["Buy groceries has been deleted.".to_string()]);
    }

    #[test]
    fn delete_task_miss_speaks_not_found() {
        let mut gw = MockGateway::default();
        gw.docs.push(task_doc("t1", "Buy groceries"));
        let (mut nav, mut synth) = Default::default();
        let mut state = ScreenState::default();
        let result = dispatch(
            "TasksManagement",
            "delete laundry",
            &mut nav,
            &mut synth,
            &mut gw,
            &mut state,
        );
        assert_eq!(
            result.effect,
            EffectReport::TaskNotFound {
                fragment: "laundry".to_string()
            }
        );
        assert_eq!(synth.spoken, vec![TASK_NOT_FOUND_PROMPT.to_string()]);
        assert!(gw.deleted.is_empty());
    }

    #[test]
    fn complete_task_patches_status() {
        let mut gw = MockGateway::default();
        gw.docs.push(task_doc("t1", "Buy groceries"));
        let (mut nav, mut synth) = Default::default();
        let mut state = ScreenState::default();
        let result = dispatch(
            "TasksManagement",
            "complete groceries",
            &mut nav,
            &mut synth,
            &mut gw,
            &mut state,
        );
        assert_eq!(
            result.effect,
            EffectReport::TaskCompleted {
                title: "Buy groceries".to_string()
            }
        );
        assert_eq!(gw.docs[0].data["status"], "completed");
    }

    #[test]
    fn edit_task_navigates_with_task_id_and_marks_state() {
        let mut gw = MockGateway::default();
        gw.docs.push(task_doc("t1", "Buy groceries"));
        let (mut nav, mut synth) = Default::default();
        let mut state = ScreenState::default();
        let result = dispatch(
            "TasksManagement",
            "edit groceries",
            &mut nav,
            &mut synth,
            &mut gw,
            &mut state,
        );
        assert_eq!(
            result.effect,
            EffectReport::Navigated {
                route: "EditTask".to_string()
            }
        );
        assert_eq!(state.editing_task_id.as_deref(), Some("t1"));
    }

    #[test]
    fn draft_flow_requires_all_fields_before_save() {
        let (mut nav, mut synth, mut gw) = Default::default();
        let mut state = ScreenState::default();
        dispatch("AddTasks", "title homework", &mut nav, &mut synth, &mut gw, &mut state);
        let early = dispatch("AddTasks", "save task", &mut nav, &mut synth, &mut gw, &mut state);
        assert_eq!(
            early.effect,
            EffectReport::Spoke {
                text: "Please fill in all fields.".to_string()
            }
        );

        dispatch(
            "AddTasks",
            "description chapter three",
            &mut nav,
            &mut synth,
            &mut gw,
            &mut state,
        );
        dispatch("AddTasks", "date march first", &mut nav, &mut synth, &mut gw, &mut state);
        dispatch("AddTasks", "time six pm", &mut nav, &mut synth, &mut gw, &mut state);
        let saved = dispatch("AddTasks", "save task", &mut nav, &mut synth, &mut gw, &mut state);
        assert_eq!(
            saved.effect,
            EffectReport::DraftSaved {
                id: "doc_1".to_string()
            }
        );
        assert_eq!(state.draft, TaskDraft::default());
        assert_eq!(gw.docs[0].data["title"], "homework");
    }

    #[test]
    fn update_task_patches_existing_document() {
        let mut gw = MockGateway::default();
        gw.docs.push(task_doc("t1", "Old title"));
        let (mut nav, mut synth) = Default::default();
        let mut state = ScreenState {
            editing_task_id: Some("t1".to_string()),
            ..ScreenState::default()
        };
        dispatch("EditTask", "title new title", &mut nav, &mut synth, &mut gw, &mut state);
        dispatch("EditTask", "description d", &mut nav, &mut synth, &mut gw, &mut state);
        dispatch("EditTask", "date tomorrow", &mut nav, &mut synth, &mut gw, &mut state);
        dispatch("EditTask", "time noon", &mut nav, &mut synth, &mut gw, &mut state);
        let result = dispatch("EditTask", "update task", &mut nav, &mut synth, &mut gw, &mut state);
        assert_eq!(
            result.effect,
            EffectReport::DraftSaved {
                id: "t1".to_string()
            }
        );
        assert_eq!(gw.docs[0].data["title"], "new title");
        assert_eq!(state.editing_task_id, None);
    }

    #[test]
    fn generate_report_stores_grouped_report() {
        let mut gw = MockGateway::default();
        gw.docs.push(task_doc("t1", "Buy groceries"));
        let (mut nav, mut synth) = Default::default();
        let mut state = ScreenState::default();
        let result = dispatch(
            "TasksManagement",
            "generate report",
            &mut nav,
            &mut synth,
            &mut gw,
            &mut state,
        );
        let EffectReport::ReportGenerated { id } = result.effect else {
            panic!("expected report effect, got {:?}", result.effect);
        };
        let report = gw.docs.iter().find(|d| d.id == id).expect("stored report");
        let body = report.data["body"].as_str().expect("body");
        assert!(body.contains("Due Date: 2026-03-01"));
        assert!(body.contains("Buy groceries"));
    }

    #[test]
    fn navigation_failure_is_spoken_not_propagated() {
        let mut nav = MockNavigator {
            fail: true,
            ..MockNavigator::default()
        };
        let (mut synth, mut gw) = <(MockSynth, MockGateway)>::default();
        let mut state = ScreenState::default();
        let result = dispatch("Home", "go to schedule", &mut nav, &mut synth, &mut gw, &mut state);
        assert_eq!(
            result.effect,
            EffectReport::Failed {
                message: "route does not exist".to_string()
            }
        );
        assert_eq!(synth.spoken, vec![EXECUTION_FAILED_PROMPT.to_string()]);
    }

    #[test]
    fn read_note_speaks_title_and_description() {
        let (mut nav, mut synth, mut gw) = Default::default();
        let mut state = ScreenState {
            current_note: Some(NoteContent {
                title: "Photosynthesis".to_string(),
                description: "Plants convert light.".to_string(),
            }),
            ..ScreenState::default()
        };
        let result = dispatch(
            "NoteDescription",
            "read this note",
            &mut nav,
            &mut synth,
            &mut gw,
            &mut state,
        );
        assert_eq!(
            result.effect,
            EffectReport::Spoke {
                text: "Photosynthesis. Plants convert light.".to_string()
            }
        );
    }

    #[test]
    fn stop_word_only_fires_as_whole_word() {
        let (mut nav, mut synth, mut gw) = Default::default();
        let mut state = ScreenState::default();
        let result = dispatch(
            "NoteDescription",
            "nonstop reading",
            &mut nav,
            &mut synth,
            &mut gw,
            &mut state,
        );
        assert_eq!(result.effect, EffectReport::Unrecognized);

        let stopped = dispatch(
            "NoteDescription",
            "stop",
            &mut nav,
            &mut synth,
            &mut gw,
            &mut state,
        );
        assert_eq!(stopped.effect, EffectReport::StoppedSpeaking);
    }

    #[test]
    fn every_speak_stops_prior_utterance_first() {
        let (mut nav, mut synth, mut gw) = Default::default();
        let mut state = ScreenState::default();
        dispatch("Home", "purple elephant", &mut nav, &mut synth, &mut gw, &mut state);
        assert_eq!(synth.stops, 1, "speak must cancel the singleton engine first");
        assert_eq!(synth.spoken.len(), 1);
    }
}
