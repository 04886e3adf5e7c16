//! Console collaborators so replay sessions are observable on stdout.

use std::sync::{Arc, Mutex};

use crossbeam_channel::Sender;
use insight_voice::{
    CollaboratorError, Navigator, SpeechRecognizer, SpeechSynthesizer, TranscriptMessage,
};

/// Prints utterances instead of playing them.
pub(crate) struct ConsoleSynthesizer;

impl SpeechSynthesizer for ConsoleSynthesizer {
    fn speak(&mut self, text: &str) {
        println!("[speak] {text}");
    }

    fn stop(&mut self) {}
}

/// Prints route changes and keeps a back stack.
#[derive(Default)]
pub(crate) struct ConsoleNavigator {
    stack: Vec<String>,
}

impl Navigator for ConsoleNavigator {
    fn navigate(
        &mut self,
        route: &str,
        _params: Option<serde_json::Value>,
    ) -> Result<(), CollaboratorError> {
        println!("[navigate] {route}");
        self.stack.push(route.to_string());
        Ok(())
    }

    fn go_back(&mut self) -> Result<(), CollaboratorError> {
        self.stack.pop();
        match self.stack.last() {
            Some(route) => println!("[back] {route}"),
            None => println!("[back]"),
        }
        Ok(())
    }
}

/// Shared slot the replay loop primes before pressing the mic.
#[derive(Clone, Default)]
pub(crate) struct TranscriptScript(Arc<Mutex<Option<String>>>);

impl TranscriptScript {
    pub(crate) fn prime(&self, text: &str) {
        *self.0.lock().unwrap_or_else(|p| p.into_inner()) = Some(text.to_string());
    }

    fn take(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).take()
    }
}

/// Recognizer fed by the replay script instead of a microphone. Stopping a
/// recording delivers the primed line on the session channel, mirroring how
/// a real recognizer worker hands transcripts back asynchronously.
pub(crate) struct ScriptedRecognizer {
    script: TranscriptScript,
    sender: Sender<TranscriptMessage>,
}

impl ScriptedRecognizer {
    pub(crate) fn new(script: TranscriptScript, sender: Sender<TranscriptMessage>) -> Self {
        Self { script, sender }
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn start_recording(&mut self) -> Result<(), CollaboratorError> {
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<(), CollaboratorError> {
        let message = match self.script.take() {
            Some(text) => TranscriptMessage::Transcript(text),
            None => TranscriptMessage::Empty,
        };
        self.sender
            .send(message)
            .map_err(|_| CollaboratorError::new("session channel closed"))
    }
}
