//! Collaborator seams so the dispatcher never calls vendor services directly.
//!
//! The host application supplies these four interfaces: speech capture,
//! speech playback, navigation, and the document store. Everything the
//! dispatcher does to the outside world flows through them, which is what
//! keeps the matcher and session machine testable with plain mocks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Failure reported by a collaborator call.
///
/// Collaborator failures are terminal at the executor boundary: they are
/// spoken to the user and logged, never propagated to the host as a crash.
#[derive(Debug)]
pub struct CollaboratorError {
    message: String,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "collaborator call failed: {}", self.message)
    }
}

impl std::error::Error for CollaboratorError {}

/// One document in a gateway collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: serde_json::Value,
}

/// Speech capture. Transcripts are delivered asynchronously on the session
/// channel once the recording stops, mirroring how the app's recorder hands
/// text back through a callback rather than a return value.
pub trait SpeechRecognizer {
    fn start_recording(&mut self) -> Result<(), CollaboratorError>;
    fn stop_recording(&mut self) -> Result<(), CollaboratorError>;
}

/// Speech playback. The engine is a process-wide singleton: only one
/// utterance may play at a time, so callers stop any prior utterance
/// before starting a new one.
pub trait SpeechSynthesizer {
    fn speak(&mut self, text: &str);
    fn stop(&mut self);
}

/// Route navigation owned by the host UI.
pub trait Navigator {
    fn navigate(
        &mut self,
        route: &str,
        params: Option<serde_json::Value>,
    ) -> Result<(), CollaboratorError>;
    fn go_back(&mut self) -> Result<(), CollaboratorError>;
}

/// Generic document-store access, standing in for the backend calls
/// scattered through the app screens.
pub trait PersistenceGateway {
    /// Insert a document and return its generated id.
    fn create(
        &mut self,
        collection: &str,
        data: serde_json::Value,
    ) -> Result<String, CollaboratorError>;

    /// Read every document in a collection.
    fn read(&mut self, collection: &str) -> Result<Vec<Document>, CollaboratorError>;

    /// Merge `patch` into an existing document's top-level fields.
    fn update(
        &mut self,
        collection: &str,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<(), CollaboratorError>;

    fn delete(&mut self, collection: &str, id: &str) -> Result<(), CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_error_display_includes_message() {
        let err = CollaboratorError::new("route missing");
        assert_eq!(err.to_string(), "collaborator call failed: route missing");
        assert_eq!(err.message(), "route missing");
    }
}
