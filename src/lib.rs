//! Shared InsightEye dispatcher exports that keep hosts and the CLI aligned
//! on one voice-command core.

pub mod collaborators;
pub mod config;
pub mod dispatch;
pub mod intent;
pub mod logging;
pub mod normalize;
pub mod session;
pub mod store;

pub use collaborators::{
    CollaboratorError, Document, Navigator, PersistenceGateway, SpeechRecognizer,
    SpeechSynthesizer,
};
pub use dispatch::{DispatchResult, EffectReport};
pub use intent::{Catalog, IntentRule, MatchedIntent, Pattern, RuleSet};
pub use logging::{init_logging, log_file_path};
pub use session::{SessionController, SessionEvent, SessionPhase, TranscriptMessage};
