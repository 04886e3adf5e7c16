//! Session control so one screen processes one transcript at a time.
//!
//! The controller owns the active-screen context and the prompt playback
//! lifecycle: it speaks the welcome prompt on focus, accepts exactly one
//! recording cycle at a time, dispatches the resulting transcript, and
//! clears the preview after a cooldown. Screen blur or drop cancels any
//! in-flight speech exactly once and discards pending transcripts.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};
use tracing::{debug, warn};

use crate::collaborators::{Navigator, PersistenceGateway, SpeechRecognizer, SpeechSynthesizer};
use crate::dispatch::{ActionExecutor, DispatchResult, EffectReport, ScreenState};
use crate::intent::Catalog;
use crate::normalize::{normalize, transcript_preview};

/// Max characters shown in the transcript preview toast.
const TRANSCRIPT_PREVIEW_MAX: usize = 60;

/// Cooldown clamp bounds; screens historically used 1 to 5 seconds.
pub const MIN_COOLDOWN_MS: u64 = 1000;
pub const MAX_COOLDOWN_MS: u64 = 5000;

/// Phase of the per-screen voice cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Prompting,
    Listening,
    Transcribing,
    Dispatching,
    Cooldown,
}

/// Host-driven events the controller reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A screen gained focus; its welcome prompt starts playing.
    ScreenFocused { screen: String },
    /// The welcome prompt finished on its own.
    PromptFinished,
    /// Mic button pressed: starts a recording from rest, stops one in flight.
    MicPressed,
    /// The screen lost focus or unmounted.
    ScreenBlurred,
}

/// Message from the recognizer worker once a recording stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptMessage {
    /// A transcript was produced.
    Transcript(String),
    /// The recording contained no speech.
    Empty,
    /// Upstream transcription failed.
    Error(String),
}

/// Owns the voice cycle for the active screen.
pub struct SessionController {
    catalog: Catalog,
    screen: String,
    phase: SessionPhase,
    recognizer: Box<dyn SpeechRecognizer>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    navigator: Box<dyn Navigator>,
    gateway: Box<dyn PersistenceGateway>,
    transcripts: Receiver<TranscriptMessage>,
    cooldown: Duration,
    cooldown_deadline: Option<Instant>,
    preview: Option<String>,
    state: ScreenState,
    last_result: Option<DispatchResult>,
    speech_active: bool,
}

impl SessionController {
    pub fn new(
        catalog: Catalog,
        initial_screen: &str,
        recognizer: Box<dyn SpeechRecognizer>,
        synthesizer: Box<dyn SpeechSynthesizer>,
        navigator: Box<dyn Navigator>,
        gateway: Box<dyn PersistenceGateway>,
        transcripts: Receiver<TranscriptMessage>,
        cooldown_ms: u64,
    ) -> Self {
        Self {
            catalog,
            screen: initial_screen.to_string(),
            phase: SessionPhase::Idle,
            recognizer,
            synthesizer,
            navigator,
            gateway,
            transcripts,
            cooldown: Duration::from_millis(clamp_cooldown_ms(cooldown_ms)),
            cooldown_deadline: None,
            preview: None,
            state: ScreenState::default(),
            last_result: None,
            speech_active: false,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn screen(&self) -> &str {
        &self.screen
    }

    /// Preview text for the transcript toast, if one is showing.
    #[must_use]
    pub fn transcript_preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    #[must_use]
    pub fn last_result(&self) -> Option<&DispatchResult> {
        self.last_result.as_ref()
    }

    /// Mutable screen state for hosts that load notes or drafts externally.
    pub fn screen_state_mut(&mut self) -> &mut ScreenState {
        &mut self.state
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ScreenFocused { screen } => self.on_focus(&screen),
            SessionEvent::PromptFinished => {
                if self.phase == SessionPhase::Prompting {
                    self.speech_active = false;
                    self.phase = SessionPhase::Idle;
                }
            }
            SessionEvent::MicPressed => self.on_mic_pressed(),
            SessionEvent::ScreenBlurred => self.on_blur(),
        }
    }

    /// Drain recognizer messages and expire the cooldown. Returns `true`
    /// when the cycle advanced, so callers can idle-poll cheaply.
    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    fn poll_at(&mut self, now: Instant) -> bool {
        match self.phase {
            SessionPhase::Transcribing => self.drain_transcripts(now),
            SessionPhase::Cooldown => {
                let expired = self
                    .cooldown_deadline
                    .is_some_and(|deadline| now >= deadline);
                if expired {
                    // The cooldown always clears the transcript, whatever
                    // the executor did with it.
                    self.preview = None;
                    self.cooldown_deadline = None;
                    self.phase = SessionPhase::Idle;
                }
                expired
            }
            _ => false,
        }
    }

    fn on_focus(&mut self, screen: &str) {
        self.stop_speech();
        self.discard_pending();
        if self.catalog.get(screen).is_none() {
            warn!(screen, "focused screen has no rule set");
        }
        if screen != self.screen {
            // Entering a new screen resets per-screen state.
            self.state = ScreenState::default();
            self.screen = screen.to_string();
        }
        let prompt = self
            .catalog
            .get(screen)
            .map(|set| set.welcome_prompt().to_string());
        if let Some(prompt) = prompt {
            self.synthesizer.speak(&prompt);
            self.speech_active = true;
            self.phase = SessionPhase::Prompting;
        } else {
            self.phase = SessionPhase::Idle;
        }
    }

    fn on_mic_pressed(&mut self) {
        match self.phase {
            SessionPhase::Idle | SessionPhase::Prompting | SessionPhase::Cooldown => {
                // A new recording may start once the previous cycle has
                // reached cooldown; mid-dispatch presses are ignored.
                self.stop_speech();
                self.preview = None;
                self.cooldown_deadline = None;
                self.last_result = None;
                match self.recognizer.start_recording() {
                    Ok(()) => self.phase = SessionPhase::Listening,
                    Err(err) => {
                        warn!(error = err.message(), "recording failed to start");
                        self.phase = SessionPhase::Idle;
                    }
                }
            }
            SessionPhase::Listening => match self.recognizer.stop_recording() {
                Ok(()) => self.phase = SessionPhase::Transcribing,
                Err(err) => {
                    warn!(error = err.message(), "recording failed to stop");
                    self.phase = SessionPhase::Idle;
                }
            },
            SessionPhase::Transcribing | SessionPhase::Dispatching => {
                debug!("mic press ignored while a transcript is in flight");
            }
        }
    }

    fn on_blur(&mut self) {
        self.stop_speech();
        self.discard_pending();
        self.preview = None;
        self.cooldown_deadline = None;
        self.phase = SessionPhase::Idle;
    }

    fn drain_transcripts(&mut self, now: Instant) -> bool {
        match self.transcripts.try_recv() {
            Ok(TranscriptMessage::Transcript(text)) => {
                let normalized = normalize(&text);
                if normalized.is_empty() {
                    // Recognition produced nothing usable; treat as a no-op.
                    self.phase = SessionPhase::Idle;
                } else {
                    self.dispatch(&text, &normalized, now);
                }
                true
            }
            Ok(TranscriptMessage::Empty) => {
                debug!("no speech detected");
                self.phase = SessionPhase::Idle;
                true
            }
            Ok(TranscriptMessage::Error(message)) => {
                warn!(error = %message, "transcription failed");
                self.phase = SessionPhase::Idle;
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                warn!("recognizer worker disconnected");
                self.phase = SessionPhase::Idle;
                true
            }
        }
    }

    fn dispatch(&mut self, raw: &str, normalized: &str, now: Instant) {
        self.phase = SessionPhase::Dispatching;
        self.preview = Some(transcript_preview(raw, TRANSCRIPT_PREVIEW_MAX));

        let matched = self
            .catalog
            .get(&self.screen)
            .and_then(|set| set.match_transcript(normalized));
        let result = {
            let mut executor = ActionExecutor::new(
                self.navigator.as_mut(),
                self.synthesizer.as_mut(),
                self.gateway.as_mut(),
            );
            executor.execute(matched.as_ref(), &mut self.state)
        };
        // The executor speaks confirmations and apologies itself; whatever
        // it said is the active utterance now.
        self.speech_active = matches!(
            result.effect,
            EffectReport::Spoke { .. }
                | EffectReport::Unrecognized
                | EffectReport::Failed { .. }
                | EffectReport::TaskNotFound { .. }
                | EffectReport::TaskDeleted { .. }
                | EffectReport::TaskCompleted { .. }
                | EffectReport::DraftSaved { .. }
                | EffectReport::DraftUpdated { .. }
                | EffectReport::ReportGenerated { .. }
                | EffectReport::LoggedOut
        );

        // Track route changes so the next cycle matches against the new
        // screen's rules even before the host refocuses it.
        match &result.effect {
            EffectReport::Navigated { route } => {
                if *route != self.screen {
                    // Editing a task navigates to the edit screen in the
                    // same dispatch that marks the task; that marker must
                    // survive the screen switch it triggered.
                    let editing = (route.as_str() == "EditTask")
                        .then(|| self.state.editing_task_id.take())
                        .flatten();
                    self.state = ScreenState::default();
                    self.state.editing_task_id = editing;
                    self.screen = route.clone();
                }
            }
            EffectReport::LoggedOut => {
                self.state = ScreenState::default();
                self.screen = "Login".to_string();
            }
            _ => {}
        }

        debug!(
            screen = %self.screen,
            intent = result.matched_intent.as_deref().unwrap_or("<none>"),
            "dispatch complete"
        );
        self.last_result = Some(result);
        self.cooldown_deadline = Some(now + self.cooldown);
        self.phase = SessionPhase::Cooldown;
    }

    fn discard_pending(&mut self) {
        while self.transcripts.try_recv().is_ok() {}
    }

    /// Stop playback at most once per active utterance.
    fn stop_speech(&mut self) {
        if self.speech_active {
            self.synthesizer.stop();
            self.speech_active = false;
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        // Unmount cancels in-flight speech; blur already did if it ran.
        self.stop_speech();
    }
}

/// Clamp a configured cooldown into the supported window.
#[must_use]
pub fn clamp_cooldown_ms(ms: u64) -> u64 {
    ms.clamp(MIN_COOLDOWN_MS, MAX_COOLDOWN_MS)
}
