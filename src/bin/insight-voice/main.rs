//! InsightEye replay CLI so dispatcher behavior is inspectable end to end.
//!
//! Replays transcripts against the real session machine with console
//! collaborators: `--transcript` dispatches one utterance and exits,
//! otherwise each stdin line is treated as one spoken command. Every
//! dispatch prints its `DispatchResult` as one JSON line.

mod console;

use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::unbounded;
use tracing::info;

use insight_voice::config::{config_file_path, cooldown_pinned, AppConfig, ConfigFile};
use insight_voice::intent::{load_rules_file, Catalog};
use insight_voice::store::JsonlStore;
use insight_voice::{
    init_logging, SessionController, SessionEvent, SessionPhase,
};

use crate::console::{ConsoleNavigator, ConsoleSynthesizer, ScriptedRecognizer, TranscriptScript};

fn main() -> Result<()> {
    let mut config = AppConfig::parse();
    let cooldown_env = std::env::var_os("INSIGHT_VOICE_COOLDOWN_MS");
    let pinned = cooldown_pinned(std::env::args(), cooldown_env.as_deref());
    let file = ConfigFile::load(config_file_path().as_ref())?;
    config.merge_file(&file, pinned);

    if config.logging_enabled() {
        init_logging()?;
        info!(screen = %config.screen, "insight-voice starting");
    }

    let mut catalog = Catalog::builtin();
    if config.list_screens {
        println!("Available screens:");
        for name in catalog.screen_names() {
            println!("  {name}");
        }
        return Ok(());
    }

    if let Some(path) = &config.rules_file {
        let extra = load_rules_file(path)?;
        info!(count = extra.len(), "loaded rule extensions");
        catalog.extend(extra);
    }

    let store_dir = config
        .store_dir
        .clone()
        .or_else(|| dirs::data_dir().map(|dir| dir.join("insight-voice").join("store")))
        .unwrap_or_else(|| std::env::temp_dir().join("insight-voice-store"));
    let store = JsonlStore::open(&store_dir)
        .with_context(|| format!("opening store at {}", store_dir.display()))?;

    let script = TranscriptScript::default();
    let (sender, receiver) = unbounded();
    let mut controller = SessionController::new(
        catalog,
        &config.screen,
        Box::new(ScriptedRecognizer::new(script.clone(), sender)),
        Box::new(ConsoleSynthesizer),
        Box::new(ConsoleNavigator::default()),
        Box::new(store),
        receiver,
        config.cooldown_ms,
    );

    if !config.no_prompts {
        controller.handle_event(SessionEvent::ScreenFocused {
            screen: config.screen.clone(),
        });
        controller.handle_event(SessionEvent::PromptFinished);
    }

    if let Some(transcript) = config.transcript.clone() {
        replay_one(&mut controller, &script, &transcript)?;
        controller.handle_event(SessionEvent::ScreenBlurred);
        return Ok(());
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading transcript from stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        replay_one(&mut controller, &script, line)?;
    }
    controller.handle_event(SessionEvent::ScreenBlurred);
    Ok(())
}

/// Drive one mic press / release cycle through the controller.
fn replay_one(
    controller: &mut SessionController,
    script: &TranscriptScript,
    transcript: &str,
) -> Result<()> {
    script.prime(transcript);
    controller.handle_event(SessionEvent::MicPressed);
    controller.handle_event(SessionEvent::MicPressed);
    while controller.phase() == SessionPhase::Transcribing {
        if !controller.poll() {
            thread::sleep(Duration::from_millis(5));
        }
    }
    if let Some(result) = controller.last_result() {
        let json = serde_json::to_string(result).context("encoding dispatch result")?;
        println!("{json}");
    }
    Ok(())
}
