//! Voice narration for segments. Fire-and-forget: callers never wait on
//! speech and never see its failures.

pub mod engine;

use std::{
    collections::BTreeMap,
    sync::{mpsc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};

use crate::config::NarrationSettings;

use engine::{EngineFactory, SpeechEngine, SpeechParams, VoiceInfo};

pub trait Narrator: Send + Sync + 'static {
    /// Starts the script mapped to `segment_id`, cutting off anything in flight.
    /// Segments without a script are ignored.
    fn speak(&self, segment_id: &str);
    fn stop(&self);
}

/// First voice in the preferred language whose name contains one of the
/// preferred names, else the first voice in that language.
pub fn select_voice<'a>(
    voices: &'a [VoiceInfo],
    language: &str,
    preferred_names: &[String],
) -> Option<&'a VoiceInfo> {
    let language = language.to_ascii_lowercase();
    let in_language = |voice: &&VoiceInfo| voice.language.to_ascii_lowercase().starts_with(&language);

    voices
        .iter()
        .filter(in_language)
        .find(|voice| preferred_names.iter().any(|name| voice.name.contains(name.as_str())))
        .or_else(|| voices.iter().find(in_language))
}

enum NarrationCommand {
    Speak(String),
    Stop,
    Shutdown,
}

/// Owns a dedicated thread holding the (possibly non-`Send`) speech engine.
pub struct NarrationHandle {
    tx: mpsc::Sender<NarrationCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
    scripts: BTreeMap<String, String>,
    enabled: bool,
}

impl NarrationHandle {
    pub fn new(settings: &NarrationSettings) -> Result<Self> {
        Self::with_engine(settings, engine::platform_engine())
    }

    pub fn with_engine(settings: &NarrationSettings, factory: EngineFactory) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<NarrationCommand>();
        let params = SpeechParams {
            rate: settings.rate,
            pitch: settings.pitch,
            volume: settings.volume,
        };
        let language = settings.preferred_language.clone();
        let preferred_names = settings.preferred_voice_names.clone();

        let worker = thread::Builder::new()
            .name("narration".to_string())
            .spawn(move || {
                let mut engine = match factory() {
                    Ok(engine) => Some(engine),
                    Err(err) => {
                        warn!("Narration unavailable: {:#}", err);
                        None
                    }
                };
                let mut voice: Option<Option<VoiceInfo>> = None;

                while let Ok(command) = rx.recv() {
                    let Some(engine) = engine.as_mut() else {
                        if matches!(command, NarrationCommand::Shutdown) {
                            break;
                        }
                        continue;
                    };

                    match command {
                        NarrationCommand::Speak(text) => {
                            let voice = voice.get_or_insert_with(|| {
                                let voices = engine.voices();
                                let picked =
                                    select_voice(&voices, &language, &preferred_names).cloned();
                                if let Some(v) = &picked {
                                    info!("Narration voice: {} ({})", v.name, v.language);
                                }
                                picked
                            });
                            speak_now(&mut **engine, &text, params, voice.as_ref());
                        }
                        NarrationCommand::Stop => {
                            if let Err(err) = engine.stop() {
                                warn!("Failed to stop narration: {:#}", err);
                            }
                        }
                        NarrationCommand::Shutdown => {
                            let _ = engine.stop();
                            break;
                        }
                    }
                }
            })
            .map_err(|e| anyhow!("Failed to spawn narration thread: {e}"))?;

        Ok(Self {
            tx,
            worker: Mutex::new(Some(worker)),
            scripts: settings.scripts.clone(),
            enabled: settings.enabled,
        })
    }

    pub fn script_for(&self, segment_id: &str) -> Option<&str> {
        self.scripts.get(segment_id).map(String::as_str)
    }
}

fn speak_now(
    engine: &mut dyn SpeechEngine,
    text: &str,
    params: SpeechParams,
    voice: Option<&VoiceInfo>,
) {
    if let Err(err) = engine.stop() {
        warn!("Failed to cancel previous narration: {:#}", err);
    }
    if let Err(err) = engine.speak(text, params, voice) {
        warn!("Narration failed: {:#}", err);
    }
}

impl Narrator for NarrationHandle {
    fn speak(&self, segment_id: &str) {
        if !self.enabled {
            return;
        }
        let Some(script) = self.script_for(segment_id) else {
            debug!("No narration script for segment {}", segment_id);
            return;
        };
        if self.tx.send(NarrationCommand::Speak(script.to_string())).is_err() {
            warn!("Narration thread is gone; dropping script for {}", segment_id);
        }
    }

    fn stop(&self) {
        let _ = self.tx.send(NarrationCommand::Stop);
    }
}

impl Drop for NarrationHandle {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            let _ = self.tx.send(NarrationCommand::Shutdown);
            if let Err(join_err) = handle.join() {
                error!("Failed to join narration thread: {join_err:?}");
            }
        }
    }
}
