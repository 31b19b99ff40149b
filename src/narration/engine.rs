//! Platform speech engines.
//!
//! Windows/macOS use the `tts` crate; Linux shells out to `espeak`, which
//! keeps the child around so an utterance can be cut short.

use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
    pub language: String,
}

/// Multipliers of the engine's normal values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechParams {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Lives on the narration thread only, so implementations need not be `Send`.
pub trait SpeechEngine {
    fn voices(&mut self) -> Vec<VoiceInfo>;
    fn speak(&mut self, text: &str, params: SpeechParams, voice: Option<&VoiceInfo>) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
}

pub type EngineFactory = Box<dyn FnOnce() -> Result<Box<dyn SpeechEngine>> + Send + 'static>;

pub fn platform_engine() -> EngineFactory {
    #[cfg(not(target_os = "linux"))]
    {
        Box::new(|| -> Result<Box<dyn SpeechEngine>> { Ok(Box::new(TtsEngine::new()?)) })
    }

    #[cfg(target_os = "linux")]
    {
        Box::new(|| -> Result<Box<dyn SpeechEngine>> { Ok(Box::new(EspeakEngine::new())) })
    }
}

#[cfg(not(target_os = "linux"))]
pub use self::tts_engine::TtsEngine;

#[cfg(not(target_os = "linux"))]
mod tts_engine {
    use anyhow::{Context, Result};
    use log::warn;

    use super::{SpeechEngine, SpeechParams, VoiceInfo};

    pub struct TtsEngine {
        tts: tts::Tts,
        voices: Vec<tts::Voice>,
    }

    impl TtsEngine {
        pub fn new() -> Result<Self> {
            let tts = tts::Tts::default().context("Failed to initialise text-to-speech")?;
            let voices = if tts.supported_features().voice {
                tts.voices().unwrap_or_default()
            } else {
                Vec::new()
            };
            Ok(Self { tts, voices })
        }
    }

    impl SpeechEngine for TtsEngine {
        fn voices(&mut self) -> Vec<VoiceInfo> {
            self.voices
                .iter()
                .map(|voice| VoiceInfo {
                    id: voice.id(),
                    name: voice.name(),
                    language: voice.language().to_string(),
                })
                .collect()
        }

        fn speak(
            &mut self,
            text: &str,
            params: SpeechParams,
            voice: Option<&VoiceInfo>,
        ) -> Result<()> {
            let features = self.tts.supported_features();

            if features.rate {
                let rate = (self.tts.normal_rate() * params.rate)
                    .clamp(self.tts.min_rate(), self.tts.max_rate());
                self.tts.set_rate(rate)?;
            }
            if features.pitch {
                let pitch = (self.tts.normal_pitch() * params.pitch)
                    .clamp(self.tts.min_pitch(), self.tts.max_pitch());
                self.tts.set_pitch(pitch)?;
            }
            if features.volume {
                let volume = (self.tts.max_volume() * params.volume)
                    .clamp(self.tts.min_volume(), self.tts.max_volume());
                self.tts.set_volume(volume)?;
            }
            if let Some(wanted) = voice {
                if let Some(found) = self.voices.iter().find(|v| v.id() == wanted.id) {
                    if let Err(err) = self.tts.set_voice(found) {
                        warn!("Failed to select voice {}: {}", wanted.name, err);
                    }
                }
            }

            self.tts.speak(text, true)?;
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            if self.tts.supported_features().stop {
                self.tts.stop()?;
            }
            Ok(())
        }
    }
}

#[cfg(target_os = "linux")]
pub use self::espeak::EspeakEngine;

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
mod espeak {
    use std::process::{Child, Command, Stdio};

    use anyhow::{Context, Result};
    use log::warn;

    use super::{SpeechEngine, SpeechParams, VoiceInfo};

    const NORMAL_WPM: f32 = 175.0;
    const NORMAL_PITCH: f32 = 50.0;
    const NORMAL_AMPLITUDE: f32 = 100.0;

    pub struct EspeakEngine {
        current: Option<Child>,
    }

    impl EspeakEngine {
        pub fn new() -> Self {
            Self { current: None }
        }
    }

    /// Parses the table printed by `espeak --voices`.
    pub(crate) fn parse_voice_table(output: &str) -> Vec<VoiceInfo> {
        output
            .lines()
            .skip(1)
            .filter_map(|line| {
                let columns: Vec<&str> = line.split_whitespace().collect();
                // Pty Language Age/Gender VoiceName File [Other Languages]
                if columns.len() < 5 {
                    return None;
                }
                Some(VoiceInfo {
                    id: columns[1].to_string(),
                    name: columns[3].to_string(),
                    language: columns[1].to_string(),
                })
            })
            .collect()
    }

    pub(crate) fn speech_args(params: SpeechParams, voice: Option<&VoiceInfo>) -> Vec<String> {
        let mut args = vec![
            "-s".to_string(),
            ((NORMAL_WPM * params.rate).round() as u32).to_string(),
            "-p".to_string(),
            ((NORMAL_PITCH * params.pitch).round().clamp(0.0, 99.0) as u32).to_string(),
            "-a".to_string(),
            ((NORMAL_AMPLITUDE * params.volume).round().clamp(0.0, 200.0) as u32).to_string(),
        ];
        if let Some(voice) = voice {
            args.push("-v".to_string());
            args.push(voice.id.clone());
        }
        args
    }

    impl SpeechEngine for EspeakEngine {
        fn voices(&mut self) -> Vec<VoiceInfo> {
            match Command::new("espeak").arg("--voices").output() {
                Ok(output) => parse_voice_table(&String::from_utf8_lossy(&output.stdout)),
                Err(err) => {
                    warn!("Failed to list espeak voices: {}", err);
                    Vec::new()
                }
            }
        }

        fn speak(
            &mut self,
            text: &str,
            params: SpeechParams,
            voice: Option<&VoiceInfo>,
        ) -> Result<()> {
            self.stop()?;
            let child = Command::new("espeak")
                .args(speech_args(params, voice))
                .arg(text)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .context("Failed to spawn espeak")?;
            self.current = Some(child);
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            if let Some(mut child) = self.current.take() {
                if child.try_wait()?.is_none() {
                    child.kill().context("Failed to stop espeak")?;
                }
                child.wait()?;
            }
            Ok(())
        }
    }

    impl Drop for EspeakEngine {
        fn drop(&mut self) {
            let _ = self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::espeak::{parse_voice_table, speech_args};
    use super::*;

    #[test]
    fn parses_espeak_voice_table() {
        let output = "\
Pty Language Age/Gender VoiceName          File          Other Languages
 5  af             M  afrikaans            other/af
 5  en-gb          M  english              default       (en 2)
 2  en-us          M  english-us           en-us         (en-r 5)(en 3)
";
        let voices = parse_voice_table(output);
        assert_eq!(voices.len(), 3);
        assert_eq!(
            voices[2],
            VoiceInfo {
                id: "en-us".into(),
                name: "english-us".into(),
                language: "en-us".into(),
            }
        );
    }

    #[test]
    fn espeak_args_scale_normal_values() {
        let params = SpeechParams {
            rate: 1.2,
            pitch: 1.0,
            volume: 0.5,
        };
        let voice = VoiceInfo {
            id: "en-gb".into(),
            name: "english".into(),
            language: "en-gb".into(),
        };
        assert_eq!(
            speech_args(params, Some(&voice)),
            vec!["-s", "210", "-p", "50", "-a", "50", "-v", "en-gb"]
        );
    }
}
