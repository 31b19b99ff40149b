use chrono::Utc;
use serde::Serialize;
use tauri::{AppHandle, Emitter, State};

use crate::{
    config::SegmentDescriptor,
    narration::Narrator,
    playback::{PlaybackEvents, PlaybackSnapshot, PlaybackState, TriggerOutcome},
};

use crate::AppState;

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct PlaybackBusyEvent {
    active_segment_id: Option<String>,
    message: String,
}

/// Publishes coordinator transitions to the webview.
pub struct TauriEvents {
    app_handle: AppHandle,
}

impl TauriEvents {
    pub fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }
}

impl PlaybackEvents for TauriEvents {
    fn state_changed(&self, state: &PlaybackState) {
        let payload = PlaybackSnapshot::at(state.clone(), Utc::now().timestamp_millis());
        let _ = self.app_handle.emit("playback-state-changed", payload);
    }

    fn busy(&self, active_segment_id: Option<&str>, message: &str) {
        let payload = PlaybackBusyEvent {
            active_segment_id: active_segment_id.map(str::to_string),
            message: message.to_string(),
        };
        let _ = self.app_handle.emit("playback-busy", payload);
    }
}

#[tauri::command]
pub async fn get_playback_state(state: State<'_, AppState>) -> Result<PlaybackSnapshot, String> {
    Ok(state.playback.get_snapshot().await)
}

#[tauri::command]
pub async fn trigger_segment(
    state: State<'_, AppState>,
    segment_id: String,
) -> Result<TriggerOutcome, String> {
    Ok(state.playback.trigger(&segment_id).await)
}

#[tauri::command]
pub async fn reset_playback(state: State<'_, AppState>) -> Result<(), String> {
    state.playback.reset().await;
    Ok(())
}

#[tauri::command]
pub fn list_segments(state: State<'_, AppState>) -> Vec<SegmentDescriptor> {
    state.playback.segments().to_vec()
}

#[tauri::command]
pub fn speak_segment(state: State<'_, AppState>, segment_id: String) -> Result<(), String> {
    state
        .narration
        .as_ref()
        .ok_or("Narration is unavailable")?
        .speak(&segment_id);
    Ok(())
}

#[tauri::command]
pub fn stop_narration(state: State<'_, AppState>) {
    if let Some(narration) = &state.narration {
        narration.stop();
    }
}
