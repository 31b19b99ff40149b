use serde::{Deserialize, Serialize};

/// Panel-wide playback state. Mutated only through `PlaybackCoordinator`.
///
/// `active_segment_id` and `started_at_epoch_ms` are set and cleared together,
/// and `locked` mirrors whether a segment is active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub locked: bool,
    pub active_segment_id: Option<String>,
    pub cooldown_ms: u64,
    pub started_at_epoch_ms: Option<i64>,
    /// Visual acknowledgement of the last tap; cleared by its own timer.
    pub pulsing_segment_id: Option<String>,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        !self.locked
    }

    pub fn lock_to(&mut self, segment_id: String, cooldown_ms: u64, started_at_epoch_ms: i64) {
        self.locked = true;
        self.active_segment_id = Some(segment_id);
        self.cooldown_ms = cooldown_ms;
        self.started_at_epoch_ms = Some(started_at_epoch_ms);
    }

    /// Back to idle. The pulse marker is left alone.
    pub fn reset(&mut self) {
        self.locked = false;
        self.active_segment_id = None;
        self.cooldown_ms = 0;
        self.started_at_epoch_ms = None;
    }

    /// Fraction of the cooldown elapsed at `now_epoch_ms`, clamped to `0..=1`.
    pub fn progress_at(&self, now_epoch_ms: i64) -> f64 {
        match self.started_at_epoch_ms {
            Some(started_at) if self.locked && self.cooldown_ms > 0 => {
                let elapsed = now_epoch_ms.saturating_sub(started_at).max(0) as f64;
                (elapsed / self.cooldown_ms as f64).min(1.0)
            }
            _ => 0.0,
        }
    }

    pub fn remaining_ms_at(&self, now_epoch_ms: i64) -> u64 {
        match self.started_at_epoch_ms {
            Some(started_at) if self.locked => {
                let elapsed = now_epoch_ms.saturating_sub(started_at).max(0) as u64;
                self.cooldown_ms.saturating_sub(elapsed)
            }
            _ => 0,
        }
    }
}
