use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::{sync::Mutex, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::{
    config::{EndpointConfig, SegmentCatalog, SegmentDescriptor},
    narration::Narrator,
    notifier::Notifier,
};

use super::{
    events::{PlaybackEvents, TriggerOutcome, BUSY_MESSAGE},
    PlaybackState,
};

pub const PULSE_DURATION: Duration = Duration::from_millis(400);

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub progress: f64,
    pub remaining_ms: u64,
}

impl PlaybackSnapshot {
    pub fn at(state: PlaybackState, now_epoch_ms: i64) -> Self {
        Self {
            progress: state.progress_at(now_epoch_ms),
            remaining_ms: state.remaining_ms_at(now_epoch_ms),
            state,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResetCause {
    Manual,
    Expired,
}

/// The single armed auto-reset. `generation` identifies which trigger armed it.
struct CooldownTimer {
    generation: u64,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

#[derive(Default)]
struct CooldownSlot {
    last_generation: u64,
    armed: Option<CooldownTimer>,
}

impl CooldownSlot {
    /// Cancels whatever was armed before.
    fn disarm(&mut self) {
        if let Some(timer) = self.armed.take() {
            timer.cancel.cancel();
        }
    }
}

#[derive(Clone)]
pub struct PlaybackCoordinator {
    state: Arc<Mutex<PlaybackState>>,
    cooldown: Arc<Mutex<CooldownSlot>>,
    pulse: Arc<Mutex<Option<JoinHandle<()>>>>,
    catalog: Arc<SegmentCatalog>,
    notifier: Arc<dyn Notifier>,
    events: Arc<dyn PlaybackEvents>,
    narrator: Option<Arc<dyn Narrator>>,
    completion_webhook: Option<EndpointConfig>,
    pulse_duration: Duration,
}

impl PlaybackCoordinator {
    pub fn new(
        catalog: SegmentCatalog,
        notifier: Arc<dyn Notifier>,
        events: Arc<dyn PlaybackEvents>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(PlaybackState::new())),
            cooldown: Arc::new(Mutex::new(CooldownSlot::default())),
            pulse: Arc::new(Mutex::new(None)),
            catalog: Arc::new(catalog),
            notifier,
            events,
            narrator: None,
            completion_webhook: None,
            pulse_duration: PULSE_DURATION,
        }
    }

    /// Speak the segment's script after every accepted trigger.
    pub fn with_narrator(mut self, narrator: Arc<dyn Narrator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn with_completion_webhook(mut self, webhook: Option<EndpointConfig>) -> Self {
        self.completion_webhook = webhook;
        self
    }

    pub fn segments(&self) -> &[SegmentDescriptor] {
        self.catalog.segments()
    }

    pub async fn get_state(&self) -> PlaybackState {
        self.state.lock().await.clone()
    }

    pub async fn get_snapshot(&self) -> PlaybackSnapshot {
        let state = self.get_state().await;
        PlaybackSnapshot::at(state, now_epoch_ms())
    }

    pub async fn trigger(&self, segment_id: &str) -> TriggerOutcome {
        let Some(segment) = self.catalog.find(segment_id) else {
            warn!("No endpoint found for segment: {}", segment_id);
            return TriggerOutcome::UnknownSegment {
                segment_id: segment_id.to_string(),
            };
        };

        let cooldown_ms = {
            let mut state = self.state.lock().await;
            if !state.is_idle() {
                let active = state.active_segment_id.clone();
                drop(state);
                info!(
                    "Rejected trigger for {} while {:?} is playing",
                    segment_id, active
                );
                self.events.busy(active.as_deref(), BUSY_MESSAGE);
                return TriggerOutcome::Busy {
                    active_segment_id: active,
                    message: BUSY_MESSAGE.to_string(),
                };
            }

            state.pulsing_segment_id = Some(segment.id.clone());
            self.arm_pulse(&segment.id).await;

            let cooldown_ms = self.catalog.cooldown_ms_for(segment);
            info!(
                "Triggering external playback for {} ({}), cooldown {}ms",
                segment.name, segment.endpoint.url, cooldown_ms
            );
            self.dispatch(&segment.endpoint);

            state.lock_to(segment.id.clone(), cooldown_ms, now_epoch_ms());
            self.arm_cooldown(cooldown_ms).await;

            // Published under the lock so observers see transitions in order.
            self.events.state_changed(&state);
            cooldown_ms
        };

        if let Some(narrator) = &self.narrator {
            narrator.speak(&segment.id);
        }

        TriggerOutcome::Triggered {
            segment_id: segment.id.clone(),
            name: segment.name.clone(),
            cooldown_ms,
        }
    }

    /// Manual override. Always returns the panel to idle.
    pub async fn reset(&self) {
        self.reset_with(ResetCause::Manual, None).await;
    }

    async fn reset_with(&self, cause: ResetCause, generation: Option<u64>) {
        {
            let mut state = self.state.lock().await;
            let mut cooldown = self.cooldown.lock().await;

            if let Some(generation) = generation {
                let current = cooldown.armed.as_ref().map(|timer| timer.generation);
                if current != Some(generation) {
                    debug!("Ignoring stale cooldown expiry (generation {generation})");
                    return;
                }
                // The expiring task is the caller; just release the slot.
                cooldown.armed = None;
            } else {
                cooldown.disarm();
            }

            state.reset();
            self.events.state_changed(&state);
        }

        match cause {
            ResetCause::Manual => info!("Playback state reset manually; segments re-enabled"),
            ResetCause::Expired => info!("Cooldown elapsed; segments re-enabled"),
        }

        if cause == ResetCause::Expired {
            if let Some(webhook) = &self.completion_webhook {
                self.dispatch(webhook);
            }
        }
    }

    /// Replaces any armed cooldown timer. Caller holds the state lock.
    async fn arm_cooldown(&self, cooldown_ms: u64) {
        let mut slot = self.cooldown.lock().await;
        slot.disarm();
        slot.last_generation = slot.last_generation.wrapping_add(1);
        let generation = slot.last_generation;

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let coordinator = self.clone();
        let duration = Duration::from_millis(cooldown_ms);

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = time::sleep(duration) => {
                    coordinator
                        .reset_with(ResetCause::Expired, Some(generation))
                        .await;
                }
            }
        });

        slot.armed = Some(CooldownTimer {
            generation,
            cancel,
            _task: task,
        });
    }

    /// Clears the pulse marker after `pulse_duration`, independent of the lock.
    async fn arm_pulse(&self, segment_id: &str) {
        let mut pulse = self.pulse.lock().await;
        if let Some(previous) = pulse.take() {
            previous.abort();
        }

        let state = self.state.clone();
        let events = self.events.clone();
        let duration = self.pulse_duration;
        let segment_id = segment_id.to_string();

        *pulse = Some(tokio::spawn(async move {
            time::sleep(duration).await;
            let mut guard = state.lock().await;
            if guard.pulsing_segment_id.as_deref() != Some(segment_id.as_str()) {
                return;
            }
            guard.pulsing_segment_id = None;
            events.state_changed(&guard);
        }));
    }

    /// Fire-and-forget: the outcome is logged and never touches the state.
    fn dispatch(&self, endpoint: &EndpointConfig) {
        let request = self.notifier.notify(endpoint);
        let url = endpoint.url.clone();
        tokio::spawn(async move {
            let result: Result<()> = request.await;
            if let Err(err) = result {
                warn!("Notification to {} failed (ignored): {:#}", url, err);
            }
        });
    }
}

fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}
