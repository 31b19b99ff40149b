use serde::{Deserialize, Serialize};

use super::PlaybackState;

pub const BUSY_MESSAGE: &str = "Please wait for current playback to finish";

/// Result of a trigger attempt. None of these are errors from the panel's
/// point of view; the UI decides which toast to show.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TriggerOutcome {
    Triggered {
        segment_id: String,
        name: String,
        cooldown_ms: u64,
    },
    Busy {
        active_segment_id: Option<String>,
        message: String,
    },
    UnknownSegment {
        segment_id: String,
    },
}

/// Receives every state transition so the presentation layer can re-render.
pub trait PlaybackEvents: Send + Sync + 'static {
    fn state_changed(&self, state: &PlaybackState);

    /// A trigger was rejected because a cooldown is running.
    fn busy(&self, active_segment_id: Option<&str>, message: &str);
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn outcomes_serialize_with_kind_tag() {
        let triggered = TriggerOutcome::Triggered {
            segment_id: "a".into(),
            name: "Alpha".into(),
            cooldown_ms: 1000,
        };
        assert_eq!(
            serde_json::to_value(&triggered).unwrap(),
            json!({ "kind": "triggered", "segmentId": "a", "name": "Alpha", "cooldownMs": 1000 })
        );

        let busy = TriggerOutcome::Busy {
            active_segment_id: Some("a".into()),
            message: BUSY_MESSAGE.into(),
        };
        assert_eq!(
            serde_json::to_value(&busy).unwrap(),
            json!({ "kind": "busy", "activeSegmentId": "a", "message": BUSY_MESSAGE })
        );

        let unknown = TriggerOutcome::UnknownSegment {
            segment_id: "x".into(),
        };
        assert_eq!(
            serde_json::to_value(&unknown).unwrap(),
            json!({ "kind": "unknownSegment", "segmentId": "x" })
        );
    }
}
