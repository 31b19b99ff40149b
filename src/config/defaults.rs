use std::collections::BTreeMap;

use serde_json::json;

use super::{
    EndpointConfig, HttpMethod, NarrationSettings, PanelConfig, SegmentDescriptor,
    DEFAULT_COOLDOWN_MS, DEFAULT_REQUEST_TIMEOUT_MS,
};

const PLAY_BASE_URL: &str = "https://your-server.com/api/play";

// (id, name, label, icon, color)
const SEGMENTS: [(&str, &str, &str, &str, &str); 4] = [
    ("ai-home", "AI Home Assistant", "Smart Living", "sunset", "orange"),
    ("food-intelligence", "Food Intelligence", "Healthy Living", "kitchen", "cyan"),
    ("life-tech", "Life-Elevating Tech", "3D Printing", "flowers", "green"),
    ("safety", "Safety & Security", "Protection", "security", "red"),
];

const SCRIPTS: [(&str, &str); 4] = [
    (
        "ai-home",
        "Your home understands you. It studies your habits, your comfort, your rhythm. \
         From the moment you wake up, it adjusts the light, the temperature, and the mood of \
         the space without you asking. It learns your routines, prepares your day, and keeps \
         everything running quietly in the background. A home that reacts with intention… \
         almost like it knows you.",
    ),
    (
        "food-intelligence",
        "Fresh ingredients are always within reach. Your fridge tracks what you have, what \
         you need, and what's missing. If you run out of something, the system orders it \
         instantly, and a drone delivers it straight to your window. Your indoor garden grows \
         herbs and greens picked at the perfect moment. Here, eating well becomes the easiest \
         part of your day.",
    ),
    (
        "life-tech",
        "In the future, your home can create anything you need. A tool, a container, a \
         missing part, all designed on the spot and printed in minutes. Your AI suggests \
         improvements, custom sizes, even new ideas you didn't expect. The result appears \
         right in front of you, ready to use. The home becomes a small factory that works \
         for you.",
    ),
    (
        "safety",
        "Safety becomes effortless. Your home anticipates risks long before you notice them. \
         If the weather shifts, the blinds close… if something unusual happens outside, the \
         system locks the windows and alerts you. Sensors watch quietly over every room, \
         keeping the space calm and protected. It's a home that looks after you, always.",
    ),
];

/// Panel used when no config file is present: four POST endpoints, 30 s each.
pub(super) fn builtin_panel() -> PanelConfig {
    let segments = SEGMENTS
        .iter()
        .map(|(id, name, label, icon, color)| SegmentDescriptor {
            id: (*id).into(),
            name: (*name).into(),
            label: (*label).into(),
            icon: Some((*icon).into()),
            color: Some((*color).into()),
            endpoint: EndpointConfig {
                url: format!("{PLAY_BASE_URL}/{id}"),
                method: HttpMethod::Post,
                headers: BTreeMap::from([("Content-Type".into(), "application/json".into())]),
                body: Some(json!({ "action": "play", "segment": id })),
            },
            cooldown_ms: Some(DEFAULT_COOLDOWN_MS),
        })
        .collect();

    let scripts = SCRIPTS
        .iter()
        .map(|(id, text)| ((*id).to_string(), (*text).to_string()))
        .collect();

    PanelConfig {
        default_cooldown_ms: DEFAULT_COOLDOWN_MS,
        request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        segments,
        completion_webhook: None,
        narration: NarrationSettings {
            scripts,
            ..NarrationSettings::default()
        },
    }
}
