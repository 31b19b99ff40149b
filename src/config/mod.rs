//! Static panel configuration: segment descriptors, outbound endpoints and
//! narration settings. Loaded once at startup and immutable afterwards.

mod defaults;

use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use log::info;
use reqwest::Url;
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_ENV: &str = "OMNIA_PANEL_CONFIG";
pub const DEFAULT_COOLDOWN_MS: u64 = 30_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

/// Where and how to notify the external playback system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Serialized as JSON and sent only for `POST`.
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentDescriptor {
    pub id: String,
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub endpoint: EndpointConfig,
    /// `None` or `0` falls back to the panel-wide default.
    #[serde(default)]
    pub cooldown_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NarrationSettings {
    pub enabled: bool,
    pub speak_on_trigger: bool,
    /// Multipliers applied to the engine's normal rate, pitch and volume.
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub preferred_language: String,
    pub preferred_voice_names: Vec<String>,
    pub scripts: BTreeMap<String, String>,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            speak_on_trigger: true,
            rate: 0.9,
            pitch: 1.0,
            volume: 1.0,
            preferred_language: "en".into(),
            preferred_voice_names: vec!["Google".into(), "Natural".into()],
            scripts: BTreeMap::new(),
        }
    }
}

fn default_cooldown_ms() -> u64 {
    DEFAULT_COOLDOWN_MS
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PanelConfig {
    #[serde(default = "default_cooldown_ms")]
    pub default_cooldown_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    pub segments: Vec<SegmentDescriptor>,
    /// Called best-effort when a cooldown runs out on its own.
    #[serde(default)]
    pub completion_webhook: Option<EndpointConfig>,
    #[serde(default)]
    pub narration: NarrationSettings,
}

impl Default for PanelConfig {
    fn default() -> Self {
        defaults::builtin_panel()
    }
}

impl PanelConfig {
    pub fn from_json(contents: &str) -> Result<Self> {
        let config: PanelConfig =
            serde_json::from_str(contents).context("Failed to parse panel config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path` if it exists, otherwise falls back to the built-in panel.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(
                "No panel config at {}; using built-in segments",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read panel config from {}", path.display()))?;
        let config = Self::from_json(&contents)
            .with_context(|| format!("Invalid panel config at {}", path.display()))?;
        info!(
            "Loaded {} segments from {}",
            config.segments.len(),
            path.display()
        );
        Ok(config)
    }

    /// `OMNIA_PANEL_CONFIG` wins over the caller-provided default location.
    pub fn resolve_path(default_path: PathBuf) -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or(default_path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_cooldown_ms == 0 {
            bail!("defaultCooldownMs must be greater than zero");
        }
        if self.segments.is_empty() {
            bail!("panel config defines no segments");
        }

        let mut seen = HashSet::new();
        for segment in &self.segments {
            if segment.id.trim().is_empty() {
                bail!("segment '{}' has an empty id", segment.name);
            }
            if !seen.insert(segment.id.as_str()) {
                bail!("duplicate segment id '{}'", segment.id);
            }
            validate_url(&segment.endpoint.url)
                .with_context(|| format!("segment '{}' endpoint", segment.id))?;
        }

        if let Some(webhook) = &self.completion_webhook {
            validate_url(&webhook.url).context("completionWebhook")?;
        }

        let narration = &self.narration;
        for (field, value) in [
            ("rate", narration.rate),
            ("pitch", narration.pitch),
            ("volume", narration.volume),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("narration {field} must be a non-negative number, got {value}");
            }
        }

        Ok(())
    }
}

fn validate_url(url: &str) -> Result<()> {
    Url::parse(url).with_context(|| format!("invalid url '{url}'"))?;
    Ok(())
}

/// Read-only lookup over the configured segments.
#[derive(Debug, Clone)]
pub struct SegmentCatalog {
    segments: Vec<SegmentDescriptor>,
    default_cooldown_ms: u64,
}

impl SegmentCatalog {
    pub fn new(segments: Vec<SegmentDescriptor>, default_cooldown_ms: u64) -> Self {
        Self {
            segments,
            default_cooldown_ms,
        }
    }

    pub fn from_config(config: &PanelConfig) -> Self {
        Self::new(config.segments.clone(), config.default_cooldown_ms)
    }

    pub fn find(&self, segment_id: &str) -> Option<&SegmentDescriptor> {
        self.segments.iter().find(|segment| segment.id == segment_id)
    }

    pub fn cooldown_ms_for(&self, segment: &SegmentDescriptor) -> u64 {
        segment
            .cooldown_ms
            .filter(|ms| *ms > 0)
            .unwrap_or(self.default_cooldown_ms)
    }

    pub fn segments(&self) -> &[SegmentDescriptor] {
        &self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(id: &str, cooldown_ms: Option<u64>) -> SegmentDescriptor {
        SegmentDescriptor {
            id: id.into(),
            name: id.to_uppercase(),
            label: "Segment".into(),
            icon: None,
            color: None,
            endpoint: EndpointConfig {
                url: format!("http://localhost:9000/play/{id}"),
                method: HttpMethod::Get,
                headers: BTreeMap::new(),
                body: None,
            },
            cooldown_ms,
        }
    }

    #[test]
    fn cooldown_falls_back_to_default_when_unset_or_zero() {
        let catalog = SegmentCatalog::new(
            vec![
                segment("a", Some(1000)),
                segment("b", None),
                segment("c", Some(0)),
            ],
            500,
        );

        let a = catalog.find("a").unwrap();
        let b = catalog.find("b").unwrap();
        let c = catalog.find("c").unwrap();
        assert_eq!(catalog.cooldown_ms_for(a), 1000);
        assert_eq!(catalog.cooldown_ms_for(b), 500);
        assert_eq!(catalog.cooldown_ms_for(c), 500);
        assert!(catalog.find("missing").is_none());
    }

    #[test]
    fn parses_minimal_json_with_defaults() {
        let config = PanelConfig::from_json(
            r#"{
                "segments": [
                    {
                        "id": "a",
                        "name": "Alpha",
                        "label": "Segment 1",
                        "endpoint": { "url": "http://example.com/a" },
                        "cooldownMs": 1000
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.default_cooldown_ms, DEFAULT_COOLDOWN_MS);
        assert_eq!(config.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
        assert_eq!(config.segments[0].endpoint.method, HttpMethod::Get);
        assert_eq!(config.segments[0].cooldown_ms, Some(1000));
        assert!(config.completion_webhook.is_none());
        assert!(config.narration.enabled);
        assert!(config.narration.scripts.is_empty());
    }

    #[test]
    fn parses_post_endpoint_with_headers_and_body() {
        let config = PanelConfig::from_json(
            r#"{
                "defaultCooldownMs": 500,
                "segments": [
                    {
                        "id": "a",
                        "name": "Alpha",
                        "label": "Segment 1",
                        "endpoint": {
                            "url": "http://example.com/a",
                            "method": "POST",
                            "headers": { "Content-Type": "application/json" },
                            "body": { "action": "play" }
                        }
                    }
                ],
                "narration": { "rate": 1.2, "scripts": { "a": "Hello" } }
            }"#,
        )
        .unwrap();

        let endpoint = &config.segments[0].endpoint;
        assert_eq!(endpoint.method, HttpMethod::Post);
        assert_eq!(endpoint.headers["Content-Type"], "application/json");
        assert_eq!(endpoint.body, Some(serde_json::json!({ "action": "play" })));
        assert_eq!(config.narration.rate, 1.2);
        assert_eq!(config.narration.pitch, 1.0);
        assert_eq!(config.narration.scripts["a"], "Hello");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut config = PanelConfig::default();
        let first = config.segments[0].clone();
        config.segments.push(first);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate segment id"));
    }

    #[test]
    fn rejects_zero_default_cooldown_and_bad_urls() {
        let mut config = PanelConfig::default();
        config.default_cooldown_ms = 0;
        assert!(config.validate().is_err());

        let mut config = PanelConfig::default();
        config.segments[0].endpoint.url = "not a url".into();
        assert!(config.validate().is_err());

        let mut config = PanelConfig::default();
        config.segments.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_negative_narration_parameters() {
        let mut config = PanelConfig::default();
        config.narration.volume = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn builtin_panel_is_valid() {
        let config = PanelConfig::default();
        config.validate().unwrap();
        assert_eq!(config.segments.len(), 4);
        for segment in &config.segments {
            assert!(config.narration.scripts.contains_key(&segment.id));
        }
    }

    #[test]
    fn missing_file_loads_builtin_panel() {
        let path = std::env::temp_dir().join("omnia-panel-does-not-exist.json");
        let config = PanelConfig::load(&path).unwrap();
        assert_eq!(config, PanelConfig::default());
    }

    #[test]
    fn load_reports_invalid_file() {
        let path = std::env::temp_dir().join(format!(
            "omnia-panel-invalid-{}.json",
            std::process::id()
        ));
        fs::write(&path, "{ \"segments\": [] }").unwrap();
        let result = PanelConfig::load(&path);
        let _ = fs::remove_file(&path);
        assert!(result.is_err());
    }
}
