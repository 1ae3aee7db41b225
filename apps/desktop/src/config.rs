use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use client_core::{
    ChannelSettings, DEFAULT_ENDPOINT, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY,
};
use presenter::{
    engine::{DEFAULT_NOTICE_DURATION, DEFAULT_TRANSITION_SETTLE},
    parse_manifest, EngineSettings, ZoomSettings,
};
use serde::Deserialize;
use shared::domain::SlideId;

pub const DEFAULT_CONFIG_FILE: &str = "presenter.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: String,
    pub max_reconnect_attempts: u32,
    pub reconnect_delay_ms: u64,
    pub slides_dir: PathBuf,
    pub slides: Vec<String>,
    pub manifest: Option<PathBuf>,
    pub transition_settle_ms: u64,
    pub notice_duration_ms: u64,
    pub zoom: ZoomSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY.as_millis() as u64,
            slides_dir: PathBuf::from("slides"),
            slides: Vec::new(),
            manifest: None,
            transition_settle_ms: DEFAULT_TRANSITION_SETTLE.as_millis() as u64,
            notice_duration_ms: DEFAULT_NOTICE_DURATION.as_millis() as u64,
            zoom: ZoomSettings::default(),
        }
    }
}

/// Keys accepted in `presenter.toml`. Anything absent keeps its default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    endpoint: Option<String>,
    max_reconnect_attempts: Option<u32>,
    reconnect_delay_ms: Option<u64>,
    slides_dir: Option<PathBuf>,
    slides: Option<Vec<String>>,
    manifest: Option<PathBuf>,
    transition_settle_ms: Option<u64>,
    notice_duration_ms: Option<u64>,
    zoom_min: Option<f64>,
    zoom_max: Option<f64>,
    zoom_step: Option<f64>,
}

/// Defaults, then the TOML file when present, then `APP__*` environment
/// overrides looked up through `env`. A file that exists but does not parse
/// is an error.
pub fn load_settings(path: &Path, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            settings.apply_file(file);
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    if let Some(v) = env("APP__ENDPOINT") {
        settings.endpoint = v;
    }
    if let Some(v) = env("APP__MAX_RECONNECT_ATTEMPTS") {
        settings.max_reconnect_attempts = v
            .parse()
            .with_context(|| format!("APP__MAX_RECONNECT_ATTEMPTS '{v}' is not a number"))?;
    }
    if let Some(v) = env("APP__RECONNECT_DELAY_MS") {
        settings.reconnect_delay_ms = v
            .parse()
            .with_context(|| format!("APP__RECONNECT_DELAY_MS '{v}' is not a number"))?;
    }
    if let Some(v) = env("APP__SLIDES_DIR") {
        settings.slides_dir = PathBuf::from(v);
    }

    Ok(settings)
}

impl Settings {
    fn apply_file(&mut self, file: FileSettings) {
        if let Some(v) = file.endpoint {
            self.endpoint = v;
        }
        if let Some(v) = file.max_reconnect_attempts {
            self.max_reconnect_attempts = v;
        }
        if let Some(v) = file.reconnect_delay_ms {
            self.reconnect_delay_ms = v;
        }
        if let Some(v) = file.slides_dir {
            self.slides_dir = v;
        }
        if let Some(v) = file.slides {
            self.slides = v;
        }
        if let Some(v) = file.manifest {
            self.manifest = Some(v);
        }
        if let Some(v) = file.transition_settle_ms {
            self.transition_settle_ms = v;
        }
        if let Some(v) = file.notice_duration_ms {
            self.notice_duration_ms = v;
        }
        if let Some(v) = file.zoom_min {
            self.zoom.min = v;
        }
        if let Some(v) = file.zoom_max {
            self.zoom.max = v;
        }
        if let Some(v) = file.zoom_step {
            self.zoom.step = v;
        }
    }

    pub fn channel_settings(&self) -> ChannelSettings {
        ChannelSettings {
            endpoint: self.endpoint.clone(),
            max_reconnect_attempts: self.max_reconnect_attempts,
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            zoom: self.zoom,
            transition_settle: Duration::from_millis(self.transition_settle_ms),
            notice_duration: Duration::from_millis(self.notice_duration_ms),
        }
    }

    /// Explicit slide ids win over a manifest file.
    pub fn slide_ids(&self) -> anyhow::Result<Vec<SlideId>> {
        if !self.slides.is_empty() {
            return Ok(self
                .slides
                .iter()
                .map(|id| id.trim())
                .filter(|id| !id.is_empty())
                .map(SlideId::new)
                .collect());
        }
        let Some(manifest) = &self.manifest else {
            bail!("no slides given, pass --slides or --manifest");
        };
        let raw = fs::read_to_string(manifest)
            .with_context(|| format!("failed to read manifest '{}'", manifest.display()))?;
        Ok(parse_manifest(&raw))
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
