use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "relay.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub broadcast_capacity: usize,
    pub read_stdin: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8765".into(),
            broadcast_capacity: 256,
            read_stdin: true,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(DEFAULT_CONFIG_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file at `path` when present, then environment
/// overrides looked up through `env`.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, &file_cfg),
            Err(err) => tracing::warn!(path = %path.display(), %err, "ignoring unreadable relay config"),
        }
    }

    if let Some(v) = env("RELAY_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }
    if let Some(v) = env("APP__BROADCAST_CAPACITY").and_then(|v| v.parse().ok()) {
        settings.broadcast_capacity = v;
    }
    if let Some(v) = env("APP__READ_STDIN").and_then(|v| parse_flag(&v)) {
        settings.read_stdin = v;
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    if let Some(v) = file_cfg.get("bind_addr").and_then(toml::Value::as_str) {
        settings.bind_addr = v.to_string();
    }
    if let Some(v) = file_cfg
        .get("broadcast_capacity")
        .and_then(toml::Value::as_integer)
        .and_then(|v| usize::try_from(v).ok())
    {
        settings.broadcast_capacity = v;
    }
    if let Some(v) = file_cfg.get("read_stdin").and_then(toml::Value::as_bool) {
        settings.read_stdin = v;
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
