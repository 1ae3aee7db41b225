use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one slide, resolved by a slide loader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideId(pub String);

impl SlideId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of the connection to the command source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
    Reconnecting,
    Error,
    /// Reconnection attempts exhausted; the command source must be restarted.
    Failed,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Reconnecting => "reconnecting",
            Self::Error => "error",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slide_id_is_a_bare_string_on_the_wire() {
        let id = SlideId::new("intro");
        assert_eq!(serde_json::to_string(&id).expect("encode"), r#""intro""#);
        assert_eq!(
            serde_json::from_str::<SlideId>(r#""outro""#).expect("decode"),
            SlideId::new("outro")
        );
        assert_eq!(id.to_string(), id.as_str());
    }

    #[test]
    fn status_display_matches_wire_names() {
        let status = ConnectionStatus::Reconnecting;
        assert_eq!(
            serde_json::to_string(&status).expect("encode"),
            format!("\"{status}\"")
        );
        assert!(ConnectionStatus::Failed.is_terminal());
        assert!(!ConnectionStatus::Error.is_terminal());
    }
}
