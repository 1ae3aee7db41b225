use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{domain::ConnectionStatus, error::ProtocolError};

/// The closed vocabulary a command source may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    Pause,
    Next,
    Prev,
    ZoomIn,
    ZoomOut,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Start,
        Command::Pause,
        Command::Next,
        Command::Prev,
        Command::ZoomIn,
        Command::ZoomOut,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Next => "next",
            Self::Prev => "prev",
            Self::ZoomIn => "zoom_in",
            Self::ZoomOut => "zoom_out",
        }
    }

    /// Gesture the detector maps onto this command.
    pub fn gesture(self) -> &'static str {
        match self {
            Self::Start => "Start Presentation (Thumbs Up)",
            Self::Pause => "Pause/Hold (Open Palm)",
            Self::Next => "Next Slide (Two Fingers Pointing Right)",
            Self::Prev => "Previous Slide (One Finger Pointing Left)",
            Self::ZoomIn => "Zoom In (Two Hands Frame Gesture)",
            Self::ZoomOut => "Zoom Out (Two Hands 3 Fingers Moving Together)",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|command| command.token() == token)
            .ok_or_else(|| ProtocolError::UnknownCommand(token.to_string()))
    }
}

/// One inbound message from the command source: `{"command": "<token>"}`.
///
/// The token is kept as text so that unknown tokens survive the transport and
/// are rejected at dispatch instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMessage {
    pub command: String,
}

impl CommandMessage {
    pub fn new(command: Command) -> Self {
        Self {
            command: command.token().to_string(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn command(&self) -> Result<Command, ProtocolError> {
        self.command.parse()
    }
}

/// Connection lifecycle notification emitted by the command channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub status: ConnectionStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
}

impl StatusEvent {
    pub fn new(status: ConnectionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            attempt: None,
        }
    }

    pub fn connecting(endpoint: &str) -> Self {
        Self::new(
            ConnectionStatus::Connecting,
            format!("Connecting to {endpoint}"),
        )
    }

    pub fn connected() -> Self {
        Self::new(ConnectionStatus::Connected, "Connected to gesture server")
    }

    pub fn disconnected() -> Self {
        Self::new(ConnectionStatus::Disconnected, "Disconnected from gesture server")
    }

    pub fn reconnecting(attempt: u32, max_attempts: u32) -> Self {
        Self {
            status: ConnectionStatus::Reconnecting,
            message: format!("Reconnecting ({attempt}/{max_attempts})"),
            attempt: Some(attempt),
        }
    }

    pub fn error(detail: impl fmt::Display) -> Self {
        Self::new(ConnectionStatus::Error, format!("Connection error: {detail}"))
    }

    pub fn failed(max_attempts: u32) -> Self {
        Self::new(
            ConnectionStatus::Failed,
            format!(
                "Failed to connect after {max_attempts} attempts; restart the gesture server"
            ),
        )
    }
}
