use shared::protocol::Command;

/// Manual control surface, feeding the same dispatcher as the command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualAction {
    Command(Command),
    First,
    Last,
}

impl ManualAction {
    /// Maps a key name (or a raw command token) to an action.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        let action = match key.as_str() {
            "n" | "right" | "arrowright" | "pagedown" => Self::Command(Command::Next),
            "b" | "left" | "arrowleft" | "pageup" => Self::Command(Command::Prev),
            "+" | "=" => Self::Command(Command::ZoomIn),
            "-" | "_" => Self::Command(Command::ZoomOut),
            "s" => Self::Command(Command::Start),
            "p" => Self::Command(Command::Pause),
            "home" => Self::First,
            "end" => Self::Last,
            other => return other.parse().ok().map(Self::Command),
        };
        Some(action)
    }
}

impl From<Command> for ManualAction {
    fn from(command: Command) -> Self {
        Self::Command(command)
    }
}
