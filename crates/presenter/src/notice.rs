use std::fmt;

/// Identifies one shown notice so that its expiry can be matched against the
/// notice currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoticeId(pub u64);

/// Transient, self-expiring summary of a state-changing action.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    NextSlide,
    PreviousSlide,
    /// `prev` was requested on the first slide.
    FirstSlide,
    /// `next` was requested on the last slide.
    LastSlide,
    JumpedTo { index: usize, total: usize },
    Zoom { level: f64 },
    Started,
    Paused,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NextSlide => f.write_str("Next Slide"),
            Self::PreviousSlide => f.write_str("Previous Slide"),
            Self::FirstSlide => f.write_str("First Slide"),
            Self::LastSlide => f.write_str("Last Slide"),
            Self::JumpedTo { index, total } => write!(f, "Slide {} / {total}", index + 1),
            Self::Zoom { level } => write!(f, "Zoom {:.0}%", level * 100.0),
            Self::Started => f.write_str("Presentation Started"),
            Self::Paused => f.write_str("Presentation Paused"),
        }
    }
}
