//! Presentation engine: owns the slide deck and presentation state, and turns
//! command tokens and manual input into debounced, animated slide transitions.

pub mod engine;
pub mod error;
pub mod input;
pub mod notice;
pub mod scheduler;
pub mod session;
pub mod slides;
pub mod state;
pub mod surface;
pub mod transition;

pub use engine::{
    EngineHandle, EngineInput, EngineSettings, PresentationEngine, PresentationSnapshot,
};
pub use error::PresenterError;
pub use input::ManualAction;
pub use notice::{Notice, NoticeId};
pub use scheduler::{Scheduler, TimerEvent, TokioScheduler};
pub use session::{launch, PresentationSession};
pub use slides::{parse_manifest, DirectorySlideLoader, Slide, SlideDeck, SlideLoader};
pub use state::{PresentationState, ZoomSettings};
pub use surface::{Notifier, RenderOp, Renderer, VisualState};
pub use transition::{Transition, TransitionPhase, TransitionTicket};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
