use std::{sync::Arc, time::Duration};

use shared::{
    domain::ConnectionStatus,
    protocol::{Command, CommandMessage, StatusEvent},
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::{
    error::PresenterError,
    input::ManualAction,
    notice::{Notice, NoticeId},
    scheduler::{Scheduler, TimerEvent, TokioScheduler},
    slides::SlideDeck,
    state::{PresentationState, ZoomSettings},
    surface::{Notifier, RenderOp, Renderer},
    transition::{Transition, TransitionPhase, TransitionTicket},
};

/// Must match the fade-out duration of the renderer.
pub const DEFAULT_TRANSITION_SETTLE: Duration = Duration::from_millis(300);
pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub zoom: ZoomSettings,
    pub transition_settle: Duration,
    pub notice_duration: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            zoom: ZoomSettings::default(),
            transition_settle: DEFAULT_TRANSITION_SETTLE,
            notice_duration: DEFAULT_NOTICE_DURATION,
        }
    }
}

/// Everything the engine's event loop reacts to, processed in arrival order.
#[derive(Debug, Clone)]
pub enum EngineInput {
    Command(CommandMessage),
    Manual(ManualAction),
    ChannelStatus(StatusEvent),
    /// Transition straight to a slide without a notice.
    ShowSlide(usize),
    Timer(TimerEvent),
    Shutdown,
}

/// Read-only view of the engine, published once per applied input.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationSnapshot {
    /// Inputs applied so far. Watchers see coalesced updates; this tells them
    /// how many they skipped.
    pub revision: u64,
    pub current_index: usize,
    pub slide_count: usize,
    pub zoom_level: f64,
    pub is_presenting: bool,
    pub phase: TransitionPhase,
    pub connection: ConnectionStatus,
}

/// Cloneable sender side of a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    inputs: mpsc::UnboundedSender<EngineInput>,
    snapshot: watch::Receiver<PresentationSnapshot>,
}

impl EngineHandle {
    pub fn submit(&self, input: EngineInput) {
        if self.inputs.send(input).is_err() {
            debug!("presenter: engine stopped, input dropped");
        }
    }

    pub fn command(&self, message: CommandMessage) {
        self.submit(EngineInput::Command(message));
    }

    pub fn manual(&self, action: ManualAction) {
        self.submit(EngineInput::Manual(action));
    }

    pub fn channel_status(&self, event: StatusEvent) {
        self.submit(EngineInput::ChannelStatus(event));
    }

    pub fn show_slide(&self, index: usize) {
        self.submit(EngineInput::ShowSlide(index));
    }

    pub fn shutdown(&self) {
        self.submit(EngineInput::Shutdown);
    }

    pub fn snapshot(&self) -> PresentationSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<PresentationSnapshot> {
        self.snapshot.clone()
    }
}

/// Owns the slide deck and presentation state. Nothing else writes either.
pub struct PresentationEngine {
    deck: SlideDeck,
    settings: EngineSettings,
    state: PresentationState,
    transition: Transition,
    connection: ConnectionStatus,
    notice_seq: u64,
    revision: u64,
    visible_notice: Option<NoticeId>,
    renderer: Box<dyn Renderer>,
    notifier: Box<dyn Notifier>,
    scheduler: Arc<dyn Scheduler>,
    snapshot: watch::Sender<PresentationSnapshot>,
}

impl PresentationEngine {
    pub fn new(
        deck: SlideDeck,
        settings: EngineSettings,
        renderer: Box<dyn Renderer>,
        notifier: Box<dyn Notifier>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self, PresenterError> {
        settings.zoom.validate()?;
        let state = PresentationState::new(&settings.zoom);
        let (snapshot, _) = watch::channel(PresentationSnapshot {
            revision: 0,
            current_index: state.current_index(),
            slide_count: deck.len(),
            zoom_level: state.zoom_level(),
            is_presenting: state.is_presenting(),
            phase: TransitionPhase::Idle,
            connection: ConnectionStatus::Disconnected,
        });
        Ok(Self {
            deck,
            settings,
            state,
            transition: Transition::default(),
            connection: ConnectionStatus::Disconnected,
            notice_seq: 0,
            revision: 0,
            visible_notice: None,
            renderer,
            notifier,
            scheduler,
            snapshot,
        })
    }

    /// Builds an engine whose timers run on tokio and post back into its own
    /// input queue. Feed the returned receiver to [`PresentationEngine::run`].
    pub fn build(
        deck: SlideDeck,
        settings: EngineSettings,
        renderer: Box<dyn Renderer>,
        notifier: Box<dyn Notifier>,
    ) -> Result<(Self, EngineHandle, mpsc::UnboundedReceiver<EngineInput>), PresenterError> {
        let (inputs, inbox) = mpsc::unbounded_channel();
        let scheduler = Arc::new(TokioScheduler::new(inputs.clone()));
        let engine = Self::new(deck, settings, renderer, notifier, scheduler)?;
        let handle = EngineHandle {
            inputs,
            snapshot: engine.subscribe(),
        };
        Ok((engine, handle, inbox))
    }

    pub fn subscribe(&self) -> watch::Receiver<PresentationSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn state(&self) -> &PresentationState {
        &self.state
    }

    pub fn phase(&self) -> TransitionPhase {
        self.transition.phase()
    }

    pub fn deck(&self) -> &SlideDeck {
        &self.deck
    }

    pub async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<EngineInput>) {
        while let Some(input) = inbox.recv().await {
            if !self.handle_input(input) {
                break;
            }
        }
        info!("presenter: engine stopped");
    }

    /// Applies one input and publishes the resulting snapshot. Returns `false`
    /// once the engine should stop.
    pub fn handle_input(&mut self, input: EngineInput) -> bool {
        match input {
            EngineInput::Command(message) => match message.command() {
                Ok(command) => self.dispatch(command),
                Err(err) => warn!(%err, "presenter: ignoring command"),
            },
            EngineInput::Manual(action) => self.apply_manual(action),
            EngineInput::ChannelStatus(event) => self.on_channel_status(event),
            // Rejection is logged by show_slide.
            EngineInput::ShowSlide(index) => {
                let _ = self.show_slide(index);
            }
            EngineInput::Timer(TimerEvent::SwapDue(ticket)) => self.on_swap_due(ticket),
            EngineInput::Timer(TimerEvent::FadeInSettled(ticket)) => self.on_fade_in_settled(ticket),
            EngineInput::Timer(TimerEvent::NoticeExpired(id)) => self.on_notice_expired(id),
            EngineInput::Shutdown => return false,
        }
        self.publish();
        true
    }

    pub fn dispatch(&mut self, command: Command) {
        debug!(%command, index = self.state.current_index(), "presenter: dispatch");
        match command {
            Command::Next => {
                let current = self.state.current_index();
                if current < self.deck.last_index() {
                    self.navigate(current + 1, Notice::NextSlide);
                } else {
                    self.notify(Notice::LastSlide);
                }
            }
            Command::Prev => {
                let current = self.state.current_index();
                if current > 0 {
                    self.navigate(current - 1, Notice::PreviousSlide);
                } else {
                    self.notify(Notice::FirstSlide);
                }
            }
            Command::ZoomIn => {
                if self.state.zoom_in(&self.settings.zoom) {
                    self.apply_zoom();
                } else {
                    debug!(level = self.state.zoom_level(), "presenter: zoom already at maximum");
                }
            }
            Command::ZoomOut => {
                if self.state.zoom_out(&self.settings.zoom) {
                    self.apply_zoom();
                } else {
                    debug!(level = self.state.zoom_level(), "presenter: zoom already at minimum");
                }
            }
            Command::Start => {
                if self.state.start() {
                    let current = self.state.current_index();
                    self.navigate(current, Notice::Started);
                } else {
                    debug!("presenter: already presenting");
                }
            }
            Command::Pause => {
                if self.state.pause() {
                    self.notify(Notice::Paused);
                } else {
                    debug!("presenter: not presenting");
                }
            }
        }
    }

    pub fn apply_manual(&mut self, action: ManualAction) {
        match action {
            ManualAction::Command(command) => self.dispatch(command),
            ManualAction::First => self.navigate(
                0,
                Notice::JumpedTo {
                    index: 0,
                    total: self.deck.len(),
                },
            ),
            ManualAction::Last => {
                let last = self.deck.last_index();
                self.navigate(
                    last,
                    Notice::JumpedTo {
                        index: last,
                        total: self.deck.len(),
                    },
                );
            }
        }
    }

    /// Starts a transition to `index`. The index becomes authoritative
    /// immediately; the content swap happens once the fade-out has settled.
    /// Called outside [`PresentationEngine::handle_input`], nothing is
    /// published.
    pub fn show_slide(&mut self, index: usize) -> Result<(), PresenterError> {
        let len = self.deck.len();
        if index >= len {
            warn!(index, len, "presenter: slide index out of range");
            return Err(PresenterError::OutOfRange { index, len });
        }

        self.state.set_index(index);
        let ticket = self.transition.begin(index);
        self.renderer.render(RenderOp::FadeOut);
        self.scheduler
            .schedule(self.settings.transition_settle, TimerEvent::SwapDue(ticket));
        Ok(())
    }

    fn navigate(&mut self, index: usize, notice: Notice) {
        match self.show_slide(index) {
            Ok(()) => self.notify(notice),
            Err(err) => warn!(%err, "presenter: navigation rejected"),
        }
    }

    fn apply_zoom(&mut self) {
        let level = self.state.zoom_level();
        self.renderer.render(RenderOp::Scale(level));
        self.notify(Notice::Zoom { level });
    }

    fn on_swap_due(&mut self, ticket: TransitionTicket) {
        if !self
            .transition
            .start_swap(ticket, self.state.current_index())
        {
            debug!(
                target = ticket.target,
                generation = ticket.generation,
                "presenter: discarding superseded slide swap"
            );
            return;
        }

        let total = self.deck.len();
        if let Some(slide) = self.deck.get(ticket.target) {
            self.renderer.render(RenderOp::ShowContent {
                index: ticket.target,
                slide: Arc::clone(slide),
            });
        }
        self.renderer
            .render(RenderOp::Scale(self.state.zoom_level()));
        self.renderer.render(RenderOp::FadeIn);
        self.renderer.render(RenderOp::Indicator {
            index: ticket.target,
            total,
        });
        self.transition.finish_swap(ticket);
        self.scheduler.schedule(
            self.settings.transition_settle,
            TimerEvent::FadeInSettled(ticket),
        );
    }

    fn on_fade_in_settled(&mut self, ticket: TransitionTicket) {
        if !self.transition.settle(ticket) {
            debug!(generation = ticket.generation, "presenter: stale fade-in ignored");
        }
    }

    fn on_channel_status(&mut self, event: StatusEvent) {
        self.connection = event.status;
        if event.status.is_terminal() {
            error!(message = %event.message, "presenter: command source unreachable, restart it to resume gesture control");
        } else {
            info!(status = %event.status, message = %event.message, "presenter: connection status");
        }
        self.notifier.connection_status(&event);
    }

    fn notify(&mut self, notice: Notice) {
        self.notice_seq += 1;
        let id = NoticeId(self.notice_seq);
        info!(%notice, "presenter: notice");
        self.notifier.show_notice(id, &notice);
        self.visible_notice = Some(id);
        self.scheduler
            .schedule(self.settings.notice_duration, TimerEvent::NoticeExpired(id));
    }

    fn on_notice_expired(&mut self, id: NoticeId) {
        if self.visible_notice == Some(id) {
            self.visible_notice = None;
            self.notifier.hide_notice(id);
        }
    }

    fn publish(&mut self) {
        self.revision += 1;
        self.snapshot.send_replace(PresentationSnapshot {
            revision: self.revision,
            current_index: self.state.current_index(),
            slide_count: self.deck.len(),
            zoom_level: self.state.zoom_level(),
            is_presenting: self.state.is_presenting(),
            phase: self.transition.phase(),
            connection: self.connection,
        });
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
