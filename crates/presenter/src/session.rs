//! Wires a command channel, a manual input source and the engine together.

use std::sync::Arc;

use client_core::CommandChannel;
use shared::domain::SlideId;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    engine::{EngineHandle, EngineSettings, PresentationEngine},
    error::PresenterError,
    input::ManualAction,
    slides::{SlideDeck, SlideLoader},
    surface::{Notifier, Renderer},
};

/// A running presentation. Dropping it leaves the tasks running; call
/// [`PresentationSession::shutdown`] to stop them.
pub struct PresentationSession {
    handle: EngineHandle,
    channel: Arc<CommandChannel>,
    engine_task: JoinHandle<()>,
    manual_task: JoinHandle<()>,
}

/// Loads the deck, connects the command channel, starts forwarding manual
/// input and then shows the first slide, in that order.
///
/// Nothing is connected when the deck fails to load.
pub async fn launch(
    settings: EngineSettings,
    loader: &dyn SlideLoader,
    slide_ids: &[SlideId],
    channel: Arc<CommandChannel>,
    mut manual: mpsc::Receiver<ManualAction>,
    renderer: Box<dyn Renderer>,
    notifier: Box<dyn Notifier>,
) -> Result<PresentationSession, PresenterError> {
    let deck = SlideDeck::load(loader, slide_ids).await?;
    info!(slides = deck.len(), "presenter: deck loaded");

    let (engine, handle, inbox) = PresentationEngine::build(deck, settings, renderer, notifier)?;

    let commands = handle.clone();
    channel.on_command(move |message| commands.command(message));
    let statuses = handle.clone();
    channel.on_status(move |event| statuses.channel_status(event));
    channel.connect();

    let forward = handle.clone();
    let manual_task = tokio::spawn(async move {
        while let Some(action) = manual.recv().await {
            forward.manual(action);
        }
    });

    // Queued behind `connecting`, so the engine reports the status first.
    handle.show_slide(0);
    let engine_task = tokio::spawn(engine.run(inbox));

    Ok(PresentationSession {
        handle,
        channel,
        engine_task,
        manual_task,
    })
}

impl PresentationSession {
    pub fn handle(&self) -> &EngineHandle {
        &self.handle
    }

    pub fn channel(&self) -> &Arc<CommandChannel> {
        &self.channel
    }

    /// Stops the channel first so no command arrives after the engine is gone.
    pub async fn shutdown(self) {
        self.channel.shutdown().await;
        self.manual_task.abort();
        self.handle.shutdown();
        if let Err(err) = self.engine_task.await {
            warn!(%err, "presenter: engine task ended abnormally");
        }
        info!("presenter: session closed");
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
