use std::time::Duration;

use tokio::sync::mpsc;

use crate::{engine::EngineInput, notice::NoticeId, transition::TransitionTicket};

/// Deferred engine work. Each event carries enough identity to be recognised
/// as stale when it finally fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    SwapDue(TransitionTicket),
    FadeInSettled(TransitionTicket),
    NoticeExpired(NoticeId),
}

pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, event: TimerEvent);
}

/// Delivers timer events back into the engine's input queue after `delay`.
pub struct TokioScheduler {
    inputs: mpsc::UnboundedSender<EngineInput>,
}

impl TokioScheduler {
    pub fn new(inputs: mpsc::UnboundedSender<EngineInput>) -> Self {
        Self { inputs }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, event: TimerEvent) {
        let inputs = self.inputs.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = inputs.send(EngineInput::Timer(event));
        });
    }
}
