//! Recording collaborators shared by the engine and session tests.

use std::{
    collections::HashMap,
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use shared::{domain::SlideId, protocol::StatusEvent};

use crate::{
    notice::{Notice, NoticeId},
    scheduler::{Scheduler, TimerEvent},
    slides::{Slide, SlideDeck, SlideLoader},
    surface::{Notifier, RenderOp, Renderer, VisualState},
};

#[derive(Clone, Default)]
pub struct RecordingRenderer {
    ops: Arc<Mutex<Vec<RenderOp>>>,
    visual: Arc<Mutex<VisualState>>,
}

impl RecordingRenderer {
    pub fn ops(&self) -> Vec<RenderOp> {
        self.ops.lock().expect("ops").clone()
    }

    pub fn shown_indices(&self) -> Vec<usize> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                RenderOp::ShowContent { index, .. } => Some(index),
                _ => None,
            })
            .collect()
    }

    pub fn visual(&self) -> VisualState {
        self.visual.lock().expect("visual").clone()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, op: RenderOp) {
        self.visual.lock().expect("visual").apply(&op);
        self.ops.lock().expect("ops").push(op);
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    shown: Arc<Mutex<Vec<(NoticeId, String)>>>,
    hidden: Arc<Mutex<Vec<NoticeId>>>,
    statuses: Arc<Mutex<Vec<StatusEvent>>>,
}

impl RecordingNotifier {
    pub fn texts(&self) -> Vec<String> {
        self.shown
            .lock()
            .expect("shown")
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn ids(&self) -> Vec<NoticeId> {
        self.shown
            .lock()
            .expect("shown")
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn hidden(&self) -> Vec<NoticeId> {
        self.hidden.lock().expect("hidden").clone()
    }

    pub fn statuses(&self) -> Vec<StatusEvent> {
        self.statuses.lock().expect("statuses").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show_notice(&mut self, id: NoticeId, notice: &Notice) {
        self.shown
            .lock()
            .expect("shown")
            .push((id, notice.to_string()));
    }

    fn hide_notice(&mut self, id: NoticeId) {
        self.hidden.lock().expect("hidden").push(id);
    }

    fn connection_status(&mut self, event: &StatusEvent) {
        self.statuses.lock().expect("statuses").push(event.clone());
    }
}

/// Holds timer events until the test fires them.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    pending: Arc<Mutex<Vec<(Duration, TimerEvent)>>>,
}

impl ManualScheduler {
    pub fn take(&self) -> Vec<(Duration, TimerEvent)> {
        std::mem::take(&mut *self.pending.lock().expect("pending"))
    }

    pub fn restore(&self, events: Vec<(Duration, TimerEvent)>) {
        let mut pending = self.pending.lock().expect("pending");
        let scheduled_since = std::mem::replace(&mut *pending, events);
        pending.extend(scheduled_since);
    }

    pub fn pending(&self) -> Vec<(Duration, TimerEvent)> {
        self.pending.lock().expect("pending").clone()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, event: TimerEvent) {
        self.pending.lock().expect("pending").push((delay, event));
    }
}

pub struct StaticSlideLoader {
    slides: HashMap<String, String>,
}

impl StaticSlideLoader {
    pub fn new(ids: &[&str]) -> Self {
        Self {
            slides: ids
                .iter()
                .map(|id| (id.to_string(), format!("<section>{id}</section>")))
                .collect(),
        }
    }
}

#[async_trait]
impl SlideLoader for StaticSlideLoader {
    async fn fetch(&self, id: &SlideId) -> io::Result<String> {
        self.slides
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, id.to_string()))
    }
}

pub fn deck(ids: &[&str]) -> SlideDeck {
    SlideDeck::new(
        ids.iter()
            .map(|id| Slide {
                id: SlideId::new(*id),
                payload: format!("<section>{id}</section>"),
            })
            .collect(),
    )
    .expect("deck")
}
