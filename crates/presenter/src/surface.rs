//! Collaborator seams for whatever actually draws the presentation.

use std::sync::Arc;

use shared::{domain::SlideId, protocol::StatusEvent};

use crate::{
    notice::{Notice, NoticeId},
    slides::Slide,
};

/// One visual change requested by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOp {
    /// Opacity to zero.
    FadeOut,
    /// Replace the rendered content. Only issued while faded out.
    ShowContent { index: usize, slide: Arc<Slide> },
    /// Scale transform applied to the content.
    Scale(f64),
    /// Opacity back to one.
    FadeIn,
    Indicator { index: usize, total: usize },
}

pub trait Renderer: Send {
    fn render(&mut self, op: RenderOp);
}

pub trait Notifier: Send {
    fn show_notice(&mut self, id: NoticeId, notice: &Notice);
    fn hide_notice(&mut self, id: NoticeId);
    fn connection_status(&mut self, event: &StatusEvent);
}

/// What the display must currently show, folded from [`RenderOp`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualState {
    pub opacity: f32,
    pub scale: f64,
    pub content: Option<SlideId>,
    pub indicator: Option<(usize, usize)>,
    /// Content swaps that happened while the content was visible.
    pub torn_swaps: usize,
}

impl Default for VisualState {
    fn default() -> Self {
        Self {
            opacity: 0.0,
            scale: 1.0,
            content: None,
            indicator: None,
            torn_swaps: 0,
        }
    }
}

impl VisualState {
    pub fn apply(&mut self, op: &RenderOp) {
        match op {
            RenderOp::FadeOut => self.opacity = 0.0,
            RenderOp::ShowContent { slide, .. } => {
                if self.opacity > 0.0 {
                    self.torn_swaps += 1;
                }
                self.content = Some(slide.id.clone());
            }
            RenderOp::Scale(level) => self.scale = *level,
            RenderOp::FadeIn => self.opacity = 1.0,
            RenderOp::Indicator { index, total } => self.indicator = Some((*index, *total)),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}
