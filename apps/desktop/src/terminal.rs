//! Line-oriented display surface: every visual change and notice is printed.

use std::io::Write;

use presenter::{Notice, NoticeId, Notifier, RenderOp, Renderer, VisualState};
use shared::{domain::ConnectionStatus, protocol::StatusEvent};
use tracing::{debug, warn};

const PREVIEW_CHARS: usize = 72;

pub const RESTART_HINT: &str =
    "gesture control lost: restart the command source and relaunch to resume (keyboard control still works)";

pub struct TerminalRenderer {
    out: Box<dyn Write + Send>,
    visual: VisualState,
}

impl TerminalRenderer {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            visual: VisualState::default(),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    fn line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            warn!(%err, "display: failed to write to terminal");
        }
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, op: RenderOp) {
        self.visual.apply(&op);
        let text = match &op {
            RenderOp::FadeOut => "~ fade out".to_string(),
            RenderOp::ShowContent { index, slide } => {
                format!("[slide {}: {}] {}", index + 1, slide.id, preview(&slide.payload))
            }
            RenderOp::Scale(level) => format!("~ zoom {:.0}%", level * 100.0),
            RenderOp::FadeIn => "~ fade in".to_string(),
            RenderOp::Indicator { index, total } => format!("-- {} / {total} --", index + 1),
        };
        self.line(&text);
        if self.visual.torn_swaps > 0 {
            debug!(torn = self.visual.torn_swaps, "display: content swapped while visible");
        }
    }
}

/// First non-empty line of `payload` with markup tags stripped.
fn preview(payload: &str) -> String {
    let mut text = String::new();
    let mut in_tag = false;
    for ch in payload.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    let line = text
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS {
        let cut: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        line
    }
}

pub struct TerminalNotifier {
    out: Box<dyn Write + Send>,
}

impl TerminalNotifier {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    fn line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            warn!(%err, "display: failed to write to terminal");
        }
    }
}

impl Notifier for TerminalNotifier {
    fn show_notice(&mut self, _id: NoticeId, notice: &Notice) {
        self.line(&format!(">> {notice}"));
    }

    fn hide_notice(&mut self, id: NoticeId) {
        debug!(id = id.0, "display: notice expired");
    }

    fn connection_status(&mut self, event: &StatusEvent) {
        self.line(&format!("[{}] {}", event.status, event.message));
        if event.status == ConnectionStatus::Failed {
            self.line(RESTART_HINT);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use presenter::Slide;
    use shared::domain::SlideId;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().expect("buffer").clone())
                .expect("utf8")
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn renderer_prints_each_visual_change() {
        let buffer = SharedBuffer::default();
        let mut renderer = TerminalRenderer::new(Box::new(buffer.clone()));
        let slide = Arc::new(Slide {
            id: SlideId::new("intro"),
            payload: "<section>\n  <h1>Hand   gestures</h1>\n</section>".into(),
        });

        renderer.render(RenderOp::FadeOut);
        renderer.render(RenderOp::ShowContent { index: 0, slide });
        renderer.render(RenderOp::Scale(1.2));
        renderer.render(RenderOp::FadeIn);
        renderer.render(RenderOp::Indicator { index: 0, total: 4 });

        assert_eq!(
            buffer.lines(),
            vec![
                "~ fade out",
                "[slide 1: intro] Hand gestures",
                "~ zoom 120%",
                "~ fade in",
                "-- 1 / 4 --",
            ]
        );
        assert!(renderer.visual.is_visible());
        assert_eq!(renderer.visual.torn_swaps, 0);
    }

    #[test]
    fn long_previews_are_truncated() {
        let long = "word ".repeat(40);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 3);
        assert_eq!(preview("<div></div>"), "");
    }

    #[test]
    fn failed_status_prints_the_restart_hint() {
        let buffer = SharedBuffer::default();
        let mut notifier = TerminalNotifier::new(Box::new(buffer.clone()));

        notifier.show_notice(NoticeId(1), &Notice::NextSlide);
        notifier.connection_status(&StatusEvent::reconnecting(1, 5));
        notifier.connection_status(&StatusEvent::failed(5));

        let lines = buffer.lines();
        assert_eq!(lines[0], ">> Next Slide");
        assert_eq!(lines[1], "[reconnecting] Reconnecting (1/5)");
        assert!(lines[2].starts_with("[failed]"));
        assert_eq!(lines[3], RESTART_HINT);
        assert_eq!(lines.len(), 4);
    }
}
