use std::io::BufRead;

use presenter::ManualAction;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardExit {
    /// The operator asked to quit.
    Quit,
    /// Input closed or the engine stopped listening.
    Closed,
}

/// Reads stdin on a plain thread so a pending read never holds up shutdown.
pub fn spawn_stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(%err, "keyboard: input stopped");
                    break;
                }
            }
        }
    });
    rx
}

/// Maps one key name per line to a manual action and forwards it.
pub async fn read_keys(
    mut lines: mpsc::UnboundedReceiver<String>,
    actions: mpsc::Sender<ManualAction>,
) -> KeyboardExit {
    while let Some(line) = lines.recv().await {
        let key = line.trim();
        if key.is_empty() {
            continue;
        }
        if key.eq_ignore_ascii_case("q") {
            return KeyboardExit::Quit;
        }
        match ManualAction::from_key(key) {
            Some(action) => {
                if actions.send(action).await.is_err() {
                    return KeyboardExit::Closed;
                }
            }
            None => debug!(key, "keyboard: unmapped key"),
        }
    }
    KeyboardExit::Closed
}

#[cfg(test)]
mod tests {
    use shared::protocol::Command;

    use super::*;

    fn typed(keys: &[&str]) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        for key in keys {
            tx.send(key.to_string()).expect("line");
        }
        rx
    }

    #[tokio::test]
    async fn forwards_mapped_keys_until_quit() {
        let (tx, mut rx) = mpsc::channel(8);
        let exit = read_keys(typed(&["n", "x", "", "+", "end", "q", "b"]), tx).await;

        assert_eq!(exit, KeyboardExit::Quit);
        let mut seen = Vec::new();
        while let Ok(action) = rx.try_recv() {
            seen.push(action);
        }
        assert_eq!(
            seen,
            vec![
                ManualAction::Command(Command::Next),
                ManualAction::Command(Command::ZoomIn),
                ManualAction::Last,
            ]
        );
    }

    #[tokio::test]
    async fn end_of_input_reports_closed() {
        let (tx, _rx) = mpsc::channel(8);
        assert_eq!(read_keys(typed(&["p"]), tx).await, KeyboardExit::Closed);
    }
}
