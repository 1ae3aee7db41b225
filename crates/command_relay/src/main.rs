use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shared::{
    error::ApiError,
    protocol::{Command, CommandMessage},
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::broadcast,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

struct AppState {
    commands: broadcast::Sender<CommandMessage>,
    clients: AtomicUsize,
}

impl AppState {
    fn new(capacity: usize) -> Self {
        let (commands, _) = broadcast::channel(capacity.max(1));
        Self {
            commands,
            clients: AtomicUsize::new(0),
        }
    }

    /// Sends `command` to every connected display. Returns how many received it.
    fn publish(&self, command: Command) -> usize {
        let delivered = self
            .commands
            .send(CommandMessage::new(command))
            .unwrap_or(0);
        info!(%command, delivered, "relay: command broadcast");
        delivered
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CommandAccepted {
    command: String,
    delivered: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct VocabularyEntry {
    command: String,
    gesture: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let state = Arc::new(AppState::new(settings.broadcast_capacity));

    if settings.read_stdin {
        let stdin_state = Arc::clone(&state);
        tokio::spawn(async move {
            let reader = BufReader::new(tokio::io::stdin());
            if let Err(err) = relay_lines(reader, &stdin_state).await {
                warn!(%err, "relay: stdin reader stopped");
            }
        });
    }

    let app = build_router(state);
    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "relay listening, type a command token per line to broadcast it");
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .route("/commands", get(list_commands).post(post_command))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_commands() -> Json<Vec<VocabularyEntry>> {
    Json(
        Command::ALL
            .into_iter()
            .map(|command| VocabularyEntry {
                command: command.token().to_string(),
                gesture: command.gesture().to_string(),
            })
            .collect(),
    )
}

async fn post_command(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<CommandAccepted>, (StatusCode, Json<ApiError>)> {
    let command = CommandMessage::parse(&body)
        .and_then(|message| message.command())
        .map_err(|err| {
            warn!(%err, "relay: rejected command");
            (StatusCode::BAD_REQUEST, Json(ApiError::from(err)))
        })?;
    let delivered = state.publish(command);
    Ok(Json(CommandAccepted {
        command: command.token().to_string(),
        delivered,
    }))
}

/// Broadcasts each recognised token read from `reader`, one per line.
async fn relay_lines<R>(reader: R, state: &AppState) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut relayed = 0;
    while let Some(line) = lines.next_line().await? {
        let token = line.trim();
        if token.is_empty() {
            continue;
        }
        match token.parse::<Command>() {
            Ok(command) => {
                state.publish(command);
                relayed += 1;
            }
            Err(err) => warn!(%err, "relay: ignoring stdin line"),
        }
    }
    Ok(relayed)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: WebSocket) {
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let mut commands_rx = state.commands.subscribe();
    let total = state.clients.fetch_add(1, Ordering::SeqCst) + 1;
    info!(total, "relay: display connected");

    let send_task = tokio::spawn(async move {
        loop {
            let message = match commands_rx.recv().await {
                Ok(message) => message,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "relay: display fell behind, commands dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let text = match serde_json::to_string(&message) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => info!(%text, "relay: message from display"),
            Message::Close(_) => break,
            other => debug!(?other, "relay: ignoring frame from display"),
        }
    }

    send_task.abort();
    let total = state.clients.fetch_sub(1, Ordering::SeqCst) - 1;
    info!(total, "relay: display disconnected");
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
