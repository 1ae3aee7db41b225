use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::CommandChannel;
use presenter::{launch, DirectorySlideLoader};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod keyboard;
mod terminal;

use config::{load_settings, Settings, DEFAULT_CONFIG_FILE};
use keyboard::{read_keys, spawn_stdin_lines, KeyboardExit};
use terminal::{TerminalNotifier, TerminalRenderer};

/// Gesture-driven slide presenter for the terminal.
#[derive(Parser, Debug)]
struct Args {
    /// Settings file, layered under environment and flags.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Command source WebSocket endpoint.
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    slides_dir: Option<PathBuf>,
    /// Comma separated slide ids, in presentation order.
    #[arg(long, value_delimiter = ',')]
    slides: Vec<String>,
    /// File listing one slide id per line.
    #[arg(long, conflicts_with = "slides")]
    manifest: Option<PathBuf>,
    #[arg(long)]
    max_reconnect_attempts: Option<u32>,
    #[arg(long)]
    reconnect_delay_ms: Option<u64>,
}

impl Args {
    fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.endpoint {
            settings.endpoint = v;
        }
        if let Some(v) = self.slides_dir {
            settings.slides_dir = v;
        }
        if !self.slides.is_empty() {
            settings.slides = self.slides;
            settings.manifest = None;
        }
        if let Some(v) = self.manifest {
            settings.manifest = Some(v);
            settings.slides.clear();
        }
        if let Some(v) = self.max_reconnect_attempts {
            settings.max_reconnect_attempts = v;
        }
        if let Some(v) = self.reconnect_delay_ms {
            settings.reconnect_delay_ms = v;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut settings = load_settings(&args.config, |key| std::env::var(key).ok())?;
    args.apply(&mut settings);

    let slide_ids = settings.slide_ids()?;
    let channel = CommandChannel::websocket(settings.channel_settings())
        .context("invalid command source endpoint")?;
    let loader = DirectorySlideLoader::new(&settings.slides_dir);

    let (manual_tx, manual_rx) = mpsc::channel(32);
    let (quit_tx, quit_rx) = oneshot::channel();
    let lines = spawn_stdin_lines();
    tokio::spawn(async move {
        if read_keys(lines, manual_tx).await == KeyboardExit::Quit {
            let _ = quit_tx.send(());
        }
    });

    let session = match launch(
        settings.engine_settings(),
        &loader,
        &slide_ids,
        channel,
        manual_rx,
        Box::new(TerminalRenderer::stdout()),
        Box::new(TerminalNotifier::stdout()),
    )
    .await
    {
        Ok(session) => session,
        Err(err) => {
            error!(%err, slides_dir = %settings.slides_dir.display(), "presentation failed to load");
            return Err(err).context("failed to start presentation");
        }
    };
    info!(
        endpoint = %session.channel().endpoint(),
        "presenting; keys: n/b next/prev, +/- zoom, s/p start/pause, home/end, q quit"
    );

    tokio::select! {
        Ok(()) = quit_rx => info!("quit requested"),
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                error!(%err, "failed to listen for ctrl-c");
            }
        }
    }

    session.shutdown().await;
    Ok(())
}
