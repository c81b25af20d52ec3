//! glasspane CLI: headless client for a remote-display host.

mod recorder;
mod replay;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glasspane_client::setup::{default_config_path, load_config, save_config};
use glasspane_client::{Client, ClientEvent, Config, ConnectionState, LogObserver, PlatformCapabilities};
use glasspane_input::{RecordedEvent, StaticSurface};
use glasspane_stream::NullPlayback;
use glasspane_types::ClientRect;
use tracing_subscriber::EnvFilter;

use crate::recorder::RecordingDecoderFactory;

#[derive(Parser)]
#[command(
    name = "glasspane",
    about = "Stream a remote display and send input back to it",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to a host and stream until interrupted.
    Connect {
        /// Host name or address, overrides the configuration.
        #[arg(long)]
        host: Option<String>,

        /// Port, overrides the configuration.
        #[arg(long)]
        port: Option<u16>,

        /// Access code sent right after connecting.
        #[arg(long)]
        access_code: Option<String>,

        /// Index of the capturable to stream.
        #[arg(long)]
        capturable: Option<usize>,

        /// Write each received stream to this directory.
        #[arg(long)]
        record: Option<PathBuf>,

        /// Recorded input (JSON lines) to send once the host accepts the
        /// configuration.
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Print the wire messages a recorded input session produces.
    Replay {
        /// JSON lines of recorded events.
        file: PathBuf,

        /// Width of the input surface in pixels.
        #[arg(long, default_value_t = 1920.0)]
        width: f64,

        /// Height of the input surface in pixels.
        #[arg(long, default_value_t = 1080.0)]
        height: f64,
    },

    /// Print the default configuration.
    DefaultConfig {
        /// Also write it to the configuration path.
        #[arg(long)]
        write: bool,
    },
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Connect {
            host,
            port,
            access_code,
            capturable,
            record,
            input,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            init_tracing(&config.client.log_level);
            if let Some(host) = host {
                config.connection.host = host;
            }
            if let Some(port) = port {
                config.connection.port = port;
            }
            if access_code.is_some() {
                config.connection.access_code = access_code;
            }
            if let Some(index) = capturable {
                config.capture.capturable_id = index;
            }
            let events = input.map(|path| read_events(&path)).transpose()?;

            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(run_client(config, record, events.unwrap_or_default()))?;
        }
        Commands::Replay {
            file,
            width,
            height,
        } => {
            let config = load_config(cli.config.as_deref())?;
            init_tracing(&config.client.log_level);
            let events = read_events(&file)?;
            let rect = ClientRect::new(0.0, 0.0, width, height);
            let frames = replay::replay(&config, rect, &events)?;
            for frame in &frames {
                println!("{frame}");
            }
            tracing::info!(events = events.len(), sent = frames.len(), "replay finished");
        }
        Commands::DefaultConfig { write } => {
            let config = Config::default();
            print!("{}", toml::to_string_pretty(&config)?);
            if write {
                let path = save_config(&config, cli.config.as_deref())?;
                eprintln!("Written to {}", path.display());
            } else if cli.config.is_none() {
                eprintln!("Default location: {}", default_config_path().display());
            }
        }
    }

    Ok(())
}

fn read_events(path: &std::path::Path) -> anyhow::Result<Vec<RecordedEvent>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            RecordedEvent::from_json_line(line).with_context(|| format!("line {}", n + 1))
        })
        .collect()
}

async fn run_client(
    config: Config,
    record: Option<PathBuf>,
    input: Vec<RecordedEvent>,
) -> anyhow::Result<()> {
    let (width, height) = (
        config.capture.viewport_width,
        config.capture.viewport_height,
    );
    let mut client = Client::new(
        config,
        Box::new(LogObserver),
        Box::new(StaticSurface::new(ClientRect::new(0.0, 0.0, width, height))),
        Box::new(RecordingDecoderFactory::new(record)),
        Box::new(NullPlayback),
    );
    let events = client.event_sender();
    let mut status = client.status();

    let shutdown = events.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown.send(ClientEvent::Shutdown).await;
        }
    });

    if !input.is_empty() {
        let feed = events.clone();
        tokio::spawn(async move {
            if status
                .wait_for(|s| s.state == ConnectionState::Ready)
                .await
                .is_err()
            {
                return;
            }
            for event in input {
                let event = match event {
                    RecordedEvent::Pointer { event_type, event } => {
                        ClientEvent::Pointer { event_type, event }
                    }
                    RecordedEvent::Wheel { event } => ClientEvent::Wheel(event),
                    RecordedEvent::KeyDown { event } => ClientEvent::KeyDown(event),
                    RecordedEvent::KeyUp { event } => ClientEvent::KeyUp(event),
                };
                if feed.send(event).await.is_err() {
                    break;
                }
            }
        });
    }

    client.run(PlatformCapabilities::default()).await?;
    Ok(())
}
