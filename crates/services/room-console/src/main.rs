//! RoomLink console entry point
//!
//! Drives a push-to-talk room client from the terminal against the
//! simulated room backend. State changes are printed to stdout, logs go to
//! stderr.
//!
//! # Usage
//!
//! ```bash
//! # Seed the room with participants and connect right away
//! cargo run -p roomlink-console -- \
//!   --url wss://rooms.example.com \
//!   --token dev-token \
//!   --roster ./roster.yaml \
//!   --connect
//!
//! # JSON logs with debug output from the monitor
//! RUST_LOG=roomlink_client=debug cargo run -p roomlink-console -- --log-json
//! ```

mod commands;

use clap::Parser;
use commands::{Command, HELP};
use roomlink_client::backend::sim::{SimBackend, SimParticipantSpec};
use roomlink_client::{ClientConfig, RoomClient, RoomViewState, TrackSource};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// RoomLink console
///
/// Push-to-talk room client driven from the terminal.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Room server URL
    #[arg(long, default_value = "", env = "ROOMLINK_URL")]
    url: String,

    /// Access token for the room
    #[arg(long, default_value = "", env = "ROOMLINK_TOKEN", hide_env_values = true)]
    token: String,

    /// Client configuration file (YAML, or JSON with a .json extension)
    #[arg(long, env = "ROOMLINK_CONFIG")]
    config: Option<PathBuf>,

    /// YAML list of simulated remote participants
    #[arg(long, env = "ROOMLINK_ROSTER")]
    roster: Option<PathBuf>,

    /// Room name reported by the simulated server
    #[arg(long, default_value = "console")]
    room_name: String,

    /// Override the participant monitor interval in milliseconds
    #[arg(long, env = "ROOMLINK_MONITOR_INTERVAL_MS")]
    monitor_interval_ms: Option<u64>,

    /// Connect immediately after startup
    #[arg(long, default_value_t = false)]
    connect: bool,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false, env = "ROOMLINK_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let mut config = match &args.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(interval_ms) = args.monitor_interval_ms {
        config = config.with_monitor_interval_ms(interval_ms);
    }

    let roster: Vec<SimParticipantSpec> = match &args.roster {
        Some(path) => serde_yaml::from_str(&std::fs::read_to_string(path)?)?,
        None => Vec::new(),
    };
    info!(
        participants = roster.len(),
        monitor_interval_ms = config.monitor_interval_ms,
        auto_subscribe = config.auto_subscribe,
        "Configuration loaded"
    );

    let backend = SimBackend::from_roster(&roster).with_room_name(args.room_name.clone());
    let client = RoomClient::new(Arc::new(backend.clone()), config)?;
    client.set_url(args.url.clone()).await;
    client.set_token(args.token.clone()).await;

    let printer = {
        let mut rx = client.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                println!("{}", render(&state));
            }
        })
    };

    if args.connect {
        // Failures are already reflected in the printed state.
        let _ = client.connect().await;
    }

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                None
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }
        run_command(&client, &backend, command).await;
    }

    client.disconnect().await;
    printer.abort();
    info!("Console shut down");
    Ok(())
}

async fn run_command(client: &RoomClient, backend: &SimBackend, command: Command) {
    match command {
        Command::Url(url) => client.set_url(url).await,
        Command::Token(token) => client.set_token(token).await,
        Command::Connect => {
            let _ = client.connect().await;
        }
        Command::Disconnect => client.disconnect().await,
        Command::Talk => client.start_talking().await,
        Command::Release => client.stop_talking().await,
        Command::Toggle {
            participant_id,
            kind,
        } => client.toggle_subscription(&participant_id, kind).await,
        Command::Join { sid, identity } => {
            backend.add_participant(&sid, &identity);
            backend.add_publication(&sid, TrackSource::Microphone, false);
            backend.add_publication(&sid, TrackSource::Camera, false);
        }
        Command::Leave(sid) => {
            if !backend.remove_participant(&sid) {
                warn!(participant = %sid, "No such simulated participant");
            }
        }
        Command::Status => println!("{}", render(&client.state())),
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}

fn render(state: &RoomViewState) -> String {
    let mut out = format!(
        "[{}] {}{}{}",
        state.connection_status,
        state.status_message,
        if state.camera_active { " | camera on" } else { "" },
        if state.is_talking { " | TRANSMITTING" } else { "" },
    );

    for p in &state.remote_participants {
        let flag = |has: bool, subscribed: bool| match (has, subscribed) {
            (false, _) => "-",
            (true, true) => "on",
            (true, false) => "off",
        };
        out.push_str(&format!(
            "\n  {:<24} {:<16} audio:{:<3} video:{}",
            p.id,
            p.display_name,
            flag(p.has_audio, p.audio_subscribed),
            flag(p.has_video, p.video_subscribed),
        ));
    }

    out
}

fn init_tracing(json: bool) {
    // Initialize tracing with EnvFilter for RUST_LOG support
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
