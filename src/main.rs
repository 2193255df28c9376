//! InboX CLI - Lightweight room chat client
//!
//! A terminal client for room-based chat: join a 6-digit room under a
//! display name, read and send messages, and stay in sync through the
//! backend's change feed.

mod channel;
mod config;
mod models;
mod session;
mod store;
mod tui;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::channel::RoomChannel;
use crate::config::Config;
use crate::models::{Message, RoomCode};
use crate::session::Participant;
use crate::store::{HttpStore, MemoryStore, MessageStore};

#[derive(Parser)]
#[command(name = "inbox-cli")]
#[command(about = "Lightweight CLI client for InboX room chat", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend server base URL (overrides the config file)
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the terminal user interface
    Tui {
        /// Keep messages in process memory instead of the hosted backend
        #[arg(long)]
        local: bool,
    },

    /// Send one message to a room (best-effort write, no read-back)
    Send {
        /// 6-digit room code
        #[arg(short, long)]
        room: RoomCode,

        /// Display name (falls back to the config file)
        #[arg(short, long)]
        name: Option<String>,

        /// Message content
        message: String,
    },

    /// Print a room's messages, oldest first
    Read {
        /// 6-digit room code
        #[arg(short, long)]
        room: RoomCode,
    },

    /// Follow a room: reprint the list on every change (Ctrl-C to stop)
    Watch {
        /// 6-digit room code
        #[arg(short, long)]
        room: RoomCode,
    },

    /// Show or update the saved configuration
    Config {
        /// Set the backend server base URL
        #[arg(long)]
        server_url: Option<String>,

        /// Set the default display name
        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let server_url = config.resolve_server_url(cli.server.as_deref());

    // Initialize logging. In TUI mode log lines go to a capture buffer so
    // they cannot corrupt the alternate screen.
    let filter = if cli.verbose { "debug" } else { "info" };
    let log_buffer = tui::LogBuffer::new();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.into());
    if matches!(cli.command, Commands::Tui { .. }) {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(log_buffer.clone()),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }

    match cli.command {
        Commands::Tui { local } => {
            let (store, label): (Arc<dyn MessageStore>, String) = if local {
                (Arc::new(MemoryStore::new()), "local".to_string())
            } else {
                (Arc::new(HttpStore::new(&server_url)), server_url.clone())
            };
            tui::run(store, config.display_name.clone(), label, log_buffer).await?;
        }
        Commands::Send {
            room,
            name,
            message,
        } => {
            let name = name
                .or_else(|| config.display_name.clone())
                .context("No display name. Pass --name or set display_name in the config file.")?;
            send_once(&server_url, &room, &name, &message).await;
        }
        Commands::Read { room } => {
            let store = HttpStore::new(&server_url);
            let messages = store
                .messages_in_room(&room)
                .await
                .with_context(|| format!("Failed to read room {}", room))?;
            print_messages(&messages);
        }
        Commands::Watch { room } => {
            watch_room(&server_url, room).await?;
        }
        Commands::Config { server_url, name } => {
            let mut config = config;
            let updating = server_url.is_some() || name.is_some();
            if let Some(url) = server_url {
                config.server_url = Some(url);
            }
            if let Some(name) = name {
                config.display_name = Some(name);
            }
            if updating {
                config.save()?;
                println!("Config saved.");
            } else {
                println!(
                    "server_url: {}",
                    config.server_url.as_deref().unwrap_or("(default)")
                );
                println!(
                    "display_name: {}",
                    config.display_name.as_deref().unwrap_or("(unset)")
                );
            }
        }
    }

    Ok(())
}

/// One-shot best-effort insert: the write-only flow. Failures are logged
/// and swallowed; whitespace-only input inserts nothing.
async fn send_once(server_url: &str, room: &RoomCode, name: &str, message: &str) {
    let text = message.trim();
    if text.is_empty() {
        tracing::info!("Nothing to send");
        return;
    }

    let store = HttpStore::new(server_url);
    let record = Message::new(text, room, name);
    match store.insert(&record).await {
        Ok(()) => println!("Message sent."),
        Err(e) => tracing::warn!("Send to room {} failed: {:#}", room, e),
    }
}

/// Headless realtime flow: join, print, re-print on every change.
async fn watch_room(server_url: &str, room: RoomCode) -> Result<()> {
    let store: Arc<dyn MessageStore> = Arc::new(HttpStore::new(server_url));
    let participant = Participant {
        name: "observer".to_string(),
        room,
    };
    let mut channel = RoomChannel::join(store, participant).await;

    print_messages(channel.messages());
    println!("Watching room {}... (Ctrl-C to stop)", channel.participant().room);

    while channel.is_joined() {
        tokio::select! {
            event = channel.next_change() => match event {
                Some(_) => {
                    channel.refresh().await;
                    print_messages(channel.messages());
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!("Shutting down...");
                channel.leave();
            }
        }
    }

    Ok(())
}

fn print_messages(messages: &[Message]) {
    if messages.is_empty() {
        println!("(no messages)");
        return;
    }

    for msg in messages {
        println!("[{}] {}: {}", msg.timestamp, msg.author, msg.text);
    }
}
