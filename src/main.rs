//! # IrisFarm — unattended farm scheduler for the Iris bot
//!
//! Sends the farm command to a Telegram group on a schedule, reads the
//! reply from Iris, and reschedules accordingly. Unrecovered errors restart
//! the whole process; the fresh process farms immediately.
//!
//! Usage:
//!   irisfarm                         # config from ~/.irisfarm/config.toml
//!   irisfarm --config farm.toml      # explicit config path
//!   irisfarm --verbose               # debug logging

mod restart;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use irisfarm_core::FarmConfig;
use irisfarm_farmer::{BotIdentity, FarmSchedule, Listener, engine};
use irisfarm_telegram::TelegramClient;
use irisfarm_telegram::types::{Chat, Update};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Pause before re-exec on a fatal error.
const RESTART_DELAY_SECS: u64 = 5;

#[derive(Parser)]
#[command(
    name = "irisfarm",
    version,
    about = "🌱 IrisFarm — unattended farm scheduler for the Iris bot"
)]
struct Cli {
    /// Path to the config file (default: ~/.irisfarm/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "irisfarm=debug,irisfarm_farmer=debug,irisfarm_telegram=debug"
    } else {
        "irisfarm=info,irisfarm_farmer=info,irisfarm_telegram=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match run(&cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("💥 Critical error: {e:#}");
            restart::restart_process(RESTART_DELAY_SECS);
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => {
            let expanded = shellexpand::tilde(path).to_string();
            FarmConfig::load_from(std::path::Path::new(&expanded))?
        }
        None => FarmConfig::load()?,
    };
    config.validate()?;

    let mut client = TelegramClient::new(config.telegram.clone());

    // Session check — a bad token fails here, before anything is scheduled.
    let me = client.get_me().await?;
    tracing::info!(
        "Connected to Telegram as @{}",
        me.username.as_deref().unwrap_or("unknown")
    );

    // Confirm the queued backlog so polling starts fresh; the backlog still
    // feeds entity resolution and the chat diagnostic below.
    let backlog = client.drain_pending().await?;

    match client.get_chat(config.farm.group_id).await {
        Ok(chat) => tracing::info!("Group found: {}", chat.display_name()),
        Err(e) => {
            tracing::error!("Cannot access group {}: {e}", config.farm.group_id);
            log_visible_chats(&backlog);
            anyhow::bail!(
                "cannot access group {}; check farm.group_id",
                config.farm.group_id
            );
        }
    }

    let identity = resolve_identity(&config, &backlog);

    let schedule = Arc::new(Mutex::new(FarmSchedule::from_config(
        &config.schedule,
        chrono::Utc::now(),
    )));
    tracing::info!(
        "Next farm scheduled for: {}",
        schedule.lock().await.next_farm_time
    );

    let listener = Listener::new(identity, config.farm.group_id, schedule.clone());

    let transport = Arc::new(client.clone());
    let mut farm_loop = tokio::spawn(engine::run(
        transport,
        config.farm.group_id,
        config.farm.command.clone(),
        schedule.clone(),
        config.schedule.tick_secs,
    ));

    tracing::info!("Message handler registered, farming begins");
    let mut messages = client.start_polling();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            maybe = messages.next() => match maybe {
                Some(message) => listener.handle_message(&message).await,
                None => anyhow::bail!("telegram polling stream closed"),
            },
            res = &mut farm_loop => {
                return match res {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e.into()),
                    Err(e) => Err(anyhow::anyhow!("farm loop panicked: {e}")),
                };
            }
            _ = &mut ctrl_c => {
                tracing::info!("🛑 Stopped by user");
                schedule.lock().await.running = false;
                farm_loop.abort();
                return Ok(());
            }
        }
    }
}

/// Resolve the Iris account we listen to. Prefers an explicit id from the
/// config; otherwise scans the startup backlog for the configured username.
fn resolve_identity(config: &FarmConfig, backlog: &[Update]) -> BotIdentity {
    let username = &config.farm.bot_username;
    if let Some(id) = config.farm.bot_id {
        tracing::info!("Iris bot id (from config): {id}");
        return BotIdentity::new(username, Some(id));
    }

    let probe = BotIdentity::new(username, None);
    for update in backlog {
        if let Some(from) = update.message.as_ref().and_then(|m| m.from.as_ref())
            && probe.matches(from)
        {
            tracing::info!("Iris bot id (from updates): {}", from.id);
            return BotIdentity::new(username, Some(from.id));
        }
    }

    tracing::info!("Iris bot id unknown yet, matching replies by @{username}");
    probe
}

/// The group is unreachable — show whatever chats this bot can see so the
/// operator can fix the configured id.
fn log_visible_chats(backlog: &[Update]) {
    let mut seen: Vec<&Chat> = Vec::new();
    for update in backlog {
        if let Some(chat) = update.message.as_ref().map(|m| &m.chat)
            && !seen.iter().any(|c| c.id == chat.id)
        {
            seen.push(chat);
        }
    }

    if seen.is_empty() {
        tracing::info!("No chats visible in pending updates. Send a message to the group and retry.");
        return;
    }

    tracing::info!("Chats visible to this bot:");
    for chat in seen {
        tracing::info!(
            "  ID: {}, type: {}, name: {}",
            chat.id,
            chat.chat_type,
            chat.display_name()
        );
    }
}
