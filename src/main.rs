//! # Main Entry Point
//!
//! Initializes the roster bot:
//! - Domain: Configuration, Context and Types
//! - Infrastructure: Matrix, State Store
//! - Application: Roster Engine, Router, Formatter
//! - Interface: Session Handler
//!

mod application;
mod domain;
mod infrastructure;
mod interface;
mod strings;

use anyhow::{Context, Result};
use clap::Parser;
use matrix_sdk::{
    config::SyncSettings,
    room::Room,
    ruma::events::room::{
        member::{MembershipState, StrippedRoomMemberEvent},
        message::{MessageType, SyncRoomMessageEvent},
    },
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::application::roster::RosterEngine;
use crate::application::router::CommandRouter;
use crate::domain::config::{AppConfig, StorageBackend};
use crate::domain::context::BotContext;
use crate::domain::traits::{StateStore, SystemClock};
use crate::infrastructure::matrix::MatrixService;
use crate::infrastructure::store::{JsonFileStore, MemoryStore};
use crate::interface::session::{InboundEvent, MentionedUser, SessionHandler};
use crate::strings::logs;

#[derive(Parser, Debug)]
#[command(name = "rosterbot", version, about = "Matrix roster and warp cooldown bot")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "data/config.yaml")]
    config: PathBuf,

    /// Directory for session.log
    #[arg(long, default_value = "data")]
    log_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load Configuration
    let config = AppConfig::load(&args.config)?;

    // 2. Logging Setup
    fs::create_dir_all(&args.log_dir).context("Failed to create log directory")?;

    // Clear previous session log
    let log_path = args.log_dir.join("session.log");
    if log_path.exists() {
        let _ = fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(&args.log_dir, "session.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "info,matrix_sdk=warn,matrix_sdk_base=warn,matrix_sdk_crypto=error,ruma=warn,hyper=warn",
        )
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::info!("{}", logs::config_loaded(&args.config.display().to_string()));

    // 3. State Store & Roster Engine
    let store: Arc<dyn StateStore> = match config.storage.backend {
        StorageBackend::File => Arc::new(JsonFileStore::new(&config.storage.path)),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; the roster will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };
    let engine = RosterEngine::new(store, Arc::new(SystemClock));

    // 4. Matrix Session
    let client = infrastructure::matrix::connect(&config.services.matrix).await?;
    let bot_id = client
        .user_id()
        .map(|id| id.to_string())
        .context("Restored session has no user id")?;
    tracing::info!("{}", logs::session_restored(&bot_id));

    if let Some(name) = &config.services.matrix.display_name {
        tracing::info!("{}", logs::setting_display_name(name));
        if let Err(e) = client.account().set_display_name(Some(name.as_str())).await {
            tracing::warn!("{}", logs::set_display_name_fail(&e.to_string()));
        }
    }

    let ctx = BotContext::new(bot_id, config.services.matrix.display_name.as_deref());
    let router = Arc::new(CommandRouter::new(
        ctx,
        engine,
        config.roster.group_name.clone(),
        config.commands.skip_unknown_prefix,
    ));
    let session = Arc::new(SessionHandler::new(
        router,
        Duration::from_secs(config.roster.cleanup_seconds),
    ));

    // 5. Event Handlers
    let start_time = std::time::SystemTime::now();

    client.add_event_handler(move |ev: SyncRoomMessageEvent, room: Room| {
        let session = session.clone();
        async move {
            let Some(original_msg) = ev.as_original() else {
                return;
            };

            // Ignore events older than start_time
            let ts = ev.origin_server_ts();
            let event_time =
                std::time::UNIX_EPOCH + std::time::Duration::from_millis(ts.get().into());
            if event_time < start_time {
                return;
            }

            let MessageType::Text(text_content) = &original_msg.content.msgtype else {
                return;
            };

            let mut mentions = Vec::new();
            if let Some(m) = original_msg.content.mentions.as_ref() {
                for user_id in &m.user_ids {
                    let display_name = match room.get_member_no_sync(user_id).await {
                        Ok(Some(member)) => member.display_name().map(str::to_string),
                        _ => None,
                    };
                    mentions.push(MentionedUser {
                        user_id: user_id.to_string(),
                        display_name,
                    });
                }
            }

            let event = InboundEvent {
                event_id: original_msg.event_id.to_string(),
                sender: original_msg.sender.to_string(),
                body: text_content.body.clone(),
                mentions,
            };

            let chat = MatrixService::new(room);
            // Cleanup tasks run detached.
            session.handle(&chat, event).await;
        }
    });

    // Handle Invites
    client.add_event_handler(|ev: StrippedRoomMemberEvent, room: Room| async move {
        if ev.content.membership == MembershipState::Invite {
            tracing::info!("{}", logs::invite_received(room.room_id().as_str()));
            if let Err(e) = room.join().await {
                tracing::warn!("{}", logs::join_invite_fail(&e.to_string()));
            }
        }
    });

    // 6. Sync Loop
    tracing::info!("{}", logs::RUNNING);
    tracing::info!("{}", logs::SYNC_LOOP_START);
    client
        .sync(SyncSettings::default())
        .await
        .context("Matrix sync loop failed")?;

    Ok(())
}
