//! # Session Handler
//!
//! Sits between the chat platform and the router: drops messages that are not
//! for the bot, routes the rest, posts the replies and schedules cleanup.

use crate::application::router::{CommandRouter, InboundCommand, Reply};
use crate::domain::traits::ChatProvider;
use crate::domain::types::Participant;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Platform-neutral view of a received text message.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub event_id: String,
    pub sender: String,
    pub body: String,
    pub mentions: Vec<MentionedUser>,
}

/// A user the platform lists as mentioned, with the name shown for them in
/// the room if it is known.
#[derive(Debug, Clone)]
pub struct MentionedUser {
    pub user_id: String,
    pub display_name: Option<String>,
}

pub struct SessionHandler {
    router: Arc<CommandRouter>,
    cleanup_delay: Duration,
}

impl SessionHandler {
    pub fn new(router: Arc<CommandRouter>, cleanup_delay: Duration) -> Self {
        Self {
            router,
            cleanup_delay,
        }
    }

    /// Returns the pending cleanup tasks so callers may await them.
    pub async fn handle<C>(&self, chat: &C, event: InboundEvent) -> Vec<JoinHandle<()>>
    where
        C: ChatProvider + Clone + 'static,
    {
        let ctx = self.router.context();
        if ctx.is_self(&event.sender) || !ctx.is_addressed(&event.body) {
            return Vec::new();
        }

        let inbound = InboundCommand {
            author: Participant::from_user_id(&event.sender),
            mentions: event
                .mentions
                .iter()
                .map(|m| Participant::from_user_id(&m.user_id))
                .collect(),
            mention_names: event
                .mentions
                .iter()
                .filter_map(|m| m.display_name.clone())
                .collect(),
            body: event.body,
        };

        let replies = self.router.route(&inbound).await;
        deliver(chat, &event.event_id, replies, self.cleanup_delay).await
    }
}

/// Posts each reply in order. A cleanup reply gets a background task that
/// waits `delay`, then deletes the trigger and the reply. Failures are logged
/// and otherwise ignored.
pub async fn deliver<C>(
    chat: &C,
    trigger_id: &str,
    replies: Vec<Reply>,
    delay: Duration,
) -> Vec<JoinHandle<()>>
where
    C: ChatProvider + Clone + 'static,
{
    let mut cleanups = Vec::new();
    for reply in replies {
        let reply_id = match chat.send_message(&reply.text).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Failed to send reply to {}: {}", chat.room_id(), e);
                continue;
            }
        };
        if !reply.cleanup {
            continue;
        }

        let chat = chat.clone();
        let trigger_id = trigger_id.to_string();
        cleanups.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!("cleaning up {} and {}", trigger_id, reply_id);
            if let Err(e) = chat.delete_message(&trigger_id).await {
                tracing::debug!("Cleanup of {} failed: {}", trigger_id, e);
            }
            if let Err(e) = chat.delete_message(&reply_id).await {
                tracing::debug!("Cleanup of {} failed: {}", reply_id, e);
            }
        }));
    }
    cleanups
}
