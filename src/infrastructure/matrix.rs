//! # Matrix Service Adapter
//!
//! Implements the `ChatProvider` trait for the Matrix protocol using the `matrix_sdk`.
//! Also restores the bot's session from the configured access token.

use crate::domain::config::MatrixConfig;
use crate::domain::traits::ChatProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use matrix_sdk::authentication::{SessionTokens, matrix::MatrixSession};
use matrix_sdk::room::Room;
use matrix_sdk::ruma::EventId;
use matrix_sdk::ruma::events::room::message::RoomMessageEventContent;
use matrix_sdk::{Client, SessionMeta};

/// Builds a client and restores the session. Any failure is fatal at startup.
pub async fn connect(config: &MatrixConfig) -> Result<Client> {
    let token = config.resolve_token()?;

    let client = Client::builder()
        .homeserver_url(&config.homeserver)
        .build()
        .await
        .context("building matrix client")?;

    let session = MatrixSession {
        meta: SessionMeta {
            user_id: config.user_id.parse().context("invalid user_id")?,
            device_id: config.device_id.clone().into(),
        },
        tokens: SessionTokens {
            access_token: token,
            refresh_token: None,
        },
    };
    client
        .restore_session(session)
        .await
        .context("restoring session")?;

    Ok(client)
}

#[derive(Clone)]
pub struct MatrixService {
    room: Room,
}

impl MatrixService {
    pub fn new(room: Room) -> Self {
        Self { room }
    }
}

#[async_trait]
impl ChatProvider for MatrixService {
    fn room_id(&self) -> String {
        self.room.room_id().as_str().to_string()
    }

    async fn send_message(&self, content: &str) -> Result<String, String> {
        tracing::info!("Bot sending message to {}: {}", self.room_id(), content);
        self.room
            .send(RoomMessageEventContent::text_markdown(content))
            .await
            .map(|resp| resp.event_id.to_string())
            .map_err(|e| e.to_string())
    }

    async fn delete_message(&self, message_id: &str) -> Result<(), String> {
        let event_id = <&EventId>::try_from(message_id).map_err(|e| e.to_string())?;
        self.room
            .redact(event_id, None, None)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}
