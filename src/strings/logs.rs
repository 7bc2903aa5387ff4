//! # Log Messages
//!
//! Startup and session log lines.

pub fn config_loaded(path: &str) -> String {
    format!("Loaded configuration from {path}")
}

pub fn session_restored(user: &str) -> String {
    format!("Restored session for {user}")
}

pub fn setting_display_name(name: &str) -> String {
    format!("Setting display name to: {name}")
}

pub fn set_display_name_fail(err: &str) -> String {
    format!("Failed to set display name: {err}")
}

pub fn invite_received(room_id: &str) -> String {
    format!("Received invite for room {room_id}")
}

pub fn join_invite_fail(err: &str) -> String {
    format!("Failed to join room after invite: {err}")
}

pub const SYNC_LOOP_START: &str = "Starting sync loop...";
pub const RUNNING: &str = "Roster Bot is running!";
