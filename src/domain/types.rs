//! # Domain Types
//!
//! Common data structures and enums used across the roster logic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a chat participant as stored in the `roster` and `maybe` maps.
/// Keyed by `username`, which is the case-sensitive participant identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub username: String,
    pub user_id: String,
}

impl Participant {
    pub fn new(username: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            user_id: user_id.into(),
        }
    }

    /// Builds a participant from a Matrix user id (`@alice:example.org` -> `alice`).
    pub fn from_user_id(user_id: &str) -> Self {
        let localpart = user_id
            .strip_prefix('@')
            .unwrap_or(user_id)
            .split(':')
            .next()
            .unwrap_or(user_id);
        Self::new(localpart, user_id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Soldier,
    Subcommand,
    Command,
    #[default]
    Unknown,
}

impl Role {
    /// Match order matters: `subcommand` must be tried before `command`.
    pub const PRECEDENCE: [Role; 3] = [Role::Soldier, Role::Subcommand, Role::Command];

    pub fn name(&self) -> &'static str {
        match self {
            Role::Soldier => "soldier",
            Role::Subcommand => "subcommand",
            Role::Command => "command",
            Role::Unknown => "unknown",
        }
    }

    /// Finds the first role name contained anywhere in `text`.
    pub fn infer(text: &str) -> Option<Role> {
        Self::PRECEDENCE
            .into_iter()
            .find(|role| text.contains(role.name()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Unknown => f.write_str("?"),
            other => f.write_str(other.name()),
        }
    }
}

/// Availability of a participant. `Invalid` is never persisted; it is what a
/// lookup yields for an identifier with no recorded status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Inside,
    Outside,
    Invalid,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Inside => "Inside",
            Status::Outside => "Outside",
            Status::Invalid => "Invalid",
        })
    }
}

/// Point-in-time view of both participant sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterSnapshot {
    pub roster: Vec<String>,
    pub maybes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub username: String,
    pub status: Status,
    pub cooldown_minutes: i64,
    pub resources: u8,
}
