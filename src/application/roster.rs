//! # Roster Engine
//!
//! Owns membership, roles, availability status and warp-in cooldowns.
//! Each entity lives under its own store key and every operation does its own
//! read-modify-write against that key; nothing is atomic across keys.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::error::{RosterError, RosterResult, StoreError};
use crate::domain::traits::{Clock, StateStore};
use crate::domain::types::{ListRow, Participant, ReportRow, Role, RosterSnapshot, Status};

/// Length of the cooldown window opened by a warp-in.
pub const COOLDOWN_MINUTES: i64 = 120;

/// Value reported by `minutes_since_warp_in_or_sentinel` when no warp-in is on record.
pub const NO_WARP_IN_SENTINEL: i64 = -1;

pub mod keys {
    pub const ROSTER: &str = "roster";
    pub const MAYBE: &str = "maybe";
    pub const ROLES: &str = "roles";
    pub const STATUSES: &str = "statuses";
    pub const WARP_IN_TIMES: &str = "warpInTimes";
}

/// How long ago a participant last warped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarpInAge {
    /// No warp-in on record. Counts as off cooldown.
    Never,
    /// The timestamp could not be read. Counts as a fresh warp-in.
    Unreadable,
    Elapsed(i64),
}

impl WarpInAge {
    pub fn on_cooldown(&self) -> bool {
        match self {
            WarpInAge::Never => false,
            WarpInAge::Unreadable => true,
            WarpInAge::Elapsed(minutes) => *minutes <= COOLDOWN_MINUTES,
        }
    }

    pub fn minutes_until_cooldown_ends(&self) -> i64 {
        match self {
            WarpInAge::Never => 0,
            WarpInAge::Unreadable => (COOLDOWN_MINUTES - NO_WARP_IN_SENTINEL).max(0),
            WarpInAge::Elapsed(minutes) => (COOLDOWN_MINUTES - minutes).max(0),
        }
    }
}

/// Resource policy: status x cooldown.
pub fn resources_for(status: Status, on_cooldown: bool) -> u8 {
    match (status, on_cooldown) {
        (Status::Inside, true) => 1,
        (Status::Inside, false) => 2,
        (Status::Outside, true) => 0,
        (Status::Outside, false) => 1,
        (Status::Invalid, _) => 0,
    }
}

#[derive(Clone)]
pub struct RosterEngine {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
}

impl RosterEngine {
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn load_map<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<BTreeMap<String, T>, StoreError> {
        match self.store.get(key).await? {
            Some(value) => serde_json::from_value(value).map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            }),
            None => Ok(BTreeMap::new()),
        }
    }

    async fn save_map<T: Serialize>(
        &self,
        key: &str,
        map: &BTreeMap<String, T>,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(map).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        self.store.put(key, value).await
    }

    async fn insert_participant(&self, key: &str, player: &Participant) -> RosterResult<()> {
        let mut entries: BTreeMap<String, Participant> = self.load_map(key).await?;
        if entries.contains_key(&player.username) {
            tracing::info!("Not adding user: {}, already in {}.", player.username, key);
            return Err(RosterError::AlreadyAdded);
        }
        entries.insert(player.username.clone(), player.clone());
        self.save_map(key, &entries).await?;
        tracing::info!("Added user: {} to {}.", player.username, key);
        Ok(())
    }

    async fn delete_participant(&self, key: &str, username: &str) -> RosterResult<()> {
        let mut entries: BTreeMap<String, Participant> = self.load_map(key).await?;
        if entries.remove(username).is_none() {
            tracing::info!("{} is already not in {}.", username, key);
            return Err(RosterError::AlreadyRemoved);
        }
        self.save_map(key, &entries).await?;
        tracing::info!("Removed user: {} from {}.", username, key);
        Ok(())
    }

    /// Deletes if present. `Ok(false)` when there was nothing to delete.
    async fn take_participant(&self, key: &str, username: &str) -> RosterResult<bool> {
        match self.delete_participant(key, username).await {
            Ok(()) => Ok(true),
            Err(RosterError::AlreadyRemoved) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Puts a participant back after a half-finished move. Failure is logged
    /// only, the caller already reports the original error.
    async fn restore_participant(&self, key: &str, player: &Participant) {
        match self.insert_participant(key, player).await {
            Ok(()) => tracing::warn!("Restored {} to {} after a failed move.", player.username, key),
            Err(e) => tracing::error!(
                "Could not restore {} to {}: {}. The participant is in neither set.",
                player.username,
                key,
                e
            ),
        }
    }

    async fn contains(&self, key: &str, username: &str) -> RosterResult<bool> {
        let entries: BTreeMap<String, Participant> = self.load_map(key).await?;
        Ok(entries.contains_key(username))
    }

    async fn save_entry<T: Serialize + DeserializeOwned>(
        &self,
        key: &str,
        username: &str,
        value: T,
    ) -> RosterResult<()> {
        let mut entries: BTreeMap<String, T> = self.load_map(key).await?;
        entries.insert(username.to_string(), value);
        self.save_map(key, &entries).await?;
        Ok(())
    }

    /// Commits a participant and marks them `Outside`.
    pub async fn add_member(&self, player: &Participant) -> RosterResult<()> {
        self.insert_participant(keys::ROSTER, player).await?;
        self.save_entry(keys::STATUSES, &player.username, Status::Outside)
            .await
    }

    /// Removes from the roster, falling back to the maybe set.
    pub async fn remove_member(&self, username: &str) -> RosterResult<()> {
        match self.delete_participant(keys::ROSTER, username).await {
            Err(RosterError::AlreadyRemoved) => self.remove_maybe(username).await,
            other => other,
        }
    }

    pub async fn remove_maybe(&self, username: &str) -> RosterResult<()> {
        self.delete_participant(keys::MAYBE, username).await
    }

    /// Demotes a committed participant (if any) into the maybe set. If the
    /// maybe write fails the participant goes back on the roster.
    pub async fn add_maybe(&self, player: &Participant) -> RosterResult<()> {
        if self.contains(keys::MAYBE, &player.username).await? {
            tracing::info!("Not adding user: {}, already in {}.", player.username, keys::MAYBE);
            return Err(RosterError::AlreadyAdded);
        }
        let was_member = self.take_participant(keys::ROSTER, &player.username).await?;
        if let Err(e) = self.insert_participant(keys::MAYBE, player).await {
            if was_member {
                self.restore_participant(keys::ROSTER, player).await;
            }
            return Err(e);
        }
        Ok(())
    }

    /// The `join`/`add` path: promotes out of the maybe set, commits, and
    /// records the role when one was given. If the commit fails the
    /// participant goes back to the maybe set.
    pub async fn enlist(&self, player: &Participant, role: Option<Role>) -> RosterResult<()> {
        if self.contains(keys::ROSTER, &player.username).await? {
            tracing::info!("Not adding user: {}, already in {}.", player.username, keys::ROSTER);
            return Err(RosterError::AlreadyAdded);
        }
        let was_maybe = self.take_participant(keys::MAYBE, &player.username).await?;
        if let Err(e) = self.add_member(player).await {
            let committed = self
                .contains(keys::ROSTER, &player.username)
                .await
                .unwrap_or(false);
            if was_maybe && !committed {
                self.restore_participant(keys::MAYBE, player).await;
            }
            return Err(e);
        }
        if let Some(role) = role {
            self.assign_role(&player.username, role).await?;
        }
        Ok(())
    }

    pub async fn assign_role(&self, username: &str, role: Role) -> RosterResult<()> {
        self.save_entry(keys::ROLES, username, role).await?;
        tracing::info!("Set role of {} to {}.", username, role.name());
        Ok(())
    }

    pub async fn role(&self, username: &str) -> RosterResult<Role> {
        let roles: BTreeMap<String, Role> = self.load_map(keys::ROLES).await?;
        Ok(roles.get(username).copied().unwrap_or_default())
    }

    /// Anchors the cooldown window at now and marks the participant `Inside`.
    pub async fn warp_in(&self, username: &str) -> RosterResult<()> {
        self.save_entry(keys::WARP_IN_TIMES, username, self.clock.now())
            .await?;
        self.save_entry(keys::STATUSES, username, Status::Inside)
            .await?;
        tracing::info!("{} warped in.", username);
        Ok(())
    }

    /// Leaves the warp-in timestamp untouched; the cooldown keeps running.
    pub async fn warp_out(&self, username: &str) -> RosterResult<()> {
        self.save_entry(keys::STATUSES, username, Status::Outside)
            .await?;
        tracing::info!(
            "{} warped out, {} min since warp in.",
            username,
            self.minutes_since_warp_in_or_sentinel(username).await
        );
        Ok(())
    }

    pub async fn status(&self, username: &str) -> RosterResult<Status> {
        let statuses: BTreeMap<String, Status> = self.load_map(keys::STATUSES).await?;
        Ok(statuses.get(username).copied().unwrap_or(Status::Invalid))
    }

    pub async fn minutes_since_warp_in(&self, username: &str) -> RosterResult<Option<i64>> {
        let times: BTreeMap<String, DateTime<Utc>> = self.load_map(keys::WARP_IN_TIMES).await?;
        Ok(times
            .get(username)
            .map(|t| (self.clock.now() - *t).num_minutes()))
    }

    /// Integer form, `-1` when nothing is on record.
    async fn minutes_since_warp_in_or_sentinel(&self, username: &str) -> i64 {
        match self.minutes_since_warp_in(username).await {
            Ok(Some(minutes)) => minutes,
            Ok(None) => NO_WARP_IN_SENTINEL,
            Err(e) => {
                tracing::warn!("Error getting warp-in time for {}: {}", username, e);
                NO_WARP_IN_SENTINEL
            }
        }
    }

    pub async fn warp_in_age(&self, username: &str) -> WarpInAge {
        match self.minutes_since_warp_in(username).await {
            Ok(Some(minutes)) => WarpInAge::Elapsed(minutes),
            Ok(None) => WarpInAge::Never,
            Err(e) => {
                tracing::warn!("Error getting warp-in time for {}: {}", username, e);
                WarpInAge::Unreadable
            }
        }
    }

    pub async fn minutes_until_cooldown_ends(&self, username: &str) -> i64 {
        self.warp_in_age(username).await.minutes_until_cooldown_ends()
    }

    pub async fn resources_available(&self, username: &str) -> u8 {
        let status = match self.status(username).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!("Error getting status for {}: {}", username, e);
                return 0;
            }
        };
        let age = self.warp_in_age(username).await;
        resources_for(status, age.on_cooldown())
    }

    async fn load_sets(
        &self,
    ) -> RosterResult<(BTreeMap<String, Participant>, BTreeMap<String, Participant>)> {
        let roster = self
            .load_map(keys::ROSTER)
            .await
            .map_err(RosterError::CannotLoadRoster)?;
        let maybes = self
            .load_map(keys::MAYBE)
            .await
            .map_err(RosterError::CannotLoadRoster)?;
        Ok((roster, maybes))
    }

    pub async fn list_roster(&self) -> RosterResult<RosterSnapshot> {
        let (roster, maybes) = self.load_sets().await?;
        Ok(RosterSnapshot {
            roster: roster.into_keys().collect(),
            maybes: maybes.into_keys().collect(),
        })
    }

    /// Committed participants with their roles, plus the maybe set.
    /// A failed role lookup degrades to `Unknown` rather than failing the listing.
    pub async fn build_list(&self) -> RosterResult<(Vec<ListRow>, Vec<String>)> {
        let snapshot = self.list_roster().await?;
        let roles: BTreeMap<String, Role> = match self.load_map(keys::ROLES).await {
            Ok(roles) => roles,
            Err(e) => {
                tracing::warn!("Error loading roles: {}", e);
                BTreeMap::new()
            }
        };
        let rows = snapshot
            .roster
            .into_iter()
            .map(|username| {
                let role = roles.get(&username).copied().unwrap_or_default();
                ListRow { username, role }
            })
            .collect();
        Ok((rows, snapshot.maybes))
    }

    /// One row per committed participant, ordered by identifier.
    pub async fn build_report(&self) -> RosterResult<Vec<ReportRow>> {
        let snapshot = self.list_roster().await?;
        let mut rows = Vec::with_capacity(snapshot.roster.len());
        for username in snapshot.roster {
            let status = self.status(&username).await.unwrap_or_else(|e| {
                tracing::warn!("Error getting status for {}: {}", username, e);
                Status::Invalid
            });
            rows.push(ReportRow {
                cooldown_minutes: self.minutes_until_cooldown_ends(&username).await,
                resources: self.resources_available(&username).await,
                status,
                username,
            });
        }
        Ok(rows)
    }
}
