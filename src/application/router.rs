//! # Command Router
//!
//! Turns a normalized chat command into roster operations and reply text.
//! The first recognised token picks the verb; replies to mutations are marked
//! for cleanup, query replies are not. Delivery is left to the caller.

use crate::application::formatter::RosterFormatter;
use crate::application::roster::RosterEngine;
use crate::domain::context::BotContext;
use crate::domain::error::RosterError;
use crate::domain::types::{Participant, Role};
use crate::strings::{help, messages};
use std::collections::HashSet;

/// An inbound chat message, already stripped of platform details.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub author: Participant,
    pub mentions: Vec<Participant>,
    /// Display names of the mentioned users, as they may appear in `body`.
    pub mention_names: Vec<String>,
    pub body: String,
}

impl InboundCommand {
    /// The command with every mentioned user's name taken out, so a name
    /// such as "Commander Keen" is not read as a role.
    fn without_mentions(&self, command: &str) -> String {
        let mut names: HashSet<String> = HashSet::new();
        for p in &self.mentions {
            let username = p.username.to_lowercase();
            names.insert(format!("@{username}"));
            names.insert(username);
            names.insert(p.user_id.to_lowercase());
        }
        for name in &self.mention_names {
            names.extend(name.split_whitespace().map(str::to_lowercase));
        }

        command
            .split_whitespace()
            .filter(|token| !names.contains(token.trim_matches([':', ','])))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Delete this reply and its trigger after the cleanup delay.
    pub cleanup: bool,
}

impl Reply {
    fn cleanup(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cleanup: true,
        }
    }

    fn query(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cleanup: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Help,
    Join,
    Maybe,
    Add,
    AddMaybe,
    Leave,
    Remove,
    Role,
    WarpIn,
    WarpOut,
    List,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Verb(Verb),
    /// Carries no meaning of its own; dispatch continues with the next token.
    Prefix,
}

const TOKENS: &[(&str, Token)] = &[
    ("help", Token::Verb(Verb::Help)),
    ("join", Token::Verb(Verb::Join)),
    ("maybe", Token::Verb(Verb::Maybe)),
    ("add", Token::Verb(Verb::Add)),
    ("addmaybe", Token::Verb(Verb::AddMaybe)),
    ("leave", Token::Verb(Verb::Leave)),
    ("remove", Token::Verb(Verb::Remove)),
    ("role", Token::Verb(Verb::Role)),
    ("warp", Token::Prefix),
    ("warpin", Token::Verb(Verb::WarpIn)),
    ("warp-in", Token::Verb(Verb::WarpIn)),
    ("in", Token::Verb(Verb::WarpIn)),
    ("warpout", Token::Verb(Verb::WarpOut)),
    ("warp-out", Token::Verb(Verb::WarpOut)),
    ("out", Token::Verb(Verb::WarpOut)),
    ("list", Token::Verb(Verb::List)),
    ("report", Token::Verb(Verb::Report)),
];

fn lookup(token: &str) -> Option<Token> {
    TOKENS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, token)| *token)
}

pub struct CommandRouter {
    ctx: BotContext,
    engine: RosterEngine,
    group_name: String,
    skip_unknown_prefix: bool,
}

impl CommandRouter {
    pub fn new(
        ctx: BotContext,
        engine: RosterEngine,
        group_name: String,
        skip_unknown_prefix: bool,
    ) -> Self {
        Self {
            ctx,
            engine,
            group_name,
            skip_unknown_prefix,
        }
    }

    pub fn context(&self) -> &BotContext {
        &self.ctx
    }

    /// Finds the verb in an already-normalized command, skipping leading
    /// tokens that are not verbs. `None` once the tokens run out.
    pub fn resolve_verb(&self, command: &str) -> Option<Verb> {
        let mut rest: Vec<&str> = command.split_whitespace().collect();
        rest.reverse();
        while let Some(token) = rest.pop() {
            match lookup(token) {
                Some(Token::Verb(verb)) => return Some(verb),
                Some(Token::Prefix) => continue,
                None if self.skip_unknown_prefix => continue,
                None => return None,
            }
        }
        None
    }

    pub async fn route(&self, inbound: &InboundCommand) -> Vec<Reply> {
        let command = self.ctx.normalize(&inbound.body);

        let Some(verb) = self.resolve_verb(&command) else {
            tracing::info!(
                "Invalid command '{}' from {}",
                command,
                inbound.author.username
            );
            return vec![Reply::cleanup(messages::invalid_command(
                &inbound.author.user_id,
                &command,
            ))];
        };

        tracing::info!(
            "Router dispatching verb={:?} command='{}' sender='{}'",
            verb,
            command,
            inbound.author.username
        );

        let role = Role::infer(&inbound.without_mentions(&command));
        let mentions: Vec<&Participant> = inbound
            .mentions
            .iter()
            .filter(|p| !self.ctx.is_self(&p.user_id))
            .collect();

        let mut replies = Vec::new();
        match verb {
            Verb::Help => replies.push(Reply::query(help::MAIN)),
            Verb::Join => replies.push(self.enlist(&inbound.author, role).await),
            Verb::Add => {
                for player in mentions {
                    replies.push(self.enlist(player, role).await);
                }
            }
            Verb::Maybe => replies.push(self.add_maybe(&inbound.author).await),
            Verb::AddMaybe => {
                for player in mentions {
                    replies.push(self.add_maybe(player).await);
                }
            }
            Verb::Leave => replies.push(self.remove(&inbound.author).await),
            Verb::Remove => {
                for player in mentions {
                    replies.push(self.remove(player).await);
                }
            }
            Verb::Role => {
                let role = role.unwrap_or_default();
                for player in mentions {
                    replies.push(self.assign_role(player, role).await);
                }
            }
            Verb::WarpIn => replies.push(self.warp_in(&inbound.author).await),
            Verb::WarpOut => replies.push(self.warp_out(&inbound.author).await),
            Verb::List => replies.push(self.list().await),
            Verb::Report => replies.push(self.report().await),
        }
        replies
    }

    async fn enlist(&self, player: &Participant, role: Option<Role>) -> Reply {
        match self.engine.enlist(player, role).await {
            Ok(()) => {
                let role = match role {
                    Some(role) => role,
                    None => self.engine.role(&player.username).await.unwrap_or_default(),
                };
                Reply::cleanup(messages::added(&player.username, &role.to_string()))
            }
            Err(e) => Reply::cleanup(refusal(player, &e, "join")),
        }
    }

    async fn add_maybe(&self, player: &Participant) -> Reply {
        match self.engine.add_maybe(player).await {
            Ok(()) => Reply::cleanup(messages::added_maybe(&player.username)),
            Err(e) => Reply::cleanup(refusal(player, &e, "maybe")),
        }
    }

    async fn remove(&self, player: &Participant) -> Reply {
        match self.engine.remove_member(&player.username).await {
            Ok(()) => Reply::cleanup(messages::removed(&player.username)),
            Err(e) => Reply::cleanup(refusal(player, &e, "removal")),
        }
    }

    async fn assign_role(&self, player: &Participant, role: Role) -> Reply {
        match self.engine.assign_role(&player.username, role).await {
            Ok(()) => Reply::cleanup(messages::role_set(&player.username, &role.to_string())),
            Err(e) => {
                tracing::error!("Failed to save role for {}: {}", player.username, e);
                Reply::cleanup(messages::role_failed(&player.username))
            }
        }
    }

    async fn warp_in(&self, player: &Participant) -> Reply {
        match self.engine.warp_in(&player.username).await {
            Ok(()) => Reply::cleanup(messages::warped_in(&player.username)),
            Err(e) => {
                tracing::error!("Failed to record warp in for {}: {}", player.username, e);
                Reply::cleanup(messages::warp_in_failed(&player.username))
            }
        }
    }

    async fn warp_out(&self, player: &Participant) -> Reply {
        match self.engine.warp_out(&player.username).await {
            Ok(()) => Reply::cleanup(messages::warped_out(&player.username)),
            Err(e) => {
                tracing::error!("Failed to record warp out for {}: {}", player.username, e);
                Reply::cleanup(messages::warp_out_failed(&player.username))
            }
        }
    }

    async fn list(&self) -> Reply {
        match self.engine.build_list().await {
            Ok((rows, maybes)) => {
                Reply::query(RosterFormatter::format_list(&self.group_name, &rows, &maybes))
            }
            Err(e) => {
                tracing::error!("Failed to load roster for list: {}", e);
                Reply::cleanup(messages::ROSTER_LOAD_FAILED)
            }
        }
    }

    async fn report(&self) -> Reply {
        match self.engine.build_report().await {
            Ok(rows) => Reply::query(RosterFormatter::format_report(&rows)),
            Err(e) => {
                tracing::error!("Failed to load roster for report: {}", e);
                Reply::cleanup(messages::ROSTER_LOAD_FAILED)
            }
        }
    }
}

/// Membership refusals are shown as-is; storage failures are logged and
/// replaced by a generic line.
fn refusal(player: &Participant, err: &RosterError, action: &str) -> String {
    match err {
        RosterError::AlreadyAdded | RosterError::AlreadyRemoved => {
            messages::refused(&player.username, &err.to_string())
        }
        _ => {
            tracing::error!("Failed to record {} for {}: {}", action, player.username, err);
            messages::record_failed(action, &player.username)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::roster::tests::{FailingStore, ManualClock};
    use crate::domain::types::Status;
    use crate::infrastructure::store::MemoryStore;
    use std::sync::Arc;

    const BOT: &str = "@rosterbot:example.org";

    fn router_with(engine: RosterEngine, skip_unknown_prefix: bool) -> CommandRouter {
        CommandRouter::new(
            BotContext::new(BOT, Some("RosterBot")),
            engine,
            "White Star".to_string(),
            skip_unknown_prefix,
        )
    }

    fn setup() -> (CommandRouter, RosterEngine) {
        let engine = RosterEngine::new(Arc::new(MemoryStore::new()), Arc::new(ManualClock::new()));
        (router_with(engine.clone(), true), engine)
    }

    fn user(name: &str) -> Participant {
        Participant::from_user_id(&format!("@{name}:example.org"))
    }

    fn msg(author: &str, body: &str, mentions: &[&str]) -> InboundCommand {
        InboundCommand {
            author: user(author),
            mentions: mentions.iter().map(|m| user(m)).collect(),
            mention_names: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_resolve_verb_skips_prefix_tokens() {
        let (router, _) = setup();
        assert_eq!(router.resolve_verb("warp in"), Some(Verb::WarpIn));
        assert_eq!(router.resolve_verb("warp-out"), Some(Verb::WarpOut));
        assert_eq!(router.resolve_verb("please kindly list"), Some(Verb::List));
        assert_eq!(router.resolve_verb("foo bar baz"), None);
        assert_eq!(router.resolve_verb("warp"), None);
        assert_eq!(router.resolve_verb(""), None);
    }

    #[test]
    fn test_strict_mode_rejects_unknown_first_token() {
        let engine = RosterEngine::new(Arc::new(MemoryStore::new()), Arc::new(ManualClock::new()));
        let router = router_with(engine, false);
        assert_eq!(router.resolve_verb("please list"), None);
        assert_eq!(router.resolve_verb("warp in"), Some(Verb::WarpIn));
    }

    #[tokio::test]
    async fn test_invalid_command_reply() {
        let (router, _) = setup();
        let replies = router.route(&msg("alice", "RosterBot: dance now", &[])).await;
        assert_eq!(
            replies,
            vec![Reply::cleanup(
                "@alice:example.org - Invalid Command: dance now"
            )]
        );
    }

    #[tokio::test]
    async fn test_help_is_not_cleaned_up() {
        let (router, _) = setup();
        let replies = router.route(&msg("alice", "RosterBot help", &[])).await;
        assert_eq!(replies.len(), 1);
        assert!(!replies[0].cleanup);
        assert!(replies[0].text.starts_with("Roster Bot Commands:"));
    }

    #[tokio::test]
    async fn test_join_with_role_and_duplicate() {
        let (router, engine) = setup();
        let replies = router.route(&msg("alice", "RosterBot join as Soldier", &[])).await;
        assert_eq!(
            replies,
            vec![Reply::cleanup("Added player alice to the roster as soldier.")]
        );
        assert_eq!(engine.role("alice").await.unwrap(), Role::Soldier);
        assert_eq!(engine.status("alice").await.unwrap(), Status::Outside);

        let replies = router.route(&msg("alice", "RosterBot join", &[])).await;
        assert_eq!(
            replies,
            vec![Reply::cleanup("alice: Player already added.")]
        );
    }

    #[tokio::test]
    async fn test_add_applies_to_each_mention_but_not_bot() {
        let (router, engine) = setup();
        let replies = router
            .route(&msg(
                "alice",
                "RosterBot add bob carol subcommand",
                &["rosterbot", "bob", "carol"],
            ))
            .await;
        assert_eq!(replies.len(), 2);
        assert!(replies.iter().all(|r| r.cleanup));

        let snapshot = engine.list_roster().await.unwrap();
        assert_eq!(snapshot.roster, vec!["bob", "carol"]);
        assert_eq!(engine.role("bob").await.unwrap(), Role::Subcommand);
    }

    #[tokio::test]
    async fn test_mentioned_names_do_not_pick_the_role() {
        let (router, engine) = setup();
        let mut inbound = msg("alice", "RosterBot: add Commander Keen", &["rosterbot", "keen"]);
        inbound.mention_names = vec!["RosterBot".to_string(), "Commander Keen".to_string()];
        let replies = router.route(&inbound).await;
        assert_eq!(
            replies,
            vec![Reply::cleanup("Added player keen to the roster as ?.")]
        );
        assert_eq!(engine.role("keen").await.unwrap(), Role::Unknown);

        let mut inbound = msg("alice", "RosterBot: role Commander Keen soldier", &["keen"]);
        inbound.mention_names = vec!["Commander Keen".to_string()];
        router.route(&inbound).await;
        assert_eq!(engine.role("keen").await.unwrap(), Role::Soldier);

        // A bare localpart mention is stripped the same way.
        let replies = router
            .route(&msg("alice", "RosterBot role @commander", &["commander"]))
            .await;
        assert_eq!(replies, vec![Reply::cleanup("Set player commander to role: ?.")]);
    }

    #[tokio::test]
    async fn test_add_without_mentions_is_noop() {
        let (router, engine) = setup();
        let replies = router.route(&msg("alice", "RosterBot add", &[])).await;
        assert!(replies.is_empty());
        assert!(engine.list_roster().await.unwrap().roster.is_empty());
    }

    #[tokio::test]
    async fn test_role_precedence_and_unknown() {
        let (router, engine) = setup();
        router
            .route(&msg("alice", "RosterBot role bob subcommand", &["bob"]))
            .await;
        assert_eq!(engine.role("bob").await.unwrap(), Role::Subcommand);

        let replies = router
            .route(&msg("alice", "RosterBot role bob captain", &["bob"]))
            .await;
        assert_eq!(replies, vec![Reply::cleanup("Set player bob to role: ?.")]);
        assert_eq!(engine.role("bob").await.unwrap(), Role::Unknown);
    }

    #[tokio::test]
    async fn test_maybe_leave_and_remove() {
        let (router, engine) = setup();
        router.route(&msg("alice", "RosterBot join", &[])).await;
        let replies = router.route(&msg("alice", "RosterBot maybe", &[])).await;
        assert_eq!(replies, vec![Reply::cleanup("Added player alice as a 'Maybe'.")]);
        let snapshot = engine.list_roster().await.unwrap();
        assert!(snapshot.roster.is_empty());
        assert_eq!(snapshot.maybes, vec!["alice"]);

        let replies = router.route(&msg("alice", "RosterBot leave", &[])).await;
        assert_eq!(replies, vec![Reply::cleanup("Removed player alice from the roster.")]);

        let replies = router
            .route(&msg("bob", "RosterBot remove alice", &["alice"]))
            .await;
        assert_eq!(replies, vec![Reply::cleanup("alice: Player already removed.")]);
    }

    #[tokio::test]
    async fn test_warp_in_and_report() {
        let (router, _) = setup();
        router.route(&msg("alice", "RosterBot join", &[])).await;
        let replies = router.route(&msg("alice", "RosterBot warp in", &[])).await;
        assert_eq!(
            replies,
            vec![Reply::cleanup(
                "alice warped in. Cooldown set as 2hrs. Status is Inside."
            )]
        );

        let replies = router.route(&msg("bob", "RosterBot report", &[])).await;
        assert_eq!(replies.len(), 1);
        assert!(!replies[0].cleanup);
        assert!(replies[0].text.contains("Status[Inside]"));
        assert!(replies[0].text.contains("Cooldown[120 min]"));
        assert!(replies[0].text.contains("RocketsReady[1]"));

        let replies = router.route(&msg("alice", "RosterBot warpout", &[])).await;
        assert_eq!(
            replies,
            vec![Reply::cleanup("alice warped out. Status is Outside.")]
        );
    }

    #[tokio::test]
    async fn test_list_view() {
        let (router, _) = setup();
        router.route(&msg("alice", "RosterBot join command", &[])).await;
        router.route(&msg("bob", "RosterBot maybe", &[])).await;
        let replies = router.route(&msg("carol", "RosterBot list", &[])).await;
        assert_eq!(replies.len(), 1);
        assert!(!replies[0].cleanup);
        assert!(replies[0].text.contains("(1)The following players are joining the White Star."));
        assert!(replies[0].text.contains("[command]      alice"));
        assert!(replies[0].text.contains("(1)The following players are 'maybe'."));
    }

    #[tokio::test]
    async fn test_storage_errors_are_reported_inline() {
        let engine = RosterEngine::new(Arc::new(FailingStore), Arc::new(ManualClock::new()));
        let router = router_with(engine, true);

        let replies = router.route(&msg("alice", "RosterBot warp in", &[])).await;
        assert_eq!(
            replies,
            vec![Reply::cleanup("Error: couldn't record warp in for alice")]
        );

        let replies = router.route(&msg("alice", "RosterBot report", &[])).await;
        assert_eq!(replies, vec![Reply::cleanup("Error, couldn't load the roster.")]);
    }

    #[tokio::test]
    async fn test_membership_storage_errors_are_not_leaked() {
        let engine = RosterEngine::new(Arc::new(FailingStore), Arc::new(ManualClock::new()));
        let router = router_with(engine, true);

        let replies = router.route(&msg("alice", "RosterBot join", &[])).await;
        assert_eq!(
            replies,
            vec![Reply::cleanup("Error: couldn't record join for alice")]
        );

        let replies = router.route(&msg("alice", "RosterBot maybe", &[])).await;
        assert_eq!(
            replies,
            vec![Reply::cleanup("Error: couldn't record maybe for alice")]
        );

        let replies = router
            .route(&msg("alice", "RosterBot remove bob", &["bob"]))
            .await;
        assert_eq!(
            replies,
            vec![Reply::cleanup("Error: couldn't record removal for bob")]
        );
        assert!(replies.iter().all(|r| !r.text.contains("disk on fire")));
    }
}
