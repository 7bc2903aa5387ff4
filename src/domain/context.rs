//! # Bot Context
//!
//! The bot's own identity, resolved once at startup and passed explicitly
//! to everything that needs to recognise or strip the bot's mention.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotContext {
    /// Full platform id of the bot account (e.g. `@rosterbot:example.org`).
    pub bot_id: String,
    /// Text users type to address the bot. Falls back to `bot_id`.
    pub mention: String,
}

impl BotContext {
    pub fn new(bot_id: impl Into<String>, display_name: Option<&str>) -> Self {
        let bot_id = bot_id.into();
        let mention = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| bot_id.clone());
        Self { bot_id, mention }
    }

    /// A message is for the bot only when it opens with the mention, either
    /// as a bare token or as the `Name:` pill clients render.
    pub fn is_addressed(&self, body: &str) -> bool {
        self.strip_leading_mention(body).is_some()
    }

    /// Drops the leading mention and any other mention tokens, then
    /// lower-cases what is left.
    pub fn normalize(&self, body: &str) -> String {
        let rest = self.strip_leading_mention(body).unwrap_or(body);
        let mut text = rest.replace(&self.mention, " ");
        if self.mention != self.bot_id {
            text = text.replace(&self.bot_id, " ");
        }
        text.trim()
            .trim_start_matches([':', ','])
            .trim()
            .to_lowercase()
    }

    fn strip_leading_mention<'a>(&self, body: &'a str) -> Option<&'a str> {
        let body = body.trim_start();
        [self.mention.as_str(), self.bot_id.as_str()]
            .into_iter()
            .find_map(|token| {
                let rest = body.strip_prefix(token)?;
                match rest.chars().next() {
                    None => Some(rest),
                    Some(c) if c.is_whitespace() || c == ':' || c == ',' => Some(rest),
                    Some(_) => None,
                }
            })
    }

    pub fn is_self(&self, user_id: &str) -> bool {
        user_id == self.bot_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> BotContext {
        BotContext::new("@rosterbot:example.org", Some("RosterBot"))
    }

    #[test]
    fn test_mention_defaults_to_id() {
        let c = BotContext::new("@rosterbot:example.org", Some("  "));
        assert_eq!(c.mention, "@rosterbot:example.org");
    }

    #[test]
    fn test_is_addressed() {
        let c = ctx();
        assert!(c.is_addressed("RosterBot: join"));
        assert!(c.is_addressed("  RosterBot, list"));
        assert!(c.is_addressed("@rosterbot:example.org list"));
        assert!(c.is_addressed("RosterBot"));
        assert!(!c.is_addressed("rosterbot join"));
        assert!(!c.is_addressed("RosterBotter join"));
    }

    #[test]
    fn test_mention_in_passing_is_not_addressed() {
        let c = ctx();
        assert!(!c.is_addressed("Is RosterBot in the room?"));
        assert!(!c.is_addressed("hey @rosterbot:example.org list"));
        assert!(!c.is_addressed("ask RosterBot: out"));
    }

    #[test]
    fn test_normalize_strips_mention_and_lowercases() {
        let c = ctx();
        assert_eq!(c.normalize("RosterBot: Warp IN "), "warp in");
        assert_eq!(c.normalize("@rosterbot:example.org LIST"), "list");
    }
}
