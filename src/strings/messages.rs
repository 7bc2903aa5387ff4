//! # Messages
//!
//! Format functions for user-facing replies.

pub fn invalid_command(author_mention: &str, command: &str) -> String {
    format!("{author_mention} - Invalid Command: {command}")
}

pub fn added(name: &str, role: &str) -> String {
    format!("Added player {name} to the roster as {role}.")
}

pub fn added_maybe(name: &str) -> String {
    format!("Added player {name} as a 'Maybe'.")
}

pub fn removed(name: &str) -> String {
    format!("Removed player {name} from the roster.")
}

pub fn role_set(name: &str, role: &str) -> String {
    format!("Set player {name} to role: {role}.")
}

/// Membership refusals, attributed to the player they concern.
pub fn refused(name: &str, err: &str) -> String {
    format!("{name}: {err}")
}

pub fn record_failed(action: &str, name: &str) -> String {
    format!("Error: couldn't record {action} for {name}")
}

pub fn role_failed(name: &str) -> String {
    format!("Error: couldn't record role for {name}")
}

pub fn warped_in(name: &str) -> String {
    format!("{name} warped in. Cooldown set as 2hrs. Status is Inside.")
}

pub fn warped_out(name: &str) -> String {
    format!("{name} warped out. Status is Outside.")
}

pub fn warp_in_failed(name: &str) -> String {
    format!("Error: couldn't record warp in for {name}")
}

pub fn warp_out_failed(name: &str) -> String {
    format!("Error: couldn't record warp out for {name}")
}

pub const ROSTER_LOAD_FAILED: &str = "Error, couldn't load the roster.";
