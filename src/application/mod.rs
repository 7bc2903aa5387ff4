//! # Application Layer
//!
//! Contains the core business logic of the bot.
//! This includes the roster engine, command routing and response formatting.

pub mod formatter;
pub mod roster;
pub mod router;
