//! # Interface Layer
//!
//! Entry point for inbound chat traffic. Decides whether a message is a
//! command for the bot and delivers the router's replies.

pub mod session;
