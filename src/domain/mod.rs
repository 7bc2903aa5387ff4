//! # Domain Layer
//!
//! Core definitions, types, and traits that define the roster domain.
//! Independent of the chat platform and storage backend, serving as the contract for other layers.

pub mod config;
pub mod context;
pub mod error;
pub mod traits;
pub mod types;
