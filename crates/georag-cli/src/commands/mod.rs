//! Subcommand implementations

pub mod chat;
pub mod replay;
pub mod sessions;
pub mod user;
