//! GeoRAG client core
//!
//! Streaming assembly of chat completions, chat state, and the HTTP
//! transport for the GeoRAG backend, including login.

pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod stream;
pub mod user;

pub use chat::{ChatMessage, ChatSession, ChatState};
pub use client::{ChatClient, ResponseBodySource};
pub use config::Config;
pub use error::{ClientError, ConfigError, TransportError};
pub use stream::{drive, DriveOutcome, SplitStrategy, StreamAssembler, StreamEvent};
pub use user::{LoginResult, Quota, UserProfile};
