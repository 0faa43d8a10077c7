//! Chat domain: REST wire types and the conversation state fed by streams

pub mod state;
pub mod types;

pub use state::{ChatState, Transcript, STREAM_FAILED_MARKER};
pub use types::{
    ApiResponse, ChatMessage, ChatSendRequest, ChatSession, MessageRole, PageResult, SessionTitle,
};
