//! Chat state driven by stream events
//!
//! Messages are plain ordered records. The in-flight assistant reply is
//! updated by replacing the record at its index, so a host UI can detect
//! changes with its own change tracking.

use tracing::{debug, info};

use super::types::{ChatMessage, MessageRole};
use crate::stream::{EventSink, StreamEvent};

/// Suffix appended to the assistant reply when the stream breaks
pub const STREAM_FAILED_MARKER: &str = "\n[stream parse failed]";

/// Ordered list of chat messages
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its index
    pub fn push(&mut self, message: ChatMessage) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    /// Replace the message at `index`
    ///
    /// Returns false if the index is out of range (e.g. the transcript was
    /// cleared while a stream was still running).
    pub fn replace_at(&mut self, index: usize, message: ChatMessage) -> bool {
        match self.messages.get_mut(index) {
            Some(slot) => {
                *slot = message;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.messages.get(index)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn update_at(&mut self, index: usize, update: impl FnOnce(&mut ChatMessage)) -> bool {
        let Some(mut message) = self.get(index).cloned() else {
            return false;
        };
        update(&mut message);
        self.replace_at(index, message)
    }
}

/// Client-side state of the active conversation
#[derive(Debug, Default)]
pub struct ChatState {
    /// Session the transcript belongs to (None for a new chat)
    pub session_id: Option<String>,
    pub transcript: Transcript,
    /// Whether an assistant reply is currently streaming
    pub is_typing: bool,
    /// Set when the session list should be reloaded
    pub sessions_stale: bool,
    /// Index of the assistant placeholder being streamed into
    reply_index: Option<usize>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new exchange
    ///
    /// Pushes the user message and an empty assistant placeholder. Returns
    /// `None` when the input is blank or a reply is already streaming.
    pub fn begin_exchange(&mut self, content: &str) -> Option<usize> {
        let content = content.trim();
        if content.is_empty() || self.is_typing {
            return None;
        }

        self.transcript.push(ChatMessage::user(content));
        let index = self.transcript.push(ChatMessage::assistant_placeholder());
        self.reply_index = Some(index);
        self.is_typing = true;
        Some(index)
    }

    /// The assistant message currently being streamed
    pub fn current_reply(&self) -> Option<&ChatMessage> {
        self.reply_index.and_then(|i| self.transcript.get(i))
    }

    /// Mark the exchange as broken; keeps whatever text already arrived
    pub fn fail_exchange(&mut self) {
        if let Some(index) = self.reply_index {
            self.transcript
                .update_at(index, |m| m.context.push_str(STREAM_FAILED_MARKER));
        }
        self.end_exchange();
    }

    /// Finish the exchange regardless of whether `Finished` was received
    pub fn end_exchange(&mut self) {
        self.is_typing = false;
        self.reply_index = None;
    }

    /// Reset to an empty, session-less chat
    pub fn new_chat(&mut self) {
        self.session_id = None;
        self.transcript.clear();
        self.end_exchange();
    }

    /// Replace the transcript with a session's history
    pub fn load_history(&mut self, session_id: &str, messages: Vec<ChatMessage>) {
        self.new_chat();
        self.session_id = Some(session_id.to_string());
        for message in messages {
            self.transcript.push(message);
        }
    }

    /// Forget a deleted session, resetting if it was the active one
    pub fn forget_session(&mut self, session_id: &str) {
        if self.session_id.as_deref() == Some(session_id) {
            self.new_chat();
        }
    }

    pub fn sessions_refreshed(&mut self) {
        self.sessions_stale = false;
    }
}

impl EventSink for ChatState {
    fn emit(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::SessionAssigned { session_id } => {
                if self.session_id.is_none() {
                    info!("Chat bound to new session {}", session_id);
                    self.session_id = Some(session_id);
                    self.sessions_stale = true;
                }
            }
            StreamEvent::MessageAssigned { message_id } => {
                if let Some(index) = self.reply_index {
                    self.transcript.update_at(index, |m| m.id = message_id);
                }
            }
            StreamEvent::TextDelta { text } => {
                if let Some(index) = self.reply_index {
                    self.transcript
                        .update_at(index, |m| m.context.push_str(&text));
                }
            }
            StreamEvent::Finished => {
                self.is_typing = false;
            }
            StreamEvent::ParseSkipped { raw_fragment } => {
                debug!("Ignoring unparsed fragment ({} chars)", raw_fragment.len());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(text: &str) -> StreamEvent {
        StreamEvent::TextDelta {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_replace_at_out_of_range() {
        let mut transcript = Transcript::new();
        assert!(!transcript.replace_at(0, ChatMessage::user("x")));
        let index = transcript.push(ChatMessage::user("x"));
        assert!(transcript.replace_at(index, ChatMessage::user("y")));
        assert_eq!(transcript.get(0).unwrap().context, "y");
    }

    #[test]
    fn test_begin_exchange_rejects_blank_and_concurrent() {
        let mut state = ChatState::new();
        assert_eq!(state.begin_exchange("   "), None);
        assert_eq!(state.begin_exchange(" hello "), Some(1));
        assert_eq!(state.transcript.get(0).unwrap().context, "hello");
        assert!(state.is_typing);
        assert_eq!(state.begin_exchange("again"), None);
        assert_eq!(state.transcript.len(), 2);
    }

    #[test]
    fn test_stream_events_build_reply() {
        let mut state = ChatState::new();
        state.begin_exchange("where is the Yangtze?");

        state.emit(StreamEvent::SessionAssigned {
            session_id: "s1".to_string(),
        });
        state.emit(StreamEvent::MessageAssigned {
            message_id: "m42".to_string(),
        });
        state.emit(delta("In "));
        state.emit(delta("China."));
        state.emit(StreamEvent::Finished);

        let reply = state.current_reply().unwrap();
        assert_eq!(reply.id, "m42");
        assert_eq!(reply.context, "In China.");
        assert_eq!(reply.role, MessageRole::Assistant);
        assert_eq!(state.session_id.as_deref(), Some("s1"));
        assert!(state.sessions_stale);
        assert!(!state.is_typing);
    }

    #[test]
    fn test_existing_session_not_overridden() {
        let mut state = ChatState::new();
        state.load_history("s1", Vec::new());
        state.begin_exchange("more");
        state.emit(StreamEvent::SessionAssigned {
            session_id: "s2".to_string(),
        });
        assert_eq!(state.session_id.as_deref(), Some("s1"));
        assert!(!state.sessions_stale);
    }

    #[test]
    fn test_fail_exchange_appends_marker() {
        let mut state = ChatState::new();
        let index = state.begin_exchange("q").unwrap();
        state.emit(delta("partial"));
        state.fail_exchange();

        let reply = state.transcript.get(index).unwrap();
        assert_eq!(reply.context, format!("partial{}", STREAM_FAILED_MARKER));
        assert!(!state.is_typing);
        assert!(state.current_reply().is_none());
    }

    #[test]
    fn test_deltas_after_new_chat_are_dropped() {
        let mut state = ChatState::new();
        state.begin_exchange("q");
        state.new_chat();
        state.emit(delta("late"));
        assert!(state.transcript.is_empty());
    }

    #[test]
    fn test_forget_active_session() {
        let mut state = ChatState::new();
        state.load_history("s1", vec![ChatMessage::user("old")]);
        state.forget_session("other");
        assert_eq!(state.transcript.len(), 1);
        state.forget_session("s1");
        assert!(state.transcript.is_empty());
        assert!(state.session_id.is_none());
    }
}
