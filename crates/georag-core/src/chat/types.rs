//! REST wire types for the chat API

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Status code the backend uses for success inside the JSON envelope
pub const API_SUCCESS: i64 = 200;

/// Standard response envelope: `{ code, msg, data, timestamp }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.code == API_SUCCESS
    }

    /// Unwrap the envelope, allowing an empty payload
    pub fn into_result(self) -> Result<Option<T>, ClientError> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(ClientError::Api {
                code: self.code,
                msg: self.msg,
            })
        }
    }

    /// Unwrap the envelope, requiring a payload
    pub fn into_data(self) -> Result<T, ClientError> {
        let code = self.code;
        self.into_result()?.ok_or_else(|| ClientError::Api {
            code,
            msg: "response carried no data".to_string(),
        })
    }
}

/// Paged listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult<T> {
    #[serde(default)]
    pub current: u64,
    #[serde(default)]
    pub pages: u64,
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub total: u64,
}

/// Conversation summary as listed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single chat message
///
/// The server names the body field `context`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub create_time: Option<String>,
}

fn default_category() -> String {
    "text".to_string()
}

impl ChatMessage {
    /// Locally created user message, shown before the server confirms it
    pub fn user(content: impl Into<String>) -> Self {
        Self::local("temp", MessageRole::User, content.into())
    }

    /// Empty assistant message that stream deltas are appended to
    pub fn assistant_placeholder() -> Self {
        Self::local("ai", MessageRole::Assistant, String::new())
    }

    fn local(prefix: &str, role: MessageRole, context: String) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: format!("{}-{}", prefix, now.timestamp_millis()),
            role,
            category: default_category(),
            context,
            create_time: Some(now.to_rfc3339()),
        }
    }
}

/// Body of `POST /api/v1/chat/completions`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSendRequest {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Body for session create / rename
#[derive(Debug, Clone, Serialize)]
pub struct SessionTitle {
    pub title: String,
}
