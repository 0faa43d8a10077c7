//! `georag sessions` - list, inspect, rename and delete sessions

use anyhow::{Context, Result};
use clap::Subcommand;
use georag_core::chat::{ChatMessage, ChatSession, MessageRole};
use georag_core::{ChatClient, Config};

#[derive(Debug, Subcommand)]
pub enum SessionsCommand {
    /// List sessions, newest first
    List {
        #[arg(long, default_value_t = 1)]
        page: u64,
        #[arg(long, default_value_t = 20)]
        size: u64,
    },
    /// Show the message history of a session
    Messages { session_id: String },
    /// Create an empty session
    Create { title: String },
    /// Change a session's title
    Rename { session_id: String, title: String },
    /// Delete a session
    Delete { session_id: String },
}

pub async fn run(config: &Config, command: SessionsCommand) -> Result<()> {
    let client = ChatClient::from_config(config)?;

    match command {
        SessionsCommand::List { page, size } => {
            let result = client
                .list_sessions(page, size)
                .await
                .context("Failed to load sessions")?;
            for session in &result.records {
                println!("{}", format_session(session));
            }
            eprintln!(
                "page {}/{} ({} sessions)",
                result.current, result.pages, result.total
            );
        }
        SessionsCommand::Messages { session_id } => {
            let messages = client
                .session_messages(&session_id)
                .await
                .with_context(|| format!("Failed to load messages for {}", session_id))?;
            for message in &messages {
                println!("{}\n", format_message(message));
            }
        }
        SessionsCommand::Create { title } => {
            let id = client
                .create_session(&title)
                .await
                .context("Failed to create session")?;
            println!("{}", id);
        }
        SessionsCommand::Rename { session_id, title } => {
            client
                .update_session_title(&session_id, &title)
                .await
                .with_context(|| format!("Failed to rename {}", session_id))?;
        }
        SessionsCommand::Delete { session_id } => {
            client
                .delete_session(&session_id)
                .await
                .with_context(|| format!("Failed to delete {}", session_id))?;
        }
    }

    Ok(())
}

fn format_session(session: &ChatSession) -> String {
    let updated = session
        .update_time
        .as_deref()
        .or(session.create_time.as_deref())
        .unwrap_or("-");
    let title = if session.title.trim().is_empty() {
        "New Chat"
    } else {
        session.title.as_str()
    };
    format!("{}\t{}\t{}", session.id, updated, title)
}

fn format_message(message: &ChatMessage) -> String {
    let role = match message.role {
        MessageRole::User => "you",
        MessageRole::Assistant => "assistant",
    };
    format!("[{}] {}", role, message.context)
}
