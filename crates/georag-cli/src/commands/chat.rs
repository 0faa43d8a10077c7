//! `georag chat` - stream one exchange to stdout

use std::io::Write;

use anyhow::{bail, Context, Result};
use clap::Args;
use georag_core::chat::{ChatState, STREAM_FAILED_MARKER};
use georag_core::stream::{
    drive, ChannelSink, DriveOutcome, EventSink, StreamAssembler, StreamEvent,
};
use georag_core::{ChatClient, Config};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Message to send
    pub message: String,

    /// Continue an existing session instead of starting a new one
    #[arg(long)]
    pub session: Option<String>,
}

pub async fn run(config: &Config, args: ChatArgs) -> Result<()> {
    let client = ChatClient::from_config(config)?;

    let mut state = ChatState::new();
    state.session_id = args.session;
    if state.begin_exchange(&args.message).is_none() {
        bail!("Message is empty");
    }

    let mut source = client
        .stream_completion(args.message.trim(), state.session_id.as_deref())
        .await
        .context("Failed to open completion stream")?;

    // Ctrl-C stops pulling chunks; whatever arrived so far is kept
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    // Printing happens off the read loop so slow terminals don't stall it
    let (mut sink, rx) = ChannelSink::channel();
    let printer = tokio::spawn(print_events(rx, state));

    let mut assembler = StreamAssembler::with_strategy(config.stream.split_strategy);
    let result = drive(&mut source, &mut assembler, &mut sink, &cancel).await;
    drop(sink);
    let mut state = printer.await.context("Output task failed")?;

    match result {
        Ok(DriveOutcome::Completed) => {
            if state.is_typing {
                warn!("Stream ended without a finish signal");
            }
            state.end_exchange();
            println!();
        }
        Ok(DriveOutcome::Cancelled) => {
            state.end_exchange();
            eprintln!("\n[cancelled]");
        }
        Err(e) => {
            state.fail_exchange();
            println!("{}", STREAM_FAILED_MARKER);
            return Err(e).context("Stream processing failed");
        }
    }

    let stats = assembler.stats();
    info!(
        "Exchange complete: {} bytes, {} records, {} skipped",
        stats.bytes_received, stats.records_parsed, stats.fragments_skipped
    );
    Ok(())
}

async fn print_events(
    mut rx: mpsc::UnboundedReceiver<StreamEvent>,
    mut state: ChatState,
) -> ChatState {
    let mut stdout = std::io::stdout();
    while let Some(event) = rx.recv().await {
        match &event {
            StreamEvent::TextDelta { text } => {
                if write!(stdout, "{}", text).and_then(|_| stdout.flush()).is_err() {
                    warn!("Failed to write to stdout");
                }
            }
            StreamEvent::SessionAssigned { session_id } => {
                eprintln!("[session {}]", session_id);
            }
            _ => {}
        }
        state.emit(event);
    }
    state
}
