//! Byte sources, event sinks and the read loop that connects them
//!
//! The assembler itself is synchronous. `drive` pulls one chunk at a time
//! from a [`ByteSource`], feeds it, and hands the resulting events to an
//! [`EventSink`] before requesting the next chunk.

use std::collections::VecDeque;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::assembler::StreamAssembler;
use super::types::StreamEvent;
use crate::error::TransportError;

/// Pull-based chunk source
///
/// Yields zero or more chunks, then `Ok(None)` at end of stream, or an
/// error if the transport fails.
#[async_trait::async_trait]
pub trait ByteSource: Send {
    async fn read(&mut self) -> Result<Option<Bytes>, TransportError>;
}

/// Receiver of assembled stream events
///
/// Called inline from the read loop, so implementations should stay cheap
/// and queue heavy work elsewhere (see [`ChannelSink`]).
pub trait EventSink {
    fn emit(&mut self, event: StreamEvent);
}

impl EventSink for Vec<StreamEvent> {
    fn emit(&mut self, event: StreamEvent) {
        self.push(event);
    }
}

/// Sink forwarding events to a tokio channel for deferred processing
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<StreamEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink together with its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: StreamEvent) {
        if self.tx.send(event).is_err() {
            debug!("Event receiver dropped, discarding stream event");
        }
    }
}

/// In-memory source yielding pre-split chunks
///
/// Used for replaying recorded streams. Can simulate a transport failure
/// after a given number of chunks.
#[derive(Debug, Default)]
pub struct ChunkSource {
    chunks: VecDeque<Bytes>,
    fail_after: Option<usize>,
    served: usize,
}

impl ChunkSource {
    pub fn new<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            fail_after: None,
            served: 0,
        }
    }

    /// Split `data` into fixed-size chunks (a size of 0 is treated as 1)
    pub fn from_bytes(data: impl Into<Bytes>, chunk_size: usize) -> Self {
        let data: Bytes = data.into();
        let size = chunk_size.max(1);
        let chunks = (0..data.len())
            .step_by(size)
            .map(|start| data.slice(start..(start + size).min(data.len())));
        Self::new(chunks.collect::<Vec<_>>())
    }

    /// Fail with `TransportError::Interrupted` once `count` chunks were served
    pub fn fail_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }
}

#[async_trait::async_trait]
impl ByteSource for ChunkSource {
    async fn read(&mut self) -> Result<Option<Bytes>, TransportError> {
        if self.fail_after.is_some_and(|limit| self.served >= limit) {
            return Err(TransportError::Interrupted(format!(
                "connection dropped after {} chunks",
                self.served
            )));
        }
        self.served += 1;
        Ok(self.chunks.pop_front())
    }
}

/// How a read loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// Source reached end of stream and the assembler was closed
    Completed,
    /// Cancellation requested; remaining chunks were not read
    Cancelled,
}

/// Pump a source through the assembler into a sink
///
/// On transport failure the error is returned as-is and any partial line
/// stays unparsed inside `assembler`. Callers wanting a best-effort flush
/// may still call [`StreamAssembler::close`].
pub async fn drive<S, K>(
    source: &mut S,
    assembler: &mut StreamAssembler,
    sink: &mut K,
    cancel: &CancellationToken,
) -> Result<DriveOutcome, TransportError>
where
    S: ByteSource + ?Sized,
    K: EventSink + ?Sized,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Stream read loop cancelled");
                return Ok(DriveOutcome::Cancelled);
            }
            next = source.read() => next,
        };

        match next {
            Ok(Some(chunk)) => {
                for event in assembler.feed(&chunk) {
                    sink.emit(event);
                }
            }
            Ok(None) => {
                for event in assembler.close() {
                    sink.emit(event);
                }
                return Ok(DriveOutcome::Completed);
            }
            Err(e) => {
                warn!(
                    "Stream transport failed ({} chars pending discarded): {}",
                    assembler.pending().len(),
                    e
                );
                return Err(e);
            }
        }
    }
}
