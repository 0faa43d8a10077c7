//! Chat completion stream processing
//!
//! Byte chunks from the completions endpoint flow through
//! [`Utf8StreamDecoder`] into [`StreamAssembler`], which emits
//! [`StreamEvent`]s to an [`EventSink`].

pub mod assembler;
pub mod decoder;
pub mod source;
pub mod splitter;
pub mod types;

pub use assembler::StreamAssembler;
pub use decoder::Utf8StreamDecoder;
pub use source::{drive, ByteSource, ChannelSink, ChunkSource, DriveOutcome, EventSink};
pub use splitter::SplitStrategy;
pub use types::{AssemblerStats, StreamEvent, WireRecord};
