//! Chat completion stream assembler
//!
//! Turns raw response-body chunks into typed [`StreamEvent`]s. Chunk
//! boundaries carry no meaning: bytes are decoded incrementally, buffered
//! until a newline completes a line, and only then parsed.

use tracing::{debug, info, warn};

use super::decoder::Utf8StreamDecoder;
use super::splitter::SplitStrategy;
use super::types::{AssemblerStats, StreamEvent, WireRecord};

/// Prefix tag optionally preceding each JSON payload
const DATA_PREFIX: &str = "data:";

/// Reassembles newline-delimited JSON frames from arbitrary byte chunks
#[derive(Debug, Default)]
pub struct StreamAssembler {
    /// Stateful decoder carrying split multi-byte characters
    decoder: Utf8StreamDecoder,
    /// Decoded text not yet terminated by a newline
    pending: String,
    /// Candidate splitting mode
    strategy: SplitStrategy,
    /// First session id seen in this stream
    session_id: Option<String>,
    /// First message id seen in this stream
    message_id: Option<String>,
    stats: AssemblerStats,
}

impl StreamAssembler {
    /// Create an assembler using the wire-compatible brace-boundary splitter
    pub fn new() -> Self {
        Self::with_strategy(SplitStrategy::default())
    }

    pub fn with_strategy(strategy: SplitStrategy) -> Self {
        info!("Stream assembler created (strategy={:?})", strategy);
        Self {
            strategy,
            ..Default::default()
        }
    }

    /// Feed one transport chunk, returning the events it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.stats.bytes_received += chunk.len();
        let text = self.decoder.decode(chunk);
        self.pending.push_str(&text);
        debug!(
            "Stream chunk received: {} bytes (total: {} bytes, pending: {} chars)",
            chunk.len(),
            self.stats.bytes_received,
            self.pending.len()
        );

        let mut events = Vec::new();
        let Some(last_newline) = self.pending.rfind('\n') else {
            return events;
        };

        // Everything after the last newline stays buffered; it may be
        // completed by a later chunk.
        let tail = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, tail);

        for line in complete.split('\n') {
            self.process_line(line, &mut events);
        }

        events
    }

    /// Signal end of stream
    ///
    /// Flushes the decoder and runs any unterminated final line through the
    /// normal pipeline. Never invents a `Finished` event.
    pub fn close(&mut self) -> Vec<StreamEvent> {
        let flushed = self.decoder.finish();
        self.pending.push_str(&flushed);

        let mut events = Vec::new();
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            debug!("Processing unterminated final line ({} chars)", line.len());
            self.process_line(&line, &mut events);
        }

        info!(
            "Stream assembler closed: {} bytes, {} lines, {} records, {} skipped",
            self.stats.bytes_received,
            self.stats.lines_processed,
            self.stats.records_parsed,
            self.stats.fragments_skipped
        );
        events
    }

    /// Text buffered while waiting for a newline
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Session id assigned by the server, if any arrived yet
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Assistant message id assigned by the server, if any arrived yet
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn strategy(&self) -> SplitStrategy {
        self.strategy
    }

    pub fn stats(&self) -> &AssemblerStats {
        &self.stats
    }

    fn process_line(&mut self, line: &str, events: &mut Vec<StreamEvent>) {
        let mut payload = line.trim();
        if payload.is_empty() {
            return;
        }
        self.stats.lines_processed += 1;

        if let Some(rest) = payload.strip_prefix(DATA_PREFIX) {
            payload = rest.trim();
        }

        for candidate in self.strategy.split(payload) {
            match WireRecord::parse(candidate) {
                Some(record) => {
                    self.stats.records_parsed += 1;
                    self.apply_record(record, events);
                }
                None => {
                    self.stats.fragments_skipped += 1;
                    warn!("Skipping unparseable stream fragment: {:?}", candidate);
                    events.push(StreamEvent::ParseSkipped {
                        raw_fragment: candidate.to_string(),
                    });
                }
            }
        }
    }

    /// Emit events for one record in fixed order: session, message, text, finish
    fn apply_record(&mut self, record: WireRecord, events: &mut Vec<StreamEvent>) {
        if let Some(session_id) = record.session_id.filter(|id| !id.is_empty()) {
            if self.session_id.is_none() {
                info!("Stream session assigned: {}", session_id);
                self.session_id = Some(session_id.clone());
                events.push(StreamEvent::SessionAssigned { session_id });
            }
        }

        if let Some(message_id) = record.message_id.filter(|id| !id.is_empty()) {
            if self.message_id.is_none() {
                debug!("  -> MessageAssigned: {}", message_id);
                self.message_id = Some(message_id.clone());
                events.push(StreamEvent::MessageAssigned { message_id });
            }
        }

        if let Some(text) = record.text {
            debug!("  -> TextDelta: {} chars", text.len());
            events.push(StreamEvent::TextDelta { text });
        }

        if record.finish {
            info!(
                "Stream finish received ({} records, {} bytes)",
                self.stats.records_parsed, self.stats.bytes_received
            );
            events.push(StreamEvent::Finished);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_delta(text: &str) -> StreamEvent {
        StreamEvent::TextDelta {
            text: text.to_string(),
        }
    }

    fn concat_text(events: &[StreamEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::TextDelta { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_concatenated_objects_on_one_line() {
        let mut assembler = StreamAssembler::new();
        let events = assembler.feed(b"{\"text\":\"A\"}{\"text\":\"B\"}\n");
        assert_eq!(events, vec![text_delta("A"), text_delta("B")]);
    }

    #[test]
    fn test_data_prefix_session_then_text() {
        let mut assembler = StreamAssembler::new();
        let mut events = assembler.feed(b"data: {\"sessionId\":\"s1\"}\n");
        events.extend(assembler.feed(b"data: {\"text\":\"hi\"}\n"));
        assert_eq!(
            events,
            vec![
                StreamEvent::SessionAssigned {
                    session_id: "s1".to_string()
                },
                text_delta("hi"),
            ]
        );
        assert_eq!(assembler.session_id(), Some("s1"));
    }

    #[test]
    fn test_data_prefix_without_space() {
        let mut assembler = StreamAssembler::new();
        let events = assembler.feed(b"data:{\"text\":\"x\"}\n\n");
        assert_eq!(events, vec![text_delta("x")]);
    }

    #[test]
    fn test_finish_only() {
        let mut assembler = StreamAssembler::new();
        let events = assembler.feed(b"{\"finish\":true}\n");
        assert_eq!(events, vec![StreamEvent::Finished]);
    }

    #[test]
    fn test_finish_false_emits_nothing() {
        let mut assembler = StreamAssembler::new();
        assert!(assembler.feed(b"{\"finish\":false}\n").is_empty());
    }

    #[test]
    fn test_malformed_line_skipped_and_processing_continues() {
        let mut assembler = StreamAssembler::new();
        let events = assembler.feed(b"not json\n{\"text\":\"ok\"}\n");
        assert_eq!(
            events,
            vec![
                StreamEvent::ParseSkipped {
                    raw_fragment: "not json".to_string()
                },
                text_delta("ok"),
            ]
        );
        assert_eq!(assembler.stats().fragments_skipped, 1);
        assert_eq!(assembler.stats().records_parsed, 1);
    }

    #[test]
    fn test_mid_line_split_matches_single_feed() {
        let input = b"data: {\"sessionId\":\"s9\",\"text\":\"Hel\"}\ndata: {\"text\":\"lo\",\"finish\":true}\n";

        let mut whole = StreamAssembler::new();
        let expected = whole.feed(input);

        for split in 0..=input.len() {
            let mut assembler = StreamAssembler::new();
            let mut events = assembler.feed(&input[..split]);
            events.extend(assembler.feed(&input[split..]));
            assert_eq!(events, expected, "split at {}", split);
            assert!(assembler.pending().is_empty());
        }
    }

    #[test]
    fn test_chunk_boundary_independence_byte_by_byte() {
        let input = "{\"text\":\"地\"}{\"text\":\"球\"}\r\ngarbage\n{\"text\":\"😀\"}\n".as_bytes();

        let mut whole = StreamAssembler::new();
        let expected = whole.feed(input);

        let mut assembler = StreamAssembler::new();
        let mut events = Vec::new();
        for byte in input {
            events.extend(assembler.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(events, expected);
        assert_eq!(concat_text(&events), "地球😀");
    }

    #[test]
    fn test_session_assigned_only_once() {
        let mut assembler = StreamAssembler::new();
        let events = assembler.feed(b"{\"sessionId\":\"s1\"}\n{\"sessionId\":\"s2\",\"text\":\"t\"}\n");
        assert_eq!(
            events,
            vec![
                StreamEvent::SessionAssigned {
                    session_id: "s1".to_string()
                },
                text_delta("t"),
            ]
        );
        assert_eq!(assembler.session_id(), Some("s1"));
    }

    #[test]
    fn test_single_record_fixed_event_order() {
        let mut assembler = StreamAssembler::new();
        let events = assembler
            .feed(b"{\"finish\":true,\"text\":\"\",\"messageId\":\"m1\",\"sessionId\":\"s1\"}\n");
        assert_eq!(
            events,
            vec![
                StreamEvent::SessionAssigned {
                    session_id: "s1".to_string()
                },
                StreamEvent::MessageAssigned {
                    message_id: "m1".to_string()
                },
                text_delta(""),
                StreamEvent::Finished,
            ]
        );
    }

    #[test]
    fn test_partial_line_waits_for_newline() {
        let mut assembler = StreamAssembler::new();
        assert!(assembler.feed(b"{\"text\":\"A\"}").is_empty());
        assert_eq!(assembler.pending(), "{\"text\":\"A\"}");
        assert_eq!(assembler.feed(b"\n"), vec![text_delta("A")]);
        assert_eq!(assembler.pending(), "");
    }

    #[test]
    fn test_close_empty_is_noop() {
        let mut assembler = StreamAssembler::new();
        assert!(assembler.close().is_empty());

        let mut assembler = StreamAssembler::new();
        assembler.feed(b"{\"text\":\"A\"}\n");
        assert!(assembler.close().is_empty());
    }

    #[test]
    fn test_close_parses_unterminated_line() {
        let mut assembler = StreamAssembler::new();
        assert!(assembler.feed(b"data: {\"text\":\"tail\"}").is_empty());
        assert_eq!(assembler.close(), vec![text_delta("tail")]);
        assert!(assembler.pending().is_empty());
    }

    #[test]
    fn test_close_does_not_invent_finish() {
        let mut assembler = StreamAssembler::new();
        let mut events = assembler.feed(b"{\"text\":\"A\"}\n{\"text\":");
        events.extend(assembler.close());
        assert_eq!(
            events,
            vec![
                text_delta("A"),
                StreamEvent::ParseSkipped {
                    raw_fragment: "{\"text\":".to_string()
                },
            ]
        );
        assert!(!events.contains(&StreamEvent::Finished));
    }

    #[test]
    fn test_invalid_bytes_substituted() {
        let mut assembler = StreamAssembler::new();
        let events = assembler.feed(b"{\"text\":\"a\xffb\"}\n");
        assert_eq!(events, vec![text_delta("a\u{fffd}b")]);
    }

    #[test]
    fn test_leading_bom_does_not_swallow_first_frame() {
        let mut assembler = StreamAssembler::new();
        assert_eq!(
            assembler.feed("\u{feff}data:{\"text\":\"A\"}\n".as_bytes()),
            vec![text_delta("A")]
        );

        let bytes = "\u{feff}data:{\"sessionId\":\"s1\",\"messageId\":\"m1\"}\n".as_bytes();
        let mut assembler = StreamAssembler::new();
        let mut events = Vec::new();
        for byte in bytes {
            events.extend(assembler.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(
            events,
            vec![
                StreamEvent::SessionAssigned {
                    session_id: "s1".to_string()
                },
                StreamEvent::MessageAssigned {
                    message_id: "m1".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_whitespace_lines_ignored() {
        let mut assembler = StreamAssembler::new();
        assert!(assembler.feed(b"\n   \n\r\n\t\n").is_empty());
        assert_eq!(assembler.stats().lines_processed, 0);
    }

    #[test]
    fn test_tokenizer_strategy_handles_braces_in_strings() {
        let line = b"{\"text\":\"a}{b\"}{\"text\":\"c\"}\n";

        let mut compat = StreamAssembler::new();
        let events = compat.feed(line);
        assert!(matches!(events[0], StreamEvent::ParseSkipped { .. }));

        let mut robust = StreamAssembler::with_strategy(SplitStrategy::Tokenizer);
        assert_eq!(robust.feed(line), vec![text_delta("a}{b"), text_delta("c")]);
    }
}
