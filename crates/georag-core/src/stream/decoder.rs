//! Incremental UTF-8 decoding across chunk boundaries
//!
//! Transport chunks can split a multi-byte character anywhere. The decoder
//! holds back an incomplete trailing sequence until the next chunk arrives.
//! Invalid bytes become U+FFFD instead of failing the stream. A single
//! byte order mark at the very start of the stream is dropped.

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Stateful UTF-8 decoder carrying partial sequences between calls
#[derive(Debug, Default, Clone)]
pub struct Utf8StreamDecoder {
    /// Incomplete trailing sequence from the previous chunk (at most 3 bytes)
    carry: Vec<u8>,
    /// Set once the stream start has been checked for a BOM
    bom_checked: bool,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, returning every character that is complete so far
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        if !self.bom_checked {
            let mut head = std::mem::take(&mut self.carry);
            head.extend_from_slice(chunk);
            if head.len() < BOM.len() && BOM.starts_with(&head) {
                // Could still be a BOM split across chunks
                self.carry = head;
                return String::new();
            }

            self.bom_checked = true;
            let body = head.strip_prefix(BOM).unwrap_or(&head[..]);
            return self.decode_buf(body);
        }

        if self.carry.is_empty() {
            return self.decode_buf(chunk);
        }

        let mut joined = std::mem::take(&mut self.carry);
        joined.extend_from_slice(chunk);
        self.decode_buf(&joined)
    }

    /// Flush at end of stream
    ///
    /// A dangling partial sequence is reported as a single replacement char.
    pub fn finish(&mut self) -> String {
        if self.carry.is_empty() {
            String::new()
        } else {
            self.carry.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }

    /// Bytes currently held back waiting for the rest of a character
    pub fn pending_bytes(&self) -> usize {
        self.carry.len()
    }

    fn decode_buf(&mut self, mut input: &[u8]) -> String {
        let mut out = String::with_capacity(input.len());

        loop {
            match std::str::from_utf8(input) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    if let Ok(prefix) = std::str::from_utf8(valid) {
                        out.push_str(prefix);
                    }

                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[bad..];
                        }
                        None => {
                            // Incomplete sequence at the very end: wait for more bytes
                            self.carry.extend_from_slice(rest);
                            break;
                        }
                    }
                }
            }
        }

        out
    }
}
