//! Incremental line decoder for response bodies.
//!
//! Chunks arrive with arbitrary boundaries: a line, or a multi-byte UTF-8
//! character, may be split across any number of chunks. The decoder keeps
//! undecoded bytes and unterminated text between calls and only ever hands
//! out complete logical lines, so the output is identical for every possible
//! chunking of the same byte stream.

/// Splits a byte stream into logical lines.
///
/// Lines end at `\n`; a single trailing `\r` is stripped so CRLF and LF may be
/// mixed freely. Invalid UTF-8 decodes to U+FFFD rather than failing.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes of an incomplete UTF-8 sequence at the end of the last chunk.
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a newline.
    carry: String,
    finished: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completes.
    ///
    /// After [`finish`](Self::finish) this is a no-op.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.finished {
            return Vec::new();
        }
        self.pending.extend_from_slice(chunk);
        self.decode_pending();
        self.drain_lines()
    }

    /// Signal end of stream and return the unterminated remainder, if any.
    ///
    /// Returns `Some` at most once.
    pub fn finish(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }
        self.finished = true;
        if !self.pending.is_empty() {
            // Truncated multi-byte sequence at end of stream.
            self.pending.clear();
            self.carry.push(char::REPLACEMENT_CHARACTER);
        }
        let mut rest = std::mem::take(&mut self.carry);
        if rest.ends_with('\r') {
            rest.pop();
        }
        if rest.is_empty() { None } else { Some(rest) }
    }

    /// Whether [`finish`](Self::finish) has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Move every complete UTF-8 character from `pending` into `carry`.
    fn decode_pending(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.carry.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    self.carry
                        .push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match err.error_len() {
                        Some(bad) => {
                            self.carry.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // Incomplete sequence: keep it for the next chunk.
                            self.pending.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(idx) = self.carry.find('\n') {
            let mut line: String = self.carry.drain(..=idx).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }
}
