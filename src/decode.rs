//! Streaming decoder for worker pipe output.
//!
//! winfr writes UTF-16LE to both stdout and stderr, and pipe reads land on
//! arbitrary byte boundaries: a read may end mid code unit and mid line.
//! The decoder carries the odd trailing byte between reads and only emits
//! complete lines; whatever is left at EOF is flushed as a final line.

use encoding_rs::UTF_16LE;

/// Text encoding of the worker's pipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    /// winfr's native encoding.
    Utf16Le,
    /// Plain UTF-8, for workers (and test fakes) that emit it.
    Utf8,
}

/// Incremental byte-stream to line converter.
#[derive(Debug)]
pub struct LineDecoder {
    encoding: OutputEncoding,
    /// Trailing byte of an incomplete UTF-16 code unit.
    carry: Vec<u8>,
    /// Decoded text still waiting for its newline.
    pending: String,
}

impl LineDecoder {
    pub fn new(encoding: OutputEncoding) -> Self {
        Self {
            encoding,
            carry: Vec::new(),
            pending: String::new(),
        }
    }

    /// Feed one read's worth of bytes and collect the complete lines it
    /// finishes. Line terminators are stripped; empty lines are dropped.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let text = self.decode(bytes);
        self.pending.push_str(&text);
        self.drain_lines()
    }

    /// Flush the final unterminated line, if any.
    pub fn finish(&mut self) -> Option<String> {
        if !self.carry.is_empty() {
            // A lone dangling byte cannot form a code unit; decode what we
            // can and drop the remainder.
            let carry = std::mem::take(&mut self.carry);
            let (decoded, _, _) = UTF_16LE.decode(&carry);
            self.pending.push_str(&decoded);
        }
        let rest = std::mem::take(&mut self.pending);
        let trimmed = rest.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn decode(&mut self, bytes: &[u8]) -> String {
        match self.encoding {
            OutputEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            OutputEncoding::Utf16Le => {
                let mut buffer = std::mem::take(&mut self.carry);
                buffer.extend_from_slice(bytes);

                // UTF-16LE code units are two bytes; hold back an odd tail.
                if buffer.len() % 2 != 0 {
                    if let Some(tail) = buffer.pop() {
                        self.carry = vec![tail];
                    }
                }
                if buffer.is_empty() {
                    return String::new();
                }
                let (decoded, _, _) = UTF_16LE.decode(&buffer);
                decoded.into_owned()
            }
        }
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
        lines
    }
}
