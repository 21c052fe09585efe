//! Append-only run log.

use parking_lot::RwLock;
use serde::Serialize;

/// Log text from an offset onwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogChunk {
    pub text: String,
    /// Offset to pass on the next read.
    pub next_offset: usize,
}

/// Append-only text buffer shared between the stage readers and pollers.
///
/// Offsets are byte offsets into the full log. Text is only ever appended,
/// so an offset returned by `read_from` stays valid for the life of the run.
#[derive(Debug, Default)]
pub struct LogBuffer {
    text: RwLock<String>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `line` followed by a newline.
    pub fn append_line(&self, line: &str) {
        let mut text = self.text.write();
        text.push_str(line);
        text.push('\n');
    }

    /// Everything appended from `offset` on.
    ///
    /// An offset past the end yields an empty chunk; one inside a multi-byte
    /// character is moved forward to the next character boundary.
    pub fn read_from(&self, offset: usize) -> LogChunk {
        let text = self.text.read();
        let mut start = offset.min(text.len());
        while !text.is_char_boundary(start) {
            start += 1;
        }
        LogChunk {
            text: text[start..].to_string(),
            next_offset: text.len(),
        }
    }

    /// Full log text.
    pub fn contents(&self) -> String {
        self.text.read().clone()
    }

    pub fn len(&self) -> usize {
        self.text.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incremental_reads() {
        let log = LogBuffer::new();
        log.append_line("fetching AAPL");

        let first = log.read_from(0);
        assert_eq!(first.text, "fetching AAPL\n");

        log.append_line("fetching TCS.NS");
        let second = log.read_from(first.next_offset);
        assert_eq!(second.text, "fetching TCS.NS\n");
        assert_eq!(second.next_offset, log.len());

        let empty = log.read_from(second.next_offset);
        assert!(empty.text.is_empty());
    }

    #[test]
    fn test_offset_past_end() {
        let log = LogBuffer::new();
        log.append_line("abc");
        let chunk = log.read_from(100);
        assert!(chunk.text.is_empty());
        assert_eq!(chunk.next_offset, 4);
    }

    #[test]
    fn test_offset_inside_multibyte_char() {
        let log = LogBuffer::new();
        log.append_line("₹100");
        // '₹' is three bytes; offset 1 lands inside it.
        let chunk = log.read_from(1);
        assert_eq!(chunk.text, "100\n");
    }

    #[test]
    fn test_contents() {
        let log = LogBuffer::new();
        assert!(log.is_empty());
        log.append_line("a");
        log.append_line("b");
        assert_eq!(log.contents(), "a\nb\n");
    }
}
