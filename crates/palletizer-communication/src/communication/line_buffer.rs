//! Newline framing of the inbound byte stream

/// Accumulates raw bytes and yields complete lines
///
/// Lines are decoded as UTF-8 with invalid sequences replaced, trimmed, and
/// dropped when empty. A trailing partial line is kept for the next push.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and return every line they complete
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim();
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
        lines
    }

    /// Bytes waiting for a newline
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_across_pushes() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"[FEEDBACK] ALL_SLA").is_empty());
        assert_eq!(buffer.pending_len(), 18);
        assert_eq!(
            buffer.push(b"VES_COMPLETED\r\n[SLAVE] x;OK\n"),
            vec!["[FEEDBACK] ALL_SLAVES_COMPLETED", "[SLAVE] x;OK"]
        );
        assert_eq!(buffer.pending_len(), 0);
    }

    #[test]
    fn test_blank_lines_dropped() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"\r\n\n  \n").is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut buffer = LineBuffer::new();
        let lines = buffer.push(b"ok\xff\n");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ok"));
    }
}
