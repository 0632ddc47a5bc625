use anyhow::Result;
use std::collections::VecDeque;

/// Byte buffer that yields complete `\n`-terminated lines.
///
/// Reads from the network rarely line up with line boundaries, so bytes are
/// held until a newline arrives. UTF-8 is only validated per complete line,
/// which keeps multi-byte characters split across reads intact.
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
}

impl CircularLineBuffer {
    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Add bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract next line (up to \n) without its terminator.
    /// Returns None if no complete line is available
    pub fn next_line(&mut self) -> Option<Result<String>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        Some(decode_line(&line_bytes))
    }

    /// Drain whatever is left as a final unterminated line.
    /// Returns None when nothing is buffered.
    pub fn take_remaining(&mut self) -> Option<Result<String>> {
        if self.buffer.is_empty() {
            return None;
        }
        let line_bytes: Vec<u8> = self.buffer.drain(..).collect();
        Some(decode_line(&line_bytes))
    }

    /// Current buffer size
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

fn decode_line(bytes: &[u8]) -> Result<String> {
    let line = std::str::from_utf8(bytes)
        .map_err(|e| anyhow::anyhow!("Invalid UTF-8: {}", e))?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_buffer_basic() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        
        buffer.extend(b"line1\nline2\r\n");
        
        assert_eq!(buffer.next_line().unwrap().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "line2");
        assert!(buffer.next_line().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_partial_line() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        
        buffer.extend(b"partial");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.len(), 7);
        
        buffer.extend(b" line\n");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "partial line");
    }

    #[test]
    fn test_multibyte_char_split_across_reads() {
        let bytes = "café\n".as_bytes();
        let mut buffer = CircularLineBuffer::with_capacity(16);

        // 'é' is two bytes; split between them
        buffer.extend(&bytes[..4]);
        assert!(buffer.next_line().is_none());
        buffer.extend(&bytes[4..]);
        assert_eq!(buffer.next_line().unwrap().unwrap(), "café");
    }

    #[test]
    fn test_take_remaining() {
        let mut buffer = CircularLineBuffer::with_capacity(16);
        assert!(buffer.take_remaining().is_none());

        buffer.extend(b"tail");
        assert_eq!(buffer.take_remaining().unwrap().unwrap(), "tail");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_invalid_utf8_line_is_an_error() {
        let mut buffer = CircularLineBuffer::with_capacity(16);
        buffer.extend(&[0xff, 0xfe, b'\n', b'o', b'k', b'\n']);

        assert!(buffer.next_line().unwrap().is_err());
        assert_eq!(buffer.next_line().unwrap().unwrap(), "ok");
    }
}
