//! Incremental SSE decoding for upstream `alt=sse` streams.

use bytes::BytesMut;

/// Accumulates raw bytes and yields complete `data:` payloads.
#[derive(Debug, Default)]
pub struct SseDataBuffer {
    buffer: BytesMut,
}

impl SseDataBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns every payload whose line is now complete.
    ///
    /// `[DONE]` sentinels and non-data fields are skipped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line_raw = self.buffer.split_to(pos + 1);
            if let Some(payload) = parse_data_line(&String::from_utf8_lossy(&line_raw)) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = self.buffer.split();
        parse_data_line(&String::from_utf8_lossy(&rest))
    }
}

fn parse_data_line(line: &str) -> Option<String> {
    let line = line.trim();
    let data = line.strip_prefix("data:")?.trim_start();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    Some(data.to_string())
}
