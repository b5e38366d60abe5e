//! Seam removal between a truncated answer and its continuation.

/// Char count of the longest suffix of `prev` (at most `max_chars`) that
/// equals a prefix of `next`.
pub fn find_overlap(prev: &str, next: &str, max_chars: usize) -> usize {
    let tail: Vec<char> = {
        let chars: Vec<char> = prev.chars().collect();
        let start = chars.len().saturating_sub(max_chars);
        chars[start..].to_vec()
    };
    let head: Vec<char> = next.chars().take(max_chars).collect();
    let limit = tail.len().min(head.len());
    (1..=limit).rev().find(|&n| tail[tail.len() - n..] == head[..n]).unwrap_or(0)
}

/// `next` with its overlap against `prev` removed, when the overlap is at
/// least `min_chars` long.
pub fn trim_overlap<'a>(prev: &str, next: &'a str, min_chars: usize, max_chars: usize) -> &'a str {
    let overlap = find_overlap(prev, next, max_chars);
    if overlap == 0 || overlap < min_chars {
        return next;
    }
    let byte_offset = next.char_indices().nth(overlap).map_or(next.len(), |(i, _)| i);
    tracing::debug!("✂️ Trimmed {} overlapping chars from continuation", overlap);
    &next[byte_offset..]
}

/// Streaming counterpart of [`trim_overlap`]: holds the head of a
/// continuation until enough of it is known to decide the seam.
#[derive(Debug)]
pub struct HeadSplicer {
    prev_tail: String,
    buffer: String,
    released: bool,
    min_chars: usize,
    max_chars: usize,
}

impl HeadSplicer {
    pub fn new(prev: &str, min_chars: usize, max_chars: usize) -> Self {
        let count = prev.chars().count();
        let prev_tail: String = prev.chars().skip(count.saturating_sub(max_chars)).collect();
        Self { prev_tail, buffer: String::new(), released: false, min_chars, max_chars }
    }

    pub fn push(&mut self, text: &str) -> String {
        if self.released {
            return text.to_string();
        }
        self.buffer.push_str(text);
        if self.buffer.chars().count() < self.max_chars {
            return String::new();
        }
        self.release()
    }

    /// Decide with whatever has arrived.
    pub fn finish(&mut self) -> String {
        if self.released {
            return String::new();
        }
        self.release()
    }

    fn release(&mut self) -> String {
        self.released = true;
        let buffered = std::mem::take(&mut self.buffer);
        trim_overlap(&self.prev_tail, &buffered, self.min_chars, self.max_chars).to_string()
    }
}
