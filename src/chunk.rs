//! Line-boundary text chunker.
//!
//! Splits the combined slide text into ordered segments that respect a
//! configurable `max_size` character budget. When a window has to be cut,
//! the cut prefers the last newline in the window so a chunk never ends
//! mid-line; a hard cut at the limit is the fallback.
//!
//! Concatenating the returned chunks in order reproduces the input exactly.

/// A newline only wins over a hard cut when it lies strictly beyond this
/// many bytes into the window; closer newlines would produce tiny chunks.
const MIN_BREAK_OFFSET: usize = 100;

/// Split `text` into ordered chunks of at most `max_size` bytes.
///
/// Fast path: input that fits the budget is returned as a single chunk.
/// Otherwise each window `[start, start + max_size)` is shortened to end at
/// the last newline found strictly after `start + 100`, if any; the newline
/// itself starts the next chunk. A hard cut backs up to the nearest UTF-8
/// boundary, so a chunk may be a few bytes short of `max_size`.
///
/// Empty input yields a single empty chunk; no other chunk is ever empty.
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    if text.len() <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_size).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            // A single code point wider than the budget is emitted whole.
            end = (start + 1..text.len())
                .find(|&i| text.is_char_boundary(i))
                .unwrap_or(text.len());
        }

        if end < text.len() {
            if let Some(pos) = text[start..end].rfind('\n') {
                let newline = start + pos;
                if newline > start + MIN_BREAK_OFFSET {
                    end = newline;
                }
            }
        }

        chunks.push(text[start..end].to_string());
        start = end;
    }

    chunks
}
