//! Text chunking for large documents
//!
//! Both chunkers measure lengths in Unicode scalar values and work on a
//! `Vec<char>`, so a cut never lands inside a multi-byte character.

use crate::config::ChunkStrategy;

const SENTENCE_ENDINGS: [char; 3] = ['.', '!', '?'];

/// Chunks text according to the specified strategy
#[derive(Debug, Clone)]
pub struct TextChunker {
    strategy: ChunkStrategy,
    chunk_size: usize,
    overlap_size: usize,
}

impl TextChunker {
    /// Create a new text chunker; overlap only applies to [`ChunkStrategy::PyG`]
    pub fn new(strategy: ChunkStrategy, chunk_size: usize, overlap_size: usize) -> Self {
        Self {
            strategy,
            chunk_size: chunk_size.max(1),
            overlap_size,
        }
    }

    /// Chunk the given text
    pub fn chunk(&self, text: &str) -> Vec<String> {
        match self.strategy {
            ChunkStrategy::PyG => chunk_text_pyg(text, self.chunk_size, self.overlap_size),
            ChunkStrategy::Sentence => chunk_text(text, self.chunk_size),
        }
    }
}

/// Split point for the window `chars[start..end]`
///
/// Prefers the position just after the last sentence ending in the window,
/// swallowing one following whitespace character. If the character at the
/// split is an ASCII letter, backs off to the last space so words stay whole.
/// Falls back to `end` when neither applies.
fn find_split(chars: &[char], start: usize, end: usize) -> usize {
    let mut split = end;

    if let Some(offset) = chars[start..end]
        .iter()
        .rposition(|c| SENTENCE_ENDINGS.contains(c))
    {
        let after = start + offset + 1;
        let has_space = chars.get(after).is_some_and(|c| c.is_whitespace());
        split = after + usize::from(has_space);
    }

    if chars.get(split).is_some_and(|c| c.is_ascii_alphabetic()) {
        let window_end = split.min(chars.len());
        if let Some(space) = chars[start..window_end].iter().rposition(|c| *c == ' ') {
            split = start + space;
        }
    }

    // A split that makes no progress would loop forever
    if split <= start {
        end
    } else {
        split
    }
}

fn trimmed(chars: &[char]) -> Option<String> {
    let s: String = chars.iter().collect();
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// Fixed-window chunker with optional overlap
///
/// Each chunk holds at most `chunk_size` characters after trimming. Without
/// overlap the next chunk starts at the split point (leading whitespace
/// skipped). With overlap the next chunk starts `max(1, chunk_size - overlap)`
/// characters after the previous *start*, so boundary content repeats and the
/// caller has to deduplicate downstream.
///
/// # Examples
///
/// ```
/// use txt2kg_extractor::chunk_text_pyg;
///
/// let chunks = chunk_text_pyg("One. Two. Three.", 10, 0);
/// assert_eq!(chunks, vec!["One. Two.", "Three."]);
/// ```
pub fn chunk_text_pyg(text: &str, chunk_size: usize, overlap_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());

        if end >= chars.len() {
            chunks.extend(trimmed(&chars[start..]));
            break;
        }

        let split = find_split(&chars, start, end);
        chunks.extend(trimmed(&chars[start..split.min(chars.len())]));

        if overlap_size == 0 {
            start = split;
            while start < chars.len() && chars[start].is_whitespace() {
                start += 1;
            }
        } else {
            start += chunk_size.saturating_sub(overlap_size).max(1);
        }
    }

    chunks
}

/// Sentence chunker for long-context models
///
/// Repeatedly takes up to `chunk_size` characters of the remaining text,
/// splits at the last sentence end with the same word protection as
/// [`chunk_text_pyg`], and continues with the trimmed remainder. No overlap.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut remaining: Vec<char> = text.trim().chars().collect();

    while !remaining.is_empty() {
        if remaining.len() <= chunk_size {
            chunks.extend(trimmed(&remaining));
            break;
        }

        let split = find_split(&remaining, 0, chunk_size).min(remaining.len());
        chunks.extend(trimmed(&remaining[..split]));

        let rest: String = remaining[split..].iter().collect();
        remaining = rest.trim().chars().collect();
    }

    chunks
}
