//! Chunker: splits normalized text into overlapping windows, preferring
//! paragraph, then sentence, then hard character-boundary cuts.

use crate::types::ChunkerConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub index: u32,
    pub text: String,
    pub offset: usize,
}

pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Split `source` into overlapping chunks. Trailing chunks shorter
    /// than `minChunk` are dropped. Boundaries prefer paragraph breaks
    /// (`\n\n`), then sentence breaks (`. `), then a hard cut at
    /// `chunkSize`.
    pub fn chunk(&self, source: &str) -> Vec<TextChunk> {
        let chars: Vec<char> = source.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut index = 0u32;

        while start < chars.len() {
            let target_end = (start + self.config.chunk_size).min(chars.len());
            let end = if target_end >= chars.len() {
                chars.len()
            } else {
                find_boundary(&chars, start, target_end)
            };

            let text: String = chars[start..end].iter().collect();
            let trimmed = text.trim();

            if !trimmed.is_empty() && (end == chars.len() || trimmed.chars().count() >= self.config.min_chunk) {
                chunks.push(TextChunk {
                    index,
                    text: trimmed.to_string(),
                    offset: start,
                });
                index += 1;
            }

            if end >= chars.len() {
                break;
            }

            let next_start = end.saturating_sub(self.config.overlap);
            start = if next_start <= start { end } else { next_start };
        }

        chunks
    }
}

/// Find the best cut point in `[start, target_end]`: prefer a paragraph
/// break, then a sentence break, then the hard target boundary itself.
fn find_boundary(chars: &[char], start: usize, target_end: usize) -> usize {
    let window_start = start + (target_end - start) / 2;

    if let Some(pos) = find_last_pattern(chars, window_start, target_end, &['\n', '\n']) {
        return pos;
    }
    if let Some(pos) = find_last_sentence_break(chars, window_start, target_end) {
        return pos;
    }
    target_end
}

fn find_last_pattern(chars: &[char], from: usize, to: usize, pattern: &[char]) -> Option<usize> {
    if pattern.len() > to - from {
        return None;
    }
    let mut i = to.saturating_sub(pattern.len());
    while i >= from {
        if chars[i..i + pattern.len()] == *pattern {
            return Some(i + pattern.len());
        }
        if i == from {
            break;
        }
        i -= 1;
    }
    None
}

fn find_last_sentence_break(chars: &[char], from: usize, to: usize) -> Option<usize> {
    let mut i = to.min(chars.len()).saturating_sub(1);
    while i > from {
        if chars[i] == '.' && chars.get(i + 1) == Some(&' ') {
            return Some(i + 2);
        }
        i -= 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_reconstructs_source_minus_overlaps() {
        let config = ChunkerConfig::default().with_chunk_size(50).with_overlap(10);
        let chunker = Chunker::new(config);
        let source = "a".repeat(200);
        let chunks = chunker.chunk(&source);

        assert!(chunks.len() > 1);
        let mut reconstructed = String::new();
        for (i, c) in chunks.iter().enumerate() {
            if i == 0 {
                reconstructed.push_str(&c.text);
            } else {
                let overlap = config.overlap.min(c.text.len());
                reconstructed.push_str(&c.text[overlap..]);
            }
        }
        assert_eq!(reconstructed.chars().filter(|c| !c.is_whitespace()).count(), source.len());
    }

    #[test]
    fn prefers_paragraph_boundary() {
        let config = ChunkerConfig::default().with_chunk_size(20).with_overlap(0);
        let chunker = Chunker::new(config);
        let source = format!("{}\n\n{}", "a".repeat(15), "b".repeat(15));
        let chunks = chunker.chunk(&source);
        assert!(chunks[0].text.chars().all(|c| c == 'a'));
    }

    #[test]
    fn drops_trailing_chunk_under_min_size() {
        let config = ChunkerConfig::default().with_chunk_size(100).with_overlap(0);
        let chunker = Chunker::new(config);
        let source = format!("{}{}", "a".repeat(100), "b".repeat(5));
        let chunks = chunker.chunk(&source);
        assert!(chunks.iter().all(|c| !c.text.chars().all(|ch| ch == 'b')));
    }

    #[test]
    fn chunk_index_is_monotonic() {
        let chunker = Chunker::new(ChunkerConfig::default().with_chunk_size(30).with_overlap(5));
        let chunks = chunker.chunk(&"word ".repeat(50));
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i as u32);
        }
    }
}
