//! # Description Chunking
//!
//! Splits long event descriptions into overlapping windows for embedding.
//!
//! The splitter works recursively over a list of separators, from paragraph
//! breaks down to single characters. A piece that still exceeds the target
//! size is split again with the next separator; smaller pieces are merged
//! back into windows of at most `target_chunk_size` characters, carrying up
//! to `overlap_size` characters of trailing context into the next window.
//!
//! All sizes are counted in characters, never bytes.

use std::collections::VecDeque;
use tracing::{debug, instrument};

/// Separators tried in order; the empty string splits into characters
const SEPARATORS: [&str; 7] = ["\n\n", "\n", ". ", "! ", "? ", " ", ""];

/// Configuration for chunking text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Maximum size of each chunk in characters
    pub target_chunk_size: usize,

    /// Size of overlap between consecutive chunks in characters
    pub overlap_size: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            target_chunk_size: 1200,
            overlap_size: 150,
        }
    }
}

impl ChunkOptions {
    fn target(&self) -> usize {
        self.target_chunk_size.max(1)
    }

    fn overlap(&self) -> usize {
        self.overlap_size.min(self.target() - 1)
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` into trimmed, non-empty, overlapping chunks
#[instrument(skip(text), fields(len = text.len()))]
pub fn chunk_text(text: &str, options: &ChunkOptions) -> Vec<String> {
    let chunks = split_recursive(text, &SEPARATORS, options);
    debug!("Split text into {} chunks", chunks.len());
    chunks
}

fn split_recursive(text: &str, separators: &[&str], options: &ChunkOptions) -> Vec<String> {
    let index = separators
        .iter()
        .position(|sep| sep.is_empty() || text.contains(sep))
        .unwrap_or(separators.len().saturating_sub(1));
    let separator = separators.get(index).copied().unwrap_or("");
    let remaining = separators.get(index + 1..).unwrap_or(&[]);

    let mut chunks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for piece in split_keeping_separator(text, separator) {
        if char_len(piece) < options.target() {
            pending.push(piece);
            continue;
        }

        if !pending.is_empty() {
            chunks.extend(merge_pieces(&pending, options));
            pending.clear();
        }

        if remaining.is_empty() {
            let piece = piece.trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }
        } else {
            chunks.extend(split_recursive(piece, remaining, options));
        }
    }

    if !pending.is_empty() {
        chunks.extend(merge_pieces(&pending, options));
    }

    chunks
}

/// Split after every occurrence of `separator`, keeping it on the left piece
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }
    text.split_inclusive(separator)
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Merge small pieces into windows, carrying overlap between windows
fn merge_pieces(pieces: &[&str], options: &ChunkOptions) -> Vec<String> {
    let target = options.target();
    let overlap = options.overlap();

    let mut windows = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0;

    for &piece in pieces {
        let len = char_len(piece);

        if total + len > target && !window.is_empty() {
            push_window(&mut windows, &window);

            while total > overlap || (total + len > target && total > 0) {
                let Some(front) = window.pop_front() else {
                    break;
                };
                total -= char_len(front);
            }
        }

        window.push_back(piece);
        total += len;
    }

    push_window(&mut windows, &window);
    windows
}

fn push_window(windows: &mut Vec<String>, window: &VecDeque<&str>) {
    let text = window.iter().copied().collect::<String>();
    let text = text.trim();
    if !text.is_empty() {
        windows.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences(n: usize) -> String {
        (0..n)
            .map(|i| format!("Sentence number {i} talks about Rust."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = chunk_text("  Krótki opis wydarzenia.  ", &ChunkOptions::default());
        assert_eq!(chunks, vec!["Krótki opis wydarzenia."]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(chunk_text("", &ChunkOptions::default()).is_empty());
        assert!(chunk_text("   ", &ChunkOptions::default()).is_empty());
    }

    #[test]
    fn test_windows_respect_target_and_overlap() {
        let options = ChunkOptions {
            target_chunk_size: 200,
            overlap_size: 60,
        };
        let chunks = chunk_text(&sentences(40), &options);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 200, "chunk too long: {}", chunk);
            assert!(chunk.starts_with("Sentence"));
        }
        for pair in chunks.windows(2) {
            let head = &pair[1][..pair[1].find('.').unwrap()];
            assert!(pair[0].contains(head), "no overlap between {:?}", pair);
        }
    }

    #[test]
    fn test_default_options_on_long_description() {
        let text = sentences(200);
        let chunks = chunk_text(&text, &ChunkOptions::default());

        assert!(chunks.len() >= 6);
        assert!(chunks.iter().all(|c| char_len(c) <= 1200));
        assert!(chunks[0].starts_with("Sentence number 0 "));
        assert!(chunks.last().unwrap().ends_with("Sentence number 199 talks about Rust."));
    }

    #[test]
    fn test_long_word_falls_back_to_characters() {
        let options = ChunkOptions {
            target_chunk_size: 10,
            overlap_size: 2,
        };
        let chunks = chunk_text(&"ż".repeat(25), &options);

        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| char_len(c) <= 10));
        let total: usize = chunks.iter().map(|c| char_len(c)).sum();
        assert!(total >= 25);
    }

    #[test]
    fn test_paragraphs_are_preferred_split_points() {
        let options = ChunkOptions {
            target_chunk_size: 50,
            overlap_size: 0,
        };
        let text = "Pierwszy akapit o konferencji.\n\nDrugi akapit o prelegentach.";
        let chunks = chunk_text(text, &options);
        assert_eq!(
            chunks,
            vec!["Pierwszy akapit o konferencji.", "Drugi akapit o prelegentach."]
        );
    }
}
