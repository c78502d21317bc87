//! Sentence-aligned text chunking.
//!
//! Text is split on runs of sentence-terminal punctuation (`.`, `!`, `?`);
//! the punctuation itself is dropped and each sentence is trimmed. Sentences
//! are then packed greedily, joined by a single space, into chunks of at most
//! `max_chunk_size` characters. A sentence is never split: one that is longer
//! than the maximum becomes a chunk on its own.
//!
//! With a non-zero `chunk_overlap`, trailing whole sentences of the previous
//! chunk (at most `chunk_overlap` characters in total) are repeated at the
//! start of the next chunk, but only when that still fits the size bound.

use crate::domain::{ChunkingConfig, DomainError};

#[derive(Debug, Clone)]
pub struct TextChunker {
    config: ChunkingConfig,
}

impl TextChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let max = self.config.max_chunk_size;
        let mut chunks = Vec::new();
        let mut buffer: Vec<&str> = Vec::new();
        let mut buffer_len = 0usize;

        for sentence in split_sentences(text) {
            let sentence_len = char_len(sentence);

            if !buffer.is_empty() && buffer_len + 1 + sentence_len > max {
                let carried = self.overlap_tail(&buffer, sentence_len);
                chunks.push(buffer.join(" "));
                buffer_len = joined_len(&carried);
                buffer = carried;
            }

            buffer_len = if buffer.is_empty() {
                sentence_len
            } else {
                buffer_len + 1 + sentence_len
            };
            buffer.push(sentence);
        }

        if !buffer.is_empty() {
            chunks.push(buffer.join(" "));
        }

        chunks
    }

    /// Trailing sentences of `buffer` to repeat before a sentence of
    /// `next_len` characters.
    fn overlap_tail<'a>(&self, buffer: &[&'a str], next_len: usize) -> Vec<&'a str> {
        let overlap = self.config.chunk_overlap;
        let max = self.config.max_chunk_size;
        if overlap == 0 {
            return Vec::new();
        }

        let mut tail = Vec::new();
        let mut tail_len = 0usize;
        for sentence in buffer.iter().rev() {
            let len = char_len(sentence);
            let candidate = if tail.is_empty() { len } else { tail_len + 1 + len };
            if candidate > overlap || candidate + 1 + next_len > max {
                break;
            }
            tail.push(*sentence);
            tail_len = candidate;
        }
        tail.reverse();
        tail
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            config: ChunkingConfig::default(),
        }
    }
}

/// Splits on runs of `.`, `!` and `?`, dropping blank fragments.
pub fn split_sentences(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.split(|c: char| matches!(c, '.' | '!' | '?'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn joined_len(parts: &[&str]) -> usize {
    if parts.is_empty() {
        return 0;
    }
    parts.iter().map(|p| char_len(p)).sum::<usize>() + parts.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(max: usize, overlap: usize) -> TextChunker {
        TextChunker::new(ChunkingConfig::new(max, overlap)).unwrap()
    }

    #[test]
    fn test_empty_and_blank_input_yield_no_chunks() {
        let chunker = TextChunker::default();

        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   ").is_empty());
        assert!(chunker.chunk(" ... !? \n").is_empty());
    }

    #[test]
    fn test_sentences_split_into_bounded_chunks() {
        let chunks = chunker(25, 0).chunk("Cats are mammals. Dogs are mammals too. The sky is blue.");

        assert_eq!(
            chunks,
            vec!["Cats are mammals", "Dogs are mammals too", "The sky is blue"]
        );
    }

    #[test]
    fn test_short_sentences_are_packed_together() {
        let chunks = chunker(1000, 200).chunk("One. Two! Three? Four");

        assert_eq!(chunks, vec!["One Two Three Four"]);
    }

    #[test]
    fn test_punctuation_runs_are_single_boundaries() {
        let chunks = chunker(5, 0).chunk("Wait...  What?!  Ok");

        assert_eq!(chunks, vec!["Wait", "What", "Ok"]);
    }

    #[test]
    fn test_oversized_sentence_is_emitted_whole() {
        let long = "a".repeat(60);
        let text = format!("Short one. {long}. Tail");
        let chunks = chunker(20, 0).chunk(&text);

        assert_eq!(chunks, vec!["Short one".to_string(), long, "Tail".to_string()]);
    }

    #[test]
    fn test_chunks_respect_size_bound() {
        let text = "Alpha beta gamma. Delta epsilon. Zeta eta theta iota. Kappa. \
                    Lambda mu nu xi omicron pi. Rho sigma tau. Upsilon phi chi psi omega.";
        let sentences: Vec<&str> = split_sentences(text).collect();
        for max in [10, 20, 35, 80] {
            for chunk in chunker(max, 0).chunk(text) {
                let single_sentence = sentences.contains(&chunk.as_str());
                assert!(
                    chunk.chars().count() <= max || single_sentence,
                    "chunk {chunk:?} exceeds {max}"
                );
            }
        }
    }

    #[test]
    fn test_non_overlapping_chunks_cover_every_sentence_once() {
        let text = "First point. Second point is longer! Third? Fourth point here. Fifth.";
        let chunks = chunker(30, 0).chunk(text);

        let rejoined: Vec<String> = chunks
            .iter()
            .flat_map(|c| split_sentences_words(c))
            .collect();
        let original: Vec<String> = split_sentences(text)
            .flat_map(|s| s.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .collect();
        assert_eq!(rejoined, original);
    }

    fn split_sentences_words(chunk: &str) -> Vec<String> {
        chunk.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_overlap_repeats_trailing_sentences_within_bound() {
        let chunks = chunker(30, 12).chunk("Aaaa bbbb. Cc dd. Eeee ffff gggg hhhh. Ii");

        assert_eq!(chunks, vec!["Aaaa bbbb Cc dd", "Cc dd Eeee ffff gggg hhhh Ii"]);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 30);
        }
    }

    #[test]
    fn test_overlap_skipped_when_it_would_break_bound() {
        let chunks = chunker(25, 20).chunk("Cats are mammals. Dogs are mammals too. The sky is blue.");

        assert_eq!(
            chunks,
            vec!["Cats are mammals", "Dogs are mammals too", "The sky is blue"]
        );
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let chunker = chunker(40, 10);
        let text = "Repeatable output. Every time. No hidden state between calls.";

        assert_eq!(chunker.chunk(text), chunker.chunk(text));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(TextChunker::new(ChunkingConfig::new(10, 10)).is_err());
    }
}
