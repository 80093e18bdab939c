//! Fixed-size overlapping windows over normalized document text

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use polex_domain::Chunk;
use regex::Regex;
use std::sync::LazyLock;

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank-run pattern is valid"));

/// Collapse runs of three or more newlines to two and trim the ends
pub fn normalize(text: &str) -> String {
    BLANK_RUNS.replace_all(text, "\n\n").trim().to_string()
}

/// Splits text into windows of `max_chars` characters, each starting
/// `max_chars - overlap` characters after the previous one
///
/// A window is only started while the previous one stops short of the end,
/// so text of at most `max_chars` characters is always a single chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    max_chars: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::Config`] unless `overlap < max_chars`.
    pub fn new(max_chars: usize, overlap: usize) -> Result<Self, ExtractorError> {
        if overlap >= max_chars {
            return Err(ExtractorError::Config(format!(
                "overlap ({}) must be less than max_chars ({})",
                overlap, max_chars
            )));
        }
        Ok(Self { max_chars, overlap })
    }

    /// Chunker using the window settings of `config`
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractorError> {
        Self::new(config.max_chunk_chars, config.chunk_overlap)
    }

    /// Window size in characters
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Shared characters between neighbours
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Normalize `text` and split it into windows
    ///
    /// Offsets refer to the normalized text. Empty (or whitespace-only) input
    /// yields no chunks.
    ///
    /// # Examples
    ///
    /// ```
    /// use polex_extractor::TextChunker;
    ///
    /// let chunker = TextChunker::new(4, 1).unwrap();
    /// let chunks = chunker.chunk("abcdefg");
    /// let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    /// assert_eq!(texts, ["abcd", "defg"]);
    /// ```
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let text = normalize(text);

        // Byte offset of every char, plus the end of the string
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = bounds.len() - 1;
        let step = self.max_chars - self.overlap;

        (0..total)
            .step_by(step)
            .take_while(|&start| start == 0 || start + self.overlap < total)
            .enumerate()
            .map(|(index, start)| {
                let end = (start + self.max_chars).min(total);
                Chunk::new(index, start, &text[bounds[start]..bounds[end]])
            })
            .collect()
    }
}

/// Split `text` into overlapping windows
///
/// Shorthand for `TextChunker::new(max_chars, overlap)?.chunk(text)`.
pub fn chunk(text: &str, max_chars: usize, overlap: usize) -> Result<Vec<Chunk>, ExtractorError> {
    Ok(TextChunker::new(max_chars, overlap)?.chunk(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Rebuild the source by dropping, from each chunk, the characters already
    /// covered by its predecessor
    fn stitch(chunks: &[Chunk]) -> String {
        let mut out = String::new();
        let mut covered: usize = 0;
        for chunk in chunks {
            let skip = covered.saturating_sub(chunk.start);
            out.extend(chunk.text.chars().skip(skip));
            covered = covered.max(chunk.end());
        }
        out
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk("", 100, 10).unwrap().is_empty());
        assert!(chunk("  \n\n\n  ", 100, 10).unwrap().is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk("  Short text here.\n", 100, 10).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Short text here.");
        assert_eq!(chunks[0].start, 0);
    }

    #[test]
    fn test_invalid_overlap_is_config_error() {
        assert!(matches!(chunk("abc", 10, 10), Err(ExtractorError::Config(_))));
        assert!(matches!(chunk("abc", 10, 11), Err(ExtractorError::Config(_))));
        assert!(matches!(chunk("abc", 0, 0), Err(ExtractorError::Config(_))));
    }

    #[test]
    fn test_windows_advance_by_step() {
        let chunks = chunk(&"x".repeat(10), 6, 2).unwrap();
        let starts: Vec<usize> = chunks.iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![0, 4]);
        assert_eq!(chunks[0].len, 6);
        assert_eq!(chunks[1].len, 6);
        assert_eq!(chunks[1].end(), 10);
        assert_eq!(chunks.iter().map(|c| c.index).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_no_tail_chunk_inside_previous_window() {
        // 71 chars fit one 80-char window even though 71 > 80 - 10
        let chunks = chunk(&"a".repeat(71), 80, 10).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len, 71);

        let chunks = chunk(&"x".repeat(3_750), 4_000, 300).unwrap();
        assert_eq!(chunks.len(), 1);

        // The last window ends exactly at the end of the text
        let chunks = chunk(&"x".repeat(4_001), 4_000, 300).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].start, 3_700);
        assert_eq!(chunks[1].end(), 4_001);
    }

    #[test]
    fn test_zero_overlap_windows_touch() {
        let chunks = chunk(&"x".repeat(10), 4, 0).unwrap();
        let starts: Vec<usize> = chunks.iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![0, 4, 8]);
        assert_eq!(chunks[0].end(), chunks[1].start);
        assert_eq!(chunks[2].len, 2);
    }

    #[test]
    fn test_blank_line_runs_are_collapsed() {
        let chunks = chunk("a\n\n\n\n\nb\n\nc", 100, 0).unwrap();
        assert_eq!(chunks[0].text, "a\n\nb\n\nc");
    }

    #[test]
    fn test_multibyte_text_is_split_on_char_boundaries() {
        let text = "港幣一千萬元資助計劃";
        let chunks = chunk(text, 4, 1).unwrap();
        assert_eq!(chunks[0].text, "港幣一千");
        assert_eq!(chunks[1].text, "千萬元資");
        assert_eq!(stitch(&chunks), text);
    }

    #[test]
    fn test_from_config() {
        let chunker = TextChunker::from_config(&ExtractorConfig::default()).unwrap();
        assert_eq!(chunker.max_chars(), 4_000);
        assert_eq!(chunker.overlap(), 300);
    }

    proptest! {
        #[test]
        fn prop_chunks_stitch_back_to_normalized_text(
            text in "[a-z \n]{1,400}",
            max_chars in 1usize..60,
            overlap_seed in 0usize..60,
        ) {
            let overlap = overlap_seed % max_chars;
            let chunks = chunk(&text, max_chars, overlap).unwrap();
            prop_assert_eq!(stitch(&chunks), normalize(&text));
        }

        #[test]
        fn prop_neighbours_overlap_and_respect_window(
            text in "[a-zé]{1,300}",
            max_chars in 2usize..50,
            overlap_seed in 0usize..50,
        ) {
            let overlap = overlap_seed % max_chars;
            let chunks = chunk(&text, max_chars, overlap).unwrap();
            for c in &chunks {
                prop_assert!(c.len <= max_chars);
                prop_assert!(!c.is_empty());
            }
            for pair in chunks.windows(2) {
                // Every window followed by another one is full width
                prop_assert_eq!(pair[0].len, max_chars);
                prop_assert_eq!(pair[0].end() - pair[1].start, overlap);
                prop_assert_eq!(pair[1].start - pair[0].start, max_chars - overlap);
                prop_assert!(pair[1].end() > pair[0].end());
            }
            if let Some(last) = chunks.last() {
                prop_assert_eq!(last.end(), text.chars().count());
            }
        }

        #[test]
        fn prop_text_within_window_is_one_chunk(text in "[a-z]{1,80}") {
            let chunks = chunk(&text, 80, 10).unwrap();
            prop_assert_eq!(chunks.len(), 1);
            prop_assert_eq!(&chunks[0].text, &text);
        }
    }
}
