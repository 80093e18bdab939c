//! Chunk module - overlapping windows over a document

use serde::{Deserialize, Serialize};

/// A contiguous window of a normalized document.
///
/// Offsets and lengths are counted in characters, not bytes, so a window never
/// splits a UTF-8 code point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the chunk sequence; doubles as the chunk identifier
    pub index: usize,

    /// Character offset of the first character in the document
    pub start: usize,

    /// Length in characters
    pub len: usize,

    /// Window text
    pub text: String,
}

impl Chunk {
    /// Create a chunk, computing its character length from `text`
    ///
    /// # Examples
    ///
    /// ```
    /// use polex_domain::Chunk;
    ///
    /// let chunk = Chunk::new(0, 10, "héllo");
    /// assert_eq!(chunk.len, 5);
    /// assert_eq!(chunk.end(), 15);
    /// ```
    pub fn new(index: usize, start: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self {
            index,
            start,
            len,
            text,
        }
    }

    /// Identifier reported alongside this chunk's extraction result
    pub fn id(&self) -> usize {
        self.index
    }

    /// Character offset one past the last character
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Whether the window holds no text
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
