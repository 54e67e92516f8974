use serde::{Deserialize, Serialize};

/// One ordered slice of a source document, ready for triple extraction.
///
/// Chunks carry no identifier of their own: the graph builder derives
/// `chunk_<index>` from the position in the sequence it is handed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    pub page: Option<u32>,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            page,
        }
    }

    /// Character length (not bytes)
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
