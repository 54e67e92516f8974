use crate::chunk::Chunk;
use crate::reader::Document;

pub struct ChunkerConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chars: 1000,
            overlap_chars: 100,
        }
    }
}

pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Split a document page by page; chunks never straddle a page break.
    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for (idx, page) in document.pages.iter().enumerate() {
            let page_number = document.is_paginated().then(|| idx as u32 + 1);
            for text in self.chunk_text(page) {
                chunks.push(Chunk::new(text, document.source.clone(), page_number));
            }
        }

        chunks
    }

    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut buffer = String::new();

        for para in self.split_by_paragraphs(text) {
            // Oversized paragraphs are broken up on word boundaries first
            let pieces = if char_len(&para) > self.config.max_chars {
                self.split_by_words(&para)
            } else {
                vec![para]
            };

            for piece in pieces {
                let separator = if buffer.is_empty() { 0 } else { 2 };
                if char_len(&buffer) + separator + char_len(&piece) > self.config.max_chars
                    && !buffer.is_empty()
                {
                    chunks.push(buffer.clone());
                    buffer = self.get_overlap(&buffer);
                }

                if !buffer.is_empty() {
                    buffer.push_str("\n\n");
                }
                buffer.push_str(&piece);
            }
        }

        if !buffer.trim().is_empty() {
            chunks.push(buffer);
        }

        chunks
    }

    fn split_by_paragraphs(&self, text: &str) -> Vec<String> {
        text.split("\n\n")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn split_by_words(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut current = String::new();

        for word in text.split_whitespace() {
            if !current.is_empty() && char_len(&current) + 1 + char_len(word) > self.config.max_chars {
                pieces.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }

        if !current.is_empty() {
            pieces.push(current);
        }

        pieces
    }

    /// Trailing whole words of `text` totalling at most `overlap_chars`.
    fn get_overlap(&self, text: &str) -> String {
        if self.config.overlap_chars == 0 {
            return String::new();
        }

        let mut taken: Vec<&str> = Vec::new();
        let mut len = 0;
        for word in text.split_whitespace().rev() {
            let extra = char_len(word) + usize::from(!taken.is_empty());
            if len + extra > self.config.overlap_chars {
                break;
            }
            len += extra;
            taken.push(word);
        }

        taken.reverse();
        taken.join(" ")
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_chunking() {
        let chunker = Chunker::new(ChunkerConfig::default());
        let text = "This is a test paragraph.\n\nThis is another paragraph.";
        let chunks = chunker.chunk_text(text);

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("another paragraph"));
    }

    #[test]
    fn test_respects_max_chars() {
        let chunker = Chunker::new(ChunkerConfig {
            max_chars: 40,
            overlap_chars: 0,
        });
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu";
        let chunks = chunker.chunk_text(text);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
    }

    #[test]
    fn test_pages_numbered_only_when_paginated() {
        let chunker = Chunker::new(ChunkerConfig::default());

        let single = Document::from_text("one.txt", "just text");
        assert_eq!(chunker.chunk_document(&single)[0].page, None);

        let paged = Document::from_text("two.txt", "page one\u{000C}page two");
        let chunks = chunker.chunk_document(&paged);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page, Some(1));
        assert_eq!(chunks[1].page, Some(2));
        assert_eq!(chunks[1].source, "two.txt");
    }
}
