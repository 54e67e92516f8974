use index::{GraphError, KnowledgeGraph};
use tracing::warn;

pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 2000;

/// Renders chunk texts, in the order given, into one prompt-ready block.
pub struct ContextAssembler {
    max_chars: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTEXT_CHARS)
    }
}

impl ContextAssembler {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Appends whole chunk texts (each followed by a newline) until the
    /// running character count reaches the budget. The chunk that crosses
    /// the budget is kept whole; nothing is cut mid-chunk.
    pub fn assemble(&self, graph: &KnowledgeGraph, chunk_ids: &[String]) -> Result<String, GraphError> {
        let mut context = String::new();
        let mut char_count = 0;

        for chunk_id in chunk_ids {
            let node = graph.node(chunk_id)?;
            let Some(text) = node.chunk_text() else {
                warn!(id = %chunk_id, kind = node.kind.label(), "Skipping non-chunk node in context");
                continue;
            };

            context.push_str(text);
            context.push('\n');
            char_count += text.chars().count() + 1;

            if char_count >= self.max_chars {
                break;
            }
        }

        Ok(context.trim().to_string())
    }
}
