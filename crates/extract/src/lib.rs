pub mod llm;
pub mod parse;
pub mod prompt;
pub mod schema;

pub use llm::{OllamaClient, TextGenerator};
pub use parse::{ParseOutcome, parse_triples};
pub use schema::{Relation, Triple, UnknownRelation};

use tracing::{debug, warn};

/// Turns one chunk of text into validated triples.
///
/// Never fails: a service error or an unusable response both mean
/// "no triples for this chunk", so a noisy model cannot stop a build.
pub struct TripleExtractor<G> {
    llm_client: G,
}

impl<G: TextGenerator> TripleExtractor<G> {
    pub fn new(llm_client: G) -> Self {
        Self { llm_client }
    }

    pub async fn extract_triples(&self, text: &str) -> Vec<Triple> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let prompt = prompt::build_extraction_prompt(text);

        let response = match self.llm_client.generate(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Triple extraction request failed, skipping chunk");
                return Vec::new();
            }
        };
        debug!(response = %response, "Raw extraction output");

        match parse_triples(&response) {
            ParseOutcome::Parsed(triples) => triples,
            outcome => {
                warn!(outcome = ?outcome, "Unusable extraction output, skipping chunk");
                Vec::new()
            }
        }
    }

    pub fn llm_client(&self) -> &G {
        &self.llm_client
    }
}
