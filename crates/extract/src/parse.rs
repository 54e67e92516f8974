//! Parse-then-validate stage for raw model output.
//!
//! Models prepend chatter and append apologies no matter what the prompt
//! says, so the first array-of-objects shaped span is pulled out of the
//! response before anything is deserialized. Nothing here returns an error:
//! every irregularity collapses to "no triples".

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::schema::{Relation, Triple};

static JSON_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[\s*\{.*?\}\s*\]").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Validated triples, possibly empty if every candidate was rejected
    Parsed(Vec<Triple>),
    NoJsonArray,
    InvalidJson,
}

impl ParseOutcome {
    pub fn into_triples(self) -> Vec<Triple> {
        match self {
            ParseOutcome::Parsed(triples) => triples,
            ParseOutcome::NoJsonArray | ParseOutcome::InvalidJson => Vec::new(),
        }
    }
}

/// First substring shaped like `[ {...} ]`, if any.
pub fn find_json_array(raw: &str) -> Option<&str> {
    JSON_ARRAY.find(raw).map(|m| m.as_str())
}

pub fn parse_triples(raw: &str) -> ParseOutcome {
    let Some(span) = find_json_array(raw) else {
        return ParseOutcome::NoJsonArray;
    };

    let candidates: Vec<Value> = match serde_json::from_str(span) {
        Ok(candidates) => candidates,
        Err(_) => return ParseOutcome::InvalidJson,
    };

    ParseOutcome::Parsed(candidates.iter().filter_map(validate_triple).collect())
}

/// Keep a candidate only if it is an object with string `subject`,
/// `relation` and `object`, and the relation is in the vocabulary.
pub fn validate_triple(candidate: &Value) -> Option<Triple> {
    let object = candidate.as_object()?;

    let subject = object.get("subject")?.as_str()?;
    let relation: Relation = object.get("relation")?.as_str()?.parse().ok()?;
    let target = object.get("object")?.as_str()?;

    Some(Triple::new(subject, relation, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_array() {
        let raw = r#"[{"subject": "volcano", "relation": "CAUSES", "object": "ash"}]"#;
        assert_eq!(
            parse_triples(raw),
            ParseOutcome::Parsed(vec![Triple::new("volcano", Relation::Causes, "ash")])
        );
    }

    #[test]
    fn test_array_surrounded_by_commentary() {
        let raw = "Sure! Here are the facts:\n\n[\n  {\"subject\": \"plate\", \"relation\": \"PART_OF\", \"object\": \"lithosphere\"}\n]\n\nLet me know if you need more.";
        let triples = parse_triples(raw).into_triples();
        assert_eq!(triples, vec![Triple::new("plate", Relation::PartOf, "lithosphere")]);
    }

    #[test]
    fn test_no_array_is_empty() {
        assert_eq!(parse_triples("I could not find any facts."), ParseOutcome::NoJsonArray);
        assert_eq!(parse_triples("[]"), ParseOutcome::NoJsonArray);
        assert!(parse_triples("").into_triples().is_empty());
    }

    #[test]
    fn test_malformed_json_yields_nothing() {
        // Second object is broken; no partial recovery of the first
        let raw = r#"[{"subject": "a", "relation": "CAUSES", "object": "b"}, {"subject": }]"#;
        assert_eq!(parse_triples(raw), ParseOutcome::InvalidJson);
    }

    #[test]
    fn test_invalid_candidates_dropped_individually() {
        let raw = r#"[
            {"subject": "magma", "relation": "CAUSES", "object": "eruption"},
            {"subject": "magma", "relation": "CREATES", "object": "rock"},
            {"subject": "crust", "object": "mantle"},
            "not an object",
            {"subject": "rift", "relation": "related_to", "object": "valley"},
            {"subject": 42, "relation": "RELATED_TO", "object": "answer"},
            {"subject": "ridge", "relation": "RELATED_TO", "object": "spreading"}
        ]"#;

        let triples = parse_triples(raw).into_triples();

        assert_eq!(
            triples,
            vec![
                Triple::new("magma", Relation::Causes, "eruption"),
                Triple::new("ridge", Relation::RelatedTo, "spreading"),
            ]
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        let raw = r#"[{"subject": "a", "relation": "CAUSES", "object": "b"},
                      {"subject": "a", "relation": "CAUSES", "object": "b"}]"#;
        assert_eq!(parse_triples(raw).into_triples().len(), 2);
    }

    #[test]
    fn test_extra_keys_are_tolerated() {
        let candidate = json!({"subject": "a", "relation": "IMPROVES", "object": "b", "confidence": 0.9});
        assert_eq!(
            validate_triple(&candidate),
            Some(Triple::new("a", Relation::Improves, "b"))
        );
    }
}
