use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed relation vocabulary. Nothing outside this set enters the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
    Mentions,
    Describes,
    UsedFor,
    RelatedTo,
    PartOf,
    Improves,
    Causes,
}

impl Relation {
    pub const ALL: [Relation; 7] = [
        Relation::Mentions,
        Relation::Describes,
        Relation::UsedFor,
        Relation::RelatedTo,
        Relation::PartOf,
        Relation::Improves,
        Relation::Causes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Mentions => "MENTIONS",
            Relation::Describes => "DESCRIBES",
            Relation::UsedFor => "USED_FOR",
            Relation::RelatedTo => "RELATED_TO",
            Relation::PartOf => "PART_OF",
            Relation::Improves => "IMPROVES",
            Relation::Causes => "CAUSES",
        }
    }

    /// Comma separated label list, as embedded in prompts
    pub fn vocabulary() -> String {
        Self::ALL
            .iter()
            .map(Relation::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRelation(pub String);

impl fmt::Display for UnknownRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "relation not in vocabulary: {}", self.0)
    }
}

impl std::error::Error for UnknownRelation {}

impl FromStr for Relation {
    type Err = UnknownRelation;

    /// Exact, case-sensitive match against the vocabulary.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRelation(s.to_string()))
    }
}

/// A validated (subject, relation, object) fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub relation: Relation,
    pub object: String,
}

impl Triple {
    pub fn new(subject: impl Into<String>, relation: Relation, object: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            relation,
            object: object.into(),
        }
    }
}
