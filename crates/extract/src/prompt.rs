use crate::schema::Relation;

pub fn build_extraction_prompt(chunk_text: &str) -> String {
    format!(
        r#"You are an information extraction system.

Extract factual knowledge from the text below.

Rules:
- Only extract facts explicitly stated in the text.
- Use short, canonical names.
- Do NOT guess or infer.
- Use ONLY the allowed relations.
- Output VALID JSON ONLY (no explanation, no markdown).

Allowed relations:
{}

Output format:
[
  {{"subject": "...", "relation": "...", "object": "..."}}
]

Text:
{}
"#,
        Relation::vocabulary(),
        chunk_text
    )
}

pub fn build_query_entity_prompt(question: &str) -> String {
    format!(
        r#"Extract key entities or concepts from the question.

Rules:
- Use short canonical names
- No explanations
- Output valid JSON only

Output format:
["entity1", "entity2", ...]

Question:
{}
"#,
        question
    )
}
