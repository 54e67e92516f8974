/// Final synthesis prompt. Without context the question is asked bare.
pub fn build_answer_prompt(question: &str, context: &str) -> String {
    if context.trim().is_empty() {
        return format!(
            "You are a helpful AI assistant.\nQuestion: {}",
            question
        );
    }

    format!(
        r#"You are a helpful AI assistant.
Use the following context to answer the question.

Context: {}
Question: {}"#,
        context, question
    )
}
