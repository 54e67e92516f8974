use thiserror::Error;

/// Conditions the caller is expected to handle distinctly from service
/// failures. Everything else travels as `anyhow::Error`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Please provide a valid question.")]
    EmptyQuestion,
}
