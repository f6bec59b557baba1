use std::fmt::Display;

use thiserror::Error;

/// A problem with the way components reference each other.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowIssue {
    #[error(
        "A component with the name '{name}' is declared two times, here:\n{first}\n... and again here:\n{second}"
    )]
    DuplicateDeclaration {
        name: String,
        first: String,
        second: String,
    },
    #[error("Component reference with name '{name}' without input or output found:\n{location}")]
    LoneReference { name: String, location: String },
}

/// A syntax or line level problem in the flow source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ERROR: {location}\n{message}")]
pub struct ParseIssue {
    pub location: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Found errors while parsing flow:\n{}", join_lines(.0))]
    Parse(Vec<ParseIssue>),
    #[error("Found errors in flow:\n{}", join_lines(.0))]
    Invalid(Vec<FlowIssue>),
    /// An internal invariant of the restructured tree does not hold.
    #[error("inconsistent flow structure: {0}")]
    Structural(String),
    #[error("flow is empty")]
    Empty,
}

impl FlowError {
    pub(crate) fn structural(message: impl Into<String>) -> Self {
        FlowError::Structural(message.into())
    }
}

fn join_lines<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
