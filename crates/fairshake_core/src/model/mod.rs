//! Domain model for authors, catalog resources and assessments.
//!
//! # Responsibility
//! - Define canonical data structures shared by permissions, reports and
//!   ingestion.
//! - Keep validation rules next to the types they protect.
//!
//! # Invariants
//! - Every persisted record is identified by a stable integer id.
//! - Answer values always lie within `[0, 1]`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod answer;
pub mod assessment;
pub mod author;
pub mod catalog;

/// Validation failures for model invariants.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyTitle { entity: &'static str },
    EmptyUsername,
    AnswerOutOfRange(f64),
    UnknownAnswerLabel(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle { entity } => write!(f, "{entity} title must not be empty"),
            Self::EmptyUsername => write!(f, "author username must not be empty"),
            Self::AnswerOutOfRange(value) => {
                write!(f, "answer value {value} is outside the range [0, 1]")
            }
            Self::UnknownAnswerLabel(label) => write!(f, "unknown answer label `{label}`"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_title(entity: &'static str, title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle { entity });
    }
    Ok(())
}
