//! Authors and request actors.

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Stable identifier of an author row.
pub type AuthorId = i64;

/// Registered identity that can own resources and perform assessments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub username: String,
}

impl Author {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        Ok(())
    }
}

/// Identity attached to an incoming request.
///
/// Comparisons against ownership fields are by author id only; an anonymous
/// actor never matches any owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Actor {
    Anonymous,
    Author(AuthorId),
}

impl Actor {
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Author(_))
    }

    pub fn author_id(self) -> Option<AuthorId> {
        match self {
            Self::Anonymous => None,
            Self::Author(id) => Some(id),
        }
    }

    /// Returns whether this actor is the given author.
    pub fn is(self, author: AuthorId) -> bool {
        self.author_id() == Some(author)
    }
}

impl From<&Author> for Actor {
    fn from(value: &Author) -> Self {
        Self::Author(value.id)
    }
}
