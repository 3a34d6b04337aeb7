//! Catalog resources: projects, digital objects, rubrics and metrics.
//!
//! # Invariants
//! - Titles are never blank.
//! - `authors` lists the actors allowed to mutate the resource.

use serde::{Deserialize, Serialize};

use super::author::AuthorId;
use super::{require_title, ValidationError};

pub type ProjectId = i64;
pub type DigitalObjectId = i64;
pub type RubricId = i64;
pub type MetricId = i64;

/// Resource whose mutation is gated by an explicit authors set.
pub trait Identifiable {
    fn authors(&self) -> &[AuthorId];

    fn is_authored_by(&self, author: AuthorId) -> bool {
        self.authors().contains(&author)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    pub url: String,
    pub authors: Vec<AuthorId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalObject {
    pub id: DigitalObjectId,
    pub title: String,
    pub url: String,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub kind: String,
    pub tags: String,
    pub projects: Vec<ProjectId>,
    pub authors: Vec<AuthorId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    pub id: RubricId,
    pub title: String,
    pub description: String,
    /// Ordered by rubric position.
    pub metrics: Vec<MetricId>,
    pub authors: Vec<AuthorId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub id: MetricId,
    pub title: String,
    pub description: String,
    pub authors: Vec<AuthorId>,
}

impl Identifiable for Project {
    fn authors(&self) -> &[AuthorId] {
        &self.authors
    }
}

impl Identifiable for DigitalObject {
    fn authors(&self) -> &[AuthorId] {
        &self.authors
    }
}

impl Identifiable for Rubric {
    fn authors(&self) -> &[AuthorId] {
        &self.authors
    }
}

impl Identifiable for Metric {
    fn authors(&self) -> &[AuthorId] {
        &self.authors
    }
}

/// Insert payload for a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub url: String,
    pub authors: Vec<AuthorId>,
}

/// Insert payload for a digital object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDigitalObject {
    pub title: String,
    pub url: String,
    pub kind: String,
    pub tags: String,
    pub projects: Vec<ProjectId>,
    pub authors: Vec<AuthorId>,
}

/// Insert payload for a rubric; `metrics` order becomes rubric position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewRubric {
    pub title: String,
    pub description: String,
    pub metrics: Vec<MetricId>,
    pub authors: Vec<AuthorId>,
}

/// Insert payload for a metric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMetric {
    pub title: String,
    pub description: String,
    pub authors: Vec<AuthorId>,
}

impl NewProject {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_title("project", &self.title)
    }
}

impl NewDigitalObject {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_title("digital object", &self.title)
    }
}

impl NewRubric {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_title("rubric", &self.title)
    }
}

impl NewMetric {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_title("metric", &self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::{Identifiable, NewDigitalObject, Project};
    use crate::model::ValidationError;

    #[test]
    fn authorship_checks_membership() {
        let project = Project {
            id: 1,
            title: "TOPMed".to_string(),
            description: String::new(),
            url: String::new(),
            authors: vec![3, 5],
        };
        assert!(project.is_authored_by(5));
        assert!(!project.is_authored_by(4));
    }

    #[test]
    fn blank_title_fails_validation() {
        let draft = NewDigitalObject {
            title: "   ".to_string(),
            ..NewDigitalObject::default()
        };
        assert_eq!(
            draft.validate(),
            Err(ValidationError::EmptyTitle {
                entity: "digital object"
            })
        );
    }
}
