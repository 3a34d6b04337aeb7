//! Assessments, assessment requests and their answers.
//!
//! # Invariants
//! - An assessment always names a target, a rubric and an assessor.
//! - An answer belongs to exactly one assessment and one metric.

use serde::{Deserialize, Serialize};

use super::answer::AnswerValue;
use super::author::AuthorId;
use super::catalog::{DigitalObjectId, MetricId, ProjectId, RubricId};

pub type AssessmentId = i64;
pub type AssessmentRequestId = i64;
pub type AnswerId = i64;

/// Application of a rubric to a target digital object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub project: Option<ProjectId>,
    pub target: DigitalObjectId,
    pub rubric: RubricId,
    pub methodology: String,
    pub assessor: AuthorId,
}

/// Request that some digital object be assessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub id: AssessmentRequestId,
    pub requestor: AuthorId,
    pub assessor: Option<AuthorId>,
    pub project: Option<ProjectId>,
    pub target: DigitalObjectId,
    pub rubric: Option<RubricId>,
}

/// Recorded value for one metric within one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub assessment: AssessmentId,
    pub metric: MetricId,
    pub answer: AnswerValue,
    pub comment: String,
}

/// Insert payload for an assessment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAssessment {
    pub project: Option<ProjectId>,
    pub target: DigitalObjectId,
    pub rubric: RubricId,
    pub methodology: String,
    pub assessor: AuthorId,
}

/// Insert payload for an assessment request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAssessmentRequest {
    pub requestor: AuthorId,
    pub assessor: Option<AuthorId>,
    pub project: Option<ProjectId>,
    pub target: DigitalObjectId,
    pub rubric: Option<RubricId>,
}

/// Insert payload for an answer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnswer {
    pub assessment: AssessmentId,
    pub metric: MetricId,
    pub answer: AnswerValue,
    pub comment: String,
}
