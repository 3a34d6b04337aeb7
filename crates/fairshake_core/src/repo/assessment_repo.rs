//! Assessment repository: assessments, requests and answers.
//!
//! # Invariants
//! - Answer values are re-validated when read back; rows outside `[0, 1]`
//!   surface as `InvalidData` instead of being clamped.

use crate::model::answer::AnswerValue;
use crate::model::assessment::{
    Answer, AnswerId, Assessment, AssessmentId, AssessmentRequest, AssessmentRequestId,
    NewAnswer, NewAssessment, NewAssessmentRequest,
};
use crate::model::catalog::DigitalObjectId;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ASSESSMENT_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    target_id,
    rubric_id,
    methodology,
    assessor_id
FROM assessments";

const REQUEST_SELECT_SQL: &str = "SELECT
    id,
    requestor_id,
    assessor_id,
    project_id,
    target_id,
    rubric_id
FROM assessment_requests";

/// Repository interface for assessment records.
pub trait AssessmentRepository {
    fn create_assessment(&self, assessment: &NewAssessment) -> RepoResult<AssessmentId>;
    fn get_assessment(&self, id: AssessmentId) -> RepoResult<Option<Assessment>>;
    fn list_assessments_for_target(&self, target: DigitalObjectId)
        -> RepoResult<Vec<Assessment>>;
    fn delete_assessment(&self, id: AssessmentId) -> RepoResult<()>;

    fn create_request(&self, request: &NewAssessmentRequest) -> RepoResult<AssessmentRequestId>;
    fn get_request(&self, id: AssessmentRequestId) -> RepoResult<Option<AssessmentRequest>>;

    fn create_answer(&self, answer: &NewAnswer) -> RepoResult<AnswerId>;
    fn list_answers(&self, assessment: AssessmentId) -> RepoResult<Vec<Answer>>;
}

/// SQLite-backed assessment repository.
pub struct SqliteAssessmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAssessmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AssessmentRepository for SqliteAssessmentRepository<'_> {
    fn create_assessment(&self, assessment: &NewAssessment) -> RepoResult<AssessmentId> {
        self.conn.execute(
            "INSERT INTO assessments (
                project_id,
                target_id,
                rubric_id,
                methodology,
                assessor_id
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                assessment.project,
                assessment.target,
                assessment.rubric,
                assessment.methodology,
                assessment.assessor,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_assessment(&self, id: AssessmentId) -> RepoResult<Option<Assessment>> {
        let assessment = self
            .conn
            .query_row(
                &format!("{ASSESSMENT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_assessment_row,
            )
            .optional()?;
        Ok(assessment)
    }

    fn list_assessments_for_target(
        &self,
        target: DigitalObjectId,
    ) -> RepoResult<Vec<Assessment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ASSESSMENT_SELECT_SQL} WHERE target_id = ?1 ORDER BY id;"))?;
        let rows = stmt.query_map([target], parse_assessment_row)?;
        let mut assessments = Vec::new();
        for assessment in rows {
            assessments.push(assessment?);
        }
        Ok(assessments)
    }

    fn delete_assessment(&self, id: AssessmentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM assessments WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::not_found("assessment", id));
        }
        Ok(())
    }

    fn create_request(&self, request: &NewAssessmentRequest) -> RepoResult<AssessmentRequestId> {
        self.conn.execute(
            "INSERT INTO assessment_requests (
                requestor_id,
                assessor_id,
                project_id,
                target_id,
                rubric_id
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                request.requestor,
                request.assessor,
                request.project,
                request.target,
                request.rubric,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_request(&self, id: AssessmentRequestId) -> RepoResult<Option<AssessmentRequest>> {
        let request = self
            .conn
            .query_row(
                &format!("{REQUEST_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| {
                    Ok(AssessmentRequest {
                        id: row.get("id")?,
                        requestor: row.get("requestor_id")?,
                        assessor: row.get("assessor_id")?,
                        project: row.get("project_id")?,
                        target: row.get("target_id")?,
                        rubric: row.get("rubric_id")?,
                    })
                },
            )
            .optional()?;
        Ok(request)
    }

    fn create_answer(&self, answer: &NewAnswer) -> RepoResult<AnswerId> {
        self.conn.execute(
            "INSERT INTO answers (assessment_id, metric_id, answer, comment)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                answer.assessment,
                answer.metric,
                answer.answer.value(),
                answer.comment,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_answers(&self, assessment: AssessmentId) -> RepoResult<Vec<Answer>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, assessment_id, metric_id, answer, comment
             FROM answers
             WHERE assessment_id = ?1
             ORDER BY id;",
        )?;
        let mut rows = stmt.query([assessment])?;
        let mut answers = Vec::new();
        while let Some(row) = rows.next()? {
            answers.push(parse_answer_row(row)?);
        }
        Ok(answers)
    }
}

fn parse_assessment_row(row: &Row<'_>) -> rusqlite::Result<Assessment> {
    Ok(Assessment {
        id: row.get("id")?,
        project: row.get("project_id")?,
        target: row.get("target_id")?,
        rubric: row.get("rubric_id")?,
        methodology: row.get("methodology")?,
        assessor: row.get("assessor_id")?,
    })
}

fn parse_answer_row(row: &Row<'_>) -> RepoResult<Answer> {
    let raw: f64 = row.get("answer")?;
    let answer = AnswerValue::new(raw).map_err(|_| {
        RepoError::InvalidData(format!("invalid answer value `{raw}` in answers.answer"))
    })?;
    Ok(Answer {
        id: row.get("id")?,
        assessment: row.get("assessment_id")?,
        metric: row.get("metric_id")?,
        answer,
        comment: row.get("comment")?,
    })
}
