//! Query scope shared by every report.
//!
//! A scope narrows the assessments (and through them, the answers) a report
//! aggregates over. All filters combine with `AND`; an empty scope covers
//! the whole store.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::model::catalog::{DigitalObjectId, MetricId, ProjectId, RubricId};

use super::StatsResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnswerScope {
    pub project: Option<ProjectId>,
    pub rubric: Option<RubricId>,
    pub metric: Option<MetricId>,
    pub target: Option<DigitalObjectId>,
}

/// SQL condition fragment (starting with ` AND`) plus its bind values.
#[derive(Debug, Default)]
pub(crate) struct SqlFilter {
    pub sql: String,
    pub binds: Vec<Value>,
}

impl SqlFilter {
    fn push(&mut self, condition: &str, value: i64) {
        self.sql.push_str(condition);
        self.binds.push(Value::Integer(value));
    }
}

impl AnswerScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn project(id: ProjectId) -> Self {
        Self {
            project: Some(id),
            ..Self::default()
        }
    }

    pub fn rubric(id: RubricId) -> Self {
        Self {
            rubric: Some(id),
            ..Self::default()
        }
    }

    pub fn metric(id: MetricId) -> Self {
        Self {
            metric: Some(id),
            ..Self::default()
        }
    }

    pub fn target(id: DigitalObjectId) -> Self {
        Self {
            target: Some(id),
            ..Self::default()
        }
    }

    /// Returns a copy narrowed to one rubric.
    pub fn with_rubric(self, id: RubricId) -> Self {
        Self {
            rubric: Some(id),
            ..self
        }
    }

    /// Conditions for a query joining `assessments a`. A metric filter keeps
    /// assessments that hold at least one answer for that metric.
    pub(crate) fn assessment_filter(&self) -> SqlFilter {
        let mut filter = SqlFilter::default();
        if let Some(project) = self.project {
            filter.push(" AND a.project_id = ?", project);
        }
        if let Some(rubric) = self.rubric {
            filter.push(" AND a.rubric_id = ?", rubric);
        }
        if let Some(target) = self.target {
            filter.push(" AND a.target_id = ?", target);
        }
        if let Some(metric) = self.metric {
            filter.push(
                " AND EXISTS (SELECT 1 FROM answers m WHERE m.assessment_id = a.id AND m.metric_id = ?)",
                metric,
            );
        }
        filter
    }

    /// Conditions for a query joining `assessments a` and `answers ans`.
    pub(crate) fn answer_filter(&self) -> SqlFilter {
        let mut filter = SqlFilter::default();
        if let Some(project) = self.project {
            filter.push(" AND a.project_id = ?", project);
        }
        if let Some(rubric) = self.rubric {
            filter.push(" AND a.rubric_id = ?", rubric);
        }
        if let Some(target) = self.target {
            filter.push(" AND a.target_id = ?", target);
        }
        if let Some(metric) = self.metric {
            filter.push(" AND ans.metric_id = ?", metric);
        }
        filter
    }
}

/// Raw answer values in scope, in insertion order.
pub(crate) fn answer_values(conn: &Connection, scope: &AnswerScope) -> StatsResult<Vec<f64>> {
    let filter = scope.answer_filter();
    let sql = format!(
        "SELECT ans.answer
         FROM answers ans
         JOIN assessments a ON a.id = ans.assessment_id
         WHERE 1 = 1{}
         ORDER BY ans.id",
        filter.sql
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(filter.binds), |row| row.get::<_, f64>(0))?;
    let mut values = Vec::new();
    for value in rows {
        values.push(value?);
    }
    Ok(values)
}

/// Distinct rubrics used by assessments in scope, ordered by id.
pub(crate) fn rubrics_in_scope(
    conn: &Connection,
    scope: &AnswerScope,
) -> StatsResult<Vec<(RubricId, String)>> {
    let filter = scope.assessment_filter();
    let sql = format!(
        "SELECT DISTINCT r.id, r.title
         FROM assessments a
         JOIN rubrics r ON r.id = a.rubric_id
         WHERE 1 = 1{}
         ORDER BY r.id",
        filter.sql
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(filter.binds), |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;
    let mut rubrics = Vec::new();
    for rubric in rows {
        rubrics.push(rubric?);
    }
    Ok(rubrics)
}
