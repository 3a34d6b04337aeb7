//! Descriptive statistics for one project, rubric or metric.

use log::info;
use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::io::Write;

use crate::repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};

use super::chart::Chart;
use super::reports::score_histogram;
use super::scope::{answer_values, AnswerScope};
use super::{StatsError, StatsResult, METRICS_PER_ASSESSMENT};

/// Entity a summary is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Project,
    Rubric,
    Metric,
}

impl ScopeKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "project" => Some(Self::Project),
            "rubric" => Some(Self::Rubric),
            "metric" => Some(Self::Metric),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Rubric => "rubric",
            Self::Metric => "metric",
        }
    }

    fn scope(self, id: i64) -> AnswerScope {
        match self {
            Self::Project => AnswerScope::project(id),
            Self::Rubric => AnswerScope::rubric(id),
            Self::Metric => AnswerScope::metric(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    pub kind: ScopeKind,
    pub id: i64,
    pub title: String,
    /// Rounded to two decimal places.
    pub mean: f64,
    pub median: f64,
    /// Estimated as answers / 9.
    pub assessments: f64,
    pub questions: usize,
}

impl Display for ScoreSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = self.kind.as_str();
        writeln!(
            f,
            "Overall FAIR Evaluations for the {kind}: {} ({kind} id: {})",
            self.title, self.id
        )?;
        writeln!(f)?;
        writeln!(f, "Mean FAIR score: {}", self.mean)?;
        writeln!(f, "Median FAIR score: {}", self.median)?;
        writeln!(f, "Total Assessments: {}", self.assessments)?;
        writeln!(f, "Total Questions Answered: {}", self.questions)
    }
}

/// Summary plus its score histogram (absent for single-valued data).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    pub summary: ScoreSummary,
    pub histogram: Option<Chart>,
}

/// Summarizes every answer recorded for one project, rubric or metric.
///
/// Writes the summary to `console` and returns it with the histogram.
/// Returns `Ok(None)` without writing anything when there are no answers.
///
/// # Errors
/// - `NotFound` when `id` does not name an existing entity of `kind`.
pub fn single_query(
    conn: &Connection,
    kind: ScopeKind,
    id: i64,
    console: &mut dyn Write,
) -> StatsResult<Option<ScoreReport>> {
    let catalog = SqliteCatalogRepository::new(conn);
    let title = match kind {
        ScopeKind::Project => catalog.get_project(id)?.map(|project| project.title),
        ScopeKind::Rubric => catalog.get_rubric(id)?.map(|rubric| rubric.title),
        ScopeKind::Metric => catalog.get_metric(id)?.map(|metric| metric.title),
    }
    .ok_or(StatsError::NotFound {
        entity: kind.as_str(),
        id,
    })?;

    let mut scores = answer_values(conn, &kind.scope(id))?;
    if scores.is_empty() {
        return Ok(None);
    }

    let questions = scores.len();
    let mean = scores.iter().sum::<f64>() / questions as f64;
    scores.sort_by(f64::total_cmp);
    let median = if questions % 2 == 1 {
        scores[questions / 2]
    } else {
        (scores[questions / 2 - 1] + scores[questions / 2]) / 2.0
    };

    let summary = ScoreSummary {
        kind,
        id,
        title,
        mean: (mean * 100.0).round() / 100.0,
        median,
        assessments: questions as f64 / METRICS_PER_ASSESSMENT,
        questions,
    };
    write!(console, "{summary}")?;
    info!(
        "event=single_query module=stats status=ok scope={} id={} questions={}",
        kind.as_str(),
        id,
        questions
    );

    let histogram = score_histogram(&scores)?;
    Ok(Some(ScoreReport { summary, histogram }))
}
