//! Statistical reporting views over stored answers.
//!
//! # Responsibility
//! - Aggregate answers (counts, sums, means) per rubric, metric and target.
//! - Turn aggregates into chart specifications and embeddable markup.
//!
//! # Invariants
//! - Every report re-queries the store; nothing is cached.
//! - Empty or malformed aggregates surface as `StatsError`, never as a
//!   silently empty chart, except where a report documents suppression.

use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod chart;
pub mod level;
pub mod reports;
pub mod scope;
pub mod summary;

pub use chart::{Chart, Figure};
pub use reports::{
    digital_object_bar_breakdown, question_breakdown, rubric_pie_chart,
    rubrics_by_metrics_breakdown, rubrics_in_projects_overlay, score_histogram,
    score_histogram_for, table_plot,
};
pub use scope::AnswerScope;
pub use summary::{single_query, ScopeKind, ScoreReport, ScoreSummary};

/// Fixed metric count of the reference rubric, used as divisor when
/// estimating assessment counts from answer counts.
pub const METRICS_PER_ASSESSMENT: f64 = 9.0;

pub type StatsResult<T> = Result<T, StatsError>;

#[derive(Debug)]
pub enum StatsError {
    Repo(RepoError),
    /// The aggregate a report needs has no rows.
    EmptyAggregate(&'static str),
    NotFound { entity: &'static str, id: i64 },
    Render(serde_json::Error),
    Io(std::io::Error),
}

impl Display for StatsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::EmptyAggregate(report) => write!(f, "no rows to aggregate for {report}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Render(err) => write!(f, "failed to render chart: {err}"),
            Self::Io(err) => write!(f, "failed to write report: {err}"),
        }
    }
}

impl Error for StatsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Render(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::EmptyAggregate(_) | Self::NotFound { .. } => None,
        }
    }
}

impl From<RepoError> for StatsError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for StatsError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

impl From<serde_json::Error> for StatsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Render(value)
    }
}

impl From<std::io::Error> for StatsError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
