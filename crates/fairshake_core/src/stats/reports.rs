//! Chart-producing reports.
//!
//! Each report takes a connection and a scope (or a project id) and returns
//! one rendered [`Chart`]. `score_histogram` is the only report that may
//! return nothing: a single-valued distribution is suppressed.

use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

use crate::model::answer::AnswerValue;
use crate::model::catalog::{MetricId, ProjectId};
use crate::repo::assessment_repo::{AssessmentRepository, SqliteAssessmentRepository};
use crate::repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};

use super::chart::{
    Axis, BarTrace, Chart, Datum, Figure, Font, HeatmapTrace, Layout, Marker, PieTrace, Trace,
};
use super::level::FairLevel;
use super::scope::{answer_values, rubrics_in_scope, AnswerScope};
use super::{StatsError, StatsResult, METRICS_PER_ASSESSMENT};

/// Buckets always present in the histogram, even with zero responses.
const PADDED_SCORE_BUCKETS: [f64; 4] = [0.0, 0.25, 0.75, 1.0];
const SCORE_TICKS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];
const SCORE_AXIS_TITLE: &str = "FAIR score (0=no,0.25=nobut,0.5=maybe,0.75=yesbut,1=yes)";
const MEAN_SCORE_TITLE: &str = "Mean FAIR score";
const SUBPLOT_VERTICAL_SPACING: f64 = 0.3;

/// Bar chart of response counts per score.
///
/// Returns `Ok(None)` when `values` holds fewer than two distinct scores.
pub fn score_histogram(values: &[f64]) -> StatsResult<Option<Chart>> {
    let mut buckets: Vec<(f64, u64)> = Vec::new();
    for value in values {
        match buckets.iter().position(|(score, _)| score == value) {
            Some(index) => buckets[index].1 += 1,
            None => buckets.push((*value, 1)),
        }
    }

    if buckets.len() <= 1 {
        debug!(
            "event=score_histogram module=stats status=suppressed distinct_values={}",
            buckets.len()
        );
        return Ok(None);
    }

    for score in PADDED_SCORE_BUCKETS {
        if !buckets.iter().any(|(existing, _)| *existing == score) {
            buckets.push((score, 0));
        }
    }
    buckets.sort_by(|left, right| left.0.total_cmp(&right.0));

    let trace = BarTrace {
        x: buckets.iter().map(|(score, _)| Datum::from(*score)).collect(),
        y: buckets.iter().map(|(_, count)| Datum::from(*count)).collect(),
        ..BarTrace::default()
    };
    let mut layout = Layout::with_axes(
        Axis {
            ticks: Some("outside".to_string()),
            tickvals: Some(SCORE_TICKS.to_vec()),
            ..Axis::titled(SCORE_AXIS_TITLE)
        },
        Axis::titled("Responses"),
    );
    layout.width = Some(400);
    layout.height = Some(400);

    Chart::render(Figure {
        data: vec![Trace::Bar(trace)],
        layout,
    })
    .map(Some)
}

/// Histogram over every answer value in scope.
pub fn score_histogram_for(conn: &Connection, scope: &AnswerScope) -> StatsResult<Option<Chart>> {
    let values = answer_values(conn, scope)?;
    score_histogram(&values)
}

/// Pie chart of assessment counts per rubric title.
///
/// # Errors
/// - `EmptyAggregate` when the scope holds no assessments.
pub fn rubric_pie_chart(conn: &Connection, scope: &AnswerScope) -> StatsResult<Chart> {
    let filter = scope.assessment_filter();
    let sql = format!(
        "SELECT r.title, COUNT(a.id)
         FROM assessments a
         JOIN rubrics r ON r.id = a.rubric_id
         WHERE 1 = 1{}
         GROUP BY r.title
         ORDER BY r.title",
        filter.sql
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(filter.binds), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut labels = Vec::new();
    let mut values = Vec::new();
    for row in rows {
        let (title, count) = row?;
        labels.push(title);
        values.push(count.max(0) as u64);
    }
    if labels.is_empty() {
        return Err(StatsError::EmptyAggregate("rubric pie chart"));
    }

    Chart::render(Figure {
        data: vec![Trace::Pie(PieTrace {
            labels,
            values,
            hoverinfo: "label+value+percent".to_string(),
            textinfo: "percent".to_string(),
        })],
        layout: Layout::default(),
    })
}

/// Stacked bars of answer counts, one trace per rubric used in scope.
///
/// Within a rubric, bars are ordered by descending `(count, label)`.
pub fn rubrics_in_projects_overlay(conn: &Connection, scope: &AnswerScope) -> StatsResult<Chart> {
    let mut data = Vec::new();
    for (rubric_id, rubric_title) in rubrics_in_scope(conn, scope)? {
        let filter = scope.with_rubric(rubric_id).answer_filter();
        let sql = format!(
            "SELECT ans.answer, COUNT(ans.id)
             FROM assessments a
             JOIN answers ans ON ans.assessment_id = a.id
             WHERE 1 = 1{}
             GROUP BY ans.answer",
            filter.sql
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(filter.binds), |row| {
            Ok((row.get::<_, f64>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            let (raw, count) = row?;
            let label = AnswerValue::new(raw)
                .map(|value| value.annotate(true))
                .unwrap_or_else(|_| raw.to_string());
            counts.push((count.max(0) as u64, label));
        }
        counts.sort_by(|left, right| right.cmp(left));

        data.push(Trace::Bar(BarTrace {
            x: counts.iter().map(|(_, label)| Datum::from(label.as_str())).collect(),
            y: counts.iter().map(|(count, _)| Datum::from(*count)).collect(),
            name: Some(rubric_title),
            ..BarTrace::default()
        }));
    }

    let mut layout = Layout::with_axes(Axis::titled("Answer"), Axis::titled("Responses"));
    layout.barmode = Some("stack".to_string());
    Chart::render(Figure { data, layout })
}

/// Mean score per metric, estimated as `sum / (answers / 9)`.
///
/// The divisor assumes every assessment answers the nine metrics of the
/// reference rubric.
pub fn question_breakdown(conn: &Connection, scope: &AnswerScope) -> StatsResult<Chart> {
    let filter = scope.answer_filter();
    let sql = format!(
        "SELECT ans.metric_id, m.title, ans.answer
         FROM answers ans
         JOIN assessments a ON a.id = ans.assessment_id
         JOIN metrics m ON m.id = ans.metric_id
         WHERE 1 = 1{}
         ORDER BY ans.id",
        filter.sql
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(filter.binds), |row| {
        Ok((
            row.get::<_, MetricId>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, f64>(2)?,
        ))
    })?;

    let mut sums: Vec<(MetricId, String, f64)> = Vec::new();
    let mut answer_count = 0_usize;
    for row in rows {
        let (metric, title, value) = row?;
        answer_count += 1;
        match sums.iter().position(|(id, _, _)| *id == metric) {
            Some(index) => sums[index].2 += value,
            None => sums.push((metric, title, value)),
        }
    }
    if answer_count == 0 {
        return Err(StatsError::EmptyAggregate("question breakdown"));
    }

    let estimated_assessments = answer_count as f64 / METRICS_PER_ASSESSMENT;
    let trace = BarTrace {
        x: sums
            .iter()
            .map(|(_, title, _)| Datum::from(title.as_str()))
            .collect(),
        y: sums
            .iter()
            .map(|(_, _, sum)| Datum::from(sum / estimated_assessments))
            .collect(),
        ..BarTrace::default()
    };
    let layout = Layout::with_axes(
        Axis {
            titlefont: Some(Font { size: 16 }),
            tickfont: Some(Font { size: 12 }),
            ..Axis::titled("Metric")
        },
        Axis {
            titlefont: Some(Font { size: 16 }),
            ..Axis::titled(MEAN_SCORE_TITLE)
        },
    );
    Chart::render(Figure {
        data: vec![Trace::Bar(trace)],
        layout,
    })
}

/// Mean score per target, grouped into colour-coded `FairLevel` traces.
pub fn digital_object_bar_breakdown(
    conn: &Connection,
    scope: &AnswerScope,
) -> StatsResult<Chart> {
    let filter = scope.answer_filter();
    let sql = format!(
        "SELECT d.title, AVG(ans.answer)
         FROM assessments a
         JOIN digital_objects d ON d.id = a.target_id
         JOIN answers ans ON ans.assessment_id = a.id
         WHERE 1 = 1{}
         GROUP BY d.title",
        filter.sql
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(filter.binds), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;

    let mut means = Vec::new();
    for row in rows {
        let (title, mean) = row?;
        means.push((mean, title));
    }
    means.sort_by(|left, right| left.0.total_cmp(&right.0).then_with(|| left.1.cmp(&right.1)));

    let mapper = FairLevel::mapper();
    let mut groups: Vec<(FairLevel, Vec<f64>, Vec<String>)> = Vec::new();
    for (mean, title) in &means {
        let level = mapper.map(*mean);
        match groups.iter().position(|(existing, _, _)| *existing == level) {
            Some(index) => {
                groups[index].1.push(*mean);
                groups[index].2.push(title.clone());
            }
            None => groups.push((level, vec![*mean], vec![title.clone()])),
        }
    }

    let data = groups
        .into_iter()
        .map(|(level, values, titles)| {
            Trace::Bar(BarTrace {
                x: titles.into_iter().map(Datum::from).collect(),
                y: values.into_iter().map(Datum::from).collect(),
                name: Some(level.as_str().to_string()),
                marker: Some(Marker {
                    color: level.color().to_string(),
                }),
                ..BarTrace::default()
            })
        })
        .collect();

    let mut layout = Layout::with_axes(
        Axis {
            showticklabels: Some(false),
            titlefont: Some(Font { size: 16 }),
            ..Axis::titled(format!("Resources (n={})", means.len()))
        },
        Axis {
            titlefont: Some(Font { size: 16 }),
            ..Axis::titled(MEAN_SCORE_TITLE)
        },
    );
    layout.showlegend = Some(true);
    Chart::render(Figure { data, layout })
}

/// Heatmap of mean score per (digital object, metric) for one project.
///
/// Columns enumerate every metric of every assessment of every object in
/// the project; each cell is queried on its own.
///
/// # Errors
/// - `NotFound` when the project does not exist.
pub fn table_plot(conn: &Connection, project: ProjectId) -> StatsResult<Chart> {
    let catalog = SqliteCatalogRepository::new(conn);
    let assessments = SqliteAssessmentRepository::new(conn);

    if catalog.get_project(project)?.is_none() {
        return Err(StatsError::NotFound {
            entity: "project",
            id: project,
        });
    }

    let objects = catalog.list_project_objects(project)?;
    let mut metric_titles = Vec::new();
    let mut object_titles = Vec::with_capacity(objects.len());
    let mut scores = Vec::with_capacity(objects.len());

    for object in &objects {
        object_titles.push(object.title.clone());
        let mut row = Vec::new();
        for assessment in assessments.list_assessments_for_target(object.id)? {
            let Some(rubric) = catalog.get_rubric(assessment.rubric)? else {
                continue;
            };
            for metric_id in rubric.metrics {
                let Some(metric) = catalog.get_metric(metric_id)? else {
                    continue;
                };
                metric_titles.push(metric.title);
                let mean: Option<f64> = conn.query_row(
                    "SELECT AVG(ans.answer)
                     FROM answers ans
                     JOIN assessments a ON a.id = ans.assessment_id
                     WHERE ans.metric_id = ?1 AND a.target_id = ?2",
                    params![metric_id, object.id],
                    |row| row.get(0),
                )?;
                row.push(mean);
            }
        }
        scores.push(row);
    }

    let layout = Layout::with_axes(
        Axis {
            ticks: Some(String::new()),
            showticklabels: Some(false),
            automargin: Some(true),
            ..Axis::titled("Metrics")
        },
        Axis {
            ticks: Some(String::new()),
            showticklabels: Some(true),
            automargin: Some(true),
            ..Axis::titled("Digital Objects")
        },
    );
    Chart::render(Figure {
        data: vec![Trace::Heatmap(HeatmapTrace {
            z: scores,
            x: metric_titles,
            y: object_titles,
        })],
        layout,
    })
}

/// One subplot row per rubric showing the mean score per metric.
///
/// Every x axis hides its tick labels. The axis title is applied once, to
/// the axis of the last rubric row.
///
/// # Errors
/// - `EmptyAggregate` when no rubric is used in scope.
pub fn rubrics_by_metrics_breakdown(
    conn: &Connection,
    scope: &AnswerScope,
) -> StatsResult<Chart> {
    let rubrics = rubrics_in_scope(conn, scope)?;
    if rubrics.is_empty() {
        return Err(StatsError::EmptyAggregate("rubrics by metrics breakdown"));
    }

    let rows = rubrics.len();
    let spacing = SUBPLOT_VERTICAL_SPACING / rows as f64;
    let row_height = (1.0 - spacing * (rows as f64 - 1.0)) / rows as f64;

    let mut figure = Figure::default();
    let mut last_xaxis = String::from("xaxis");
    for (index, (rubric_id, rubric_title)) in rubrics.into_iter().enumerate() {
        let (metrics, means) = metric_means(conn, &scope.with_rubric(rubric_id))?;
        let suffix = if index == 0 {
            String::new()
        } else {
            (index + 1).to_string()
        };

        figure.data.push(Trace::Bar(BarTrace {
            x: metrics.into_iter().map(Datum::from).collect(),
            y: means.into_iter().map(Datum::from).collect(),
            name: Some(rubric_title),
            xaxis: Some(format!("x{suffix}")),
            yaxis: Some(format!("y{suffix}")),
            ..BarTrace::default()
        }));

        let top = 1.0 - index as f64 * (row_height + spacing);
        let yaxis = figure.layout.axis_mut(&format!("yaxis{suffix}"));
        yaxis.domain = Some([(top - row_height).max(0.0), top]);
        yaxis.anchor = Some(format!("x{suffix}"));

        last_xaxis = format!("xaxis{suffix}");
        let xaxis = figure.layout.axis_mut(&last_xaxis);
        xaxis.domain = Some([0.0, 1.0]);
        xaxis.anchor = Some(format!("y{suffix}"));
        xaxis.showticklabels = Some(false);
    }

    let xaxis = figure.layout.axis_mut(&last_xaxis);
    xaxis.title = Some("Mean FAIR Score by Metric".to_string());
    xaxis.titlefont = Some(Font { size: 16 });

    Chart::render(figure)
}

fn metric_means(conn: &Connection, scope: &AnswerScope) -> StatsResult<(Vec<String>, Vec<f64>)> {
    let filter = scope.answer_filter();
    let sql = format!(
        "SELECT m.title, AVG(ans.answer)
         FROM assessments a
         JOIN answers ans ON ans.assessment_id = a.id
         JOIN metrics m ON m.id = ans.metric_id
         WHERE 1 = 1{}
         GROUP BY m.title
         ORDER BY m.title",
        filter.sql
    );
    let mut stmt = conn.prepare(&sql)?;
    let binds: Vec<Value> = filter.binds;
    let rows = stmt.query_map(params_from_iter(binds), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;
    let mut titles = Vec::new();
    let mut means = Vec::new();
    for row in rows {
        let (title, mean) = row?;
        titles.push(title);
        means.push(mean);
    }
    Ok((titles, means))
}

#[cfg(test)]
mod tests {
    use super::score_histogram;
    use crate::stats::chart::{Datum, Trace};

    fn bucket_scores(values: &[f64]) -> Vec<f64> {
        let chart = score_histogram(values).unwrap().expect("chart expected");
        match &chart.figure.data[0] {
            Trace::Bar(bar) => bar
                .x
                .iter()
                .map(|datum| match datum {
                    Datum::Number(value) => *value,
                    Datum::Text(text) => panic!("unexpected label {text}"),
                })
                .collect(),
            other => panic!("unexpected trace {other:?}"),
        }
    }

    #[test]
    fn histogram_pads_canonical_buckets_but_not_maybe() {
        assert_eq!(bucket_scores(&[0.0, 1.0, 1.0]), vec![0.0, 0.25, 0.75, 1.0]);
        assert_eq!(
            bucket_scores(&[0.5, 1.0]),
            vec![0.0, 0.25, 0.5, 0.75, 1.0]
        );
        assert_eq!(
            bucket_scores(&[0.6, 0.9]),
            vec![0.0, 0.25, 0.6, 0.75, 0.9, 1.0]
        );
    }

    #[test]
    fn histogram_counts_responses_per_bucket() {
        let chart = score_histogram(&[1.0, 1.0, 0.0]).unwrap().unwrap();
        let Trace::Bar(bar) = &chart.figure.data[0] else {
            panic!("bar trace expected");
        };
        assert_eq!(
            bar.y,
            vec![
                Datum::Number(1.0),
                Datum::Number(0.0),
                Datum::Number(0.0),
                Datum::Number(2.0)
            ]
        );
    }

    #[test]
    fn histogram_is_suppressed_for_single_valued_or_empty_data() {
        assert!(score_histogram(&[]).unwrap().is_none());
        assert!(score_histogram(&[1.0, 1.0, 1.0]).unwrap().is_none());
    }
}
