use fairshake_core::db::open_db_in_memory;
use fairshake_core::model::assessment::{NewAnswer, NewAssessment};
use fairshake_core::model::catalog::{NewDigitalObject, NewMetric, NewProject, NewRubric};
use fairshake_core::stats::chart::{Datum, Trace};
use fairshake_core::stats::{
    digital_object_bar_breakdown, question_breakdown, rubric_pie_chart,
    rubrics_by_metrics_breakdown, rubrics_in_projects_overlay, score_histogram_for, single_query,
    table_plot, AnswerScope, ScopeKind,
};
use fairshake_core::{
    AnswerValue, AssessmentRepository, CatalogRepository, SqliteAssessmentRepository,
    SqliteCatalogRepository, StatsError,
};
use rusqlite::Connection;

struct Seeded {
    project: i64,
    empty_project: i64,
    unused_rubric: i64,
    unused_metric: i64,
    accessible: i64,
}

/// Two objects in one project; `Alpha` assessed under two rubrics.
fn seed(conn: &Connection) -> Seeded {
    let catalog = SqliteCatalogRepository::new(conn);
    let assessments = SqliteAssessmentRepository::new(conn);

    let author = catalog.create_author("maayanlab").unwrap();
    let project = catalog
        .create_project(&NewProject {
            title: "TOPMed".into(),
            authors: vec![author],
            ..NewProject::default()
        })
        .unwrap();
    let empty_project = catalog
        .create_project(&NewProject {
            title: "Empty".into(),
            ..NewProject::default()
        })
        .unwrap();

    let metric = |title: &str| {
        catalog
            .create_metric(&NewMetric {
                title: title.into(),
                ..NewMetric::default()
            })
            .unwrap()
    };
    let accessible = metric("Accessible");
    let findable = metric("Findable");
    let unused_metric = metric("Reusable");

    let rubric = |title: &str, metrics: Vec<i64>| {
        catalog
            .create_rubric(&NewRubric {
                title: title.into(),
                metrics,
                ..NewRubric::default()
            })
            .unwrap()
    };
    let dataset = rubric("Dataset", vec![accessible, findable]);
    let tool = rubric("Tool", vec![accessible]);
    let unused_rubric = rubric("Unused", vec![unused_metric]);

    let object = |title: &str| {
        catalog
            .create_digital_object(&NewDigitalObject {
                title: title.into(),
                projects: vec![project],
                authors: vec![author],
                ..NewDigitalObject::default()
            })
            .unwrap()
    };
    let alpha = object("Alpha");
    let beta = object("Beta");

    let assess = |target: i64, rubric: i64, answers: &[(i64, f64)]| {
        let assessment = assessments
            .create_assessment(&NewAssessment {
                project: Some(project),
                target,
                rubric,
                methodology: "user".into(),
                assessor: author,
            })
            .unwrap();
        for (metric, value) in answers {
            assessments
                .create_answer(&NewAnswer {
                    assessment,
                    metric: *metric,
                    answer: AnswerValue::new(*value).unwrap(),
                    comment: String::new(),
                })
                .unwrap();
        }
    };
    assess(alpha, dataset, &[(accessible, 1.0), (findable, 1.0)]);
    assess(beta, dataset, &[(accessible, 0.0), (findable, 0.25)]);
    assess(alpha, tool, &[(accessible, 0.75)]);

    Seeded {
        project,
        empty_project,
        unused_rubric,
        unused_metric,
        accessible,
    }
}

fn texts(data: &[Datum]) -> Vec<String> {
    data.iter()
        .map(|datum| match datum {
            Datum::Text(text) => text.clone(),
            Datum::Number(value) => value.to_string(),
        })
        .collect()
}

fn numbers(data: &[Datum]) -> Vec<f64> {
    data.iter()
        .map(|datum| match datum {
            Datum::Number(value) => *value,
            Datum::Text(text) => panic!("unexpected label {text}"),
        })
        .collect()
}

#[test]
fn pie_chart_counts_assessments_per_rubric() {
    let conn = open_db_in_memory().unwrap();
    let seeded = seed(&conn);

    let chart = rubric_pie_chart(&conn, &AnswerScope::project(seeded.project)).unwrap();
    let Trace::Pie(pie) = &chart.figure.data[0] else {
        panic!("pie trace expected");
    };
    assert_eq!(pie.labels, vec!["Dataset".to_string(), "Tool".to_string()]);
    assert_eq!(pie.values, vec![2, 1]);
    assert!(chart.html.contains("Plotly.newPlot("));

    assert!(matches!(
        rubric_pie_chart(&conn, &AnswerScope::project(seeded.empty_project)),
        Err(StatsError::EmptyAggregate(_))
    ));
}

#[test]
fn overlay_stacks_one_trace_per_rubric_sorted_by_count() {
    let conn = open_db_in_memory().unwrap();
    let seeded = seed(&conn);

    let chart = rubrics_in_projects_overlay(&conn, &AnswerScope::project(seeded.project)).unwrap();
    assert_eq!(chart.figure.layout.barmode.as_deref(), Some("stack"));

    let bars: Vec<_> = chart.figure.bar_traces().collect();
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].name.as_deref(), Some("Dataset"));
    assert_eq!(
        texts(&bars[0].x),
        vec!["yes (100%)", "no but (25%)", "no (0%)"]
    );
    assert_eq!(numbers(&bars[0].y), vec![2.0, 1.0, 1.0]);
    assert_eq!(bars[1].name.as_deref(), Some("Tool"));
    assert_eq!(texts(&bars[1].x), vec!["yes but (75%)"]);
}

#[test]
fn question_breakdown_divides_by_estimated_assessments() {
    let conn = open_db_in_memory().unwrap();
    let seeded = seed(&conn);

    let chart = question_breakdown(&conn, &AnswerScope::project(seeded.project)).unwrap();
    let bar = chart.figure.bar_traces().next().unwrap();
    assert_eq!(texts(&bar.x), vec!["Accessible", "Findable"]);

    // Five answers in scope: each sum is divided by 5 / 9.
    let means = numbers(&bar.y);
    assert!((means[0] - 1.75 * 9.0 / 5.0).abs() < 1e-9);
    assert!((means[1] - 1.25 * 9.0 / 5.0).abs() < 1e-9);

    assert!(matches!(
        question_breakdown(&conn, &AnswerScope::project(seeded.empty_project)),
        Err(StatsError::EmptyAggregate(_))
    ));
}

#[test]
fn digital_object_breakdown_groups_by_fair_level() {
    let conn = open_db_in_memory().unwrap();
    let seeded = seed(&conn);

    let chart =
        digital_object_bar_breakdown(&conn, &AnswerScope::project(seeded.project)).unwrap();
    let bars: Vec<_> = chart.figure.bar_traces().collect();
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].name.as_deref(), Some("Poor"));
    assert_eq!(texts(&bars[0].x), vec!["Beta"]);
    assert_eq!(bars[1].name.as_deref(), Some("Very FAIR"));
    assert_eq!(texts(&bars[1].x), vec!["Alpha"]);
    assert_eq!(
        bars[1].marker.as_ref().map(|marker| marker.color.as_str()),
        Some("rgba(0,0,214,1)")
    );

    let xaxis = chart.figure.layout.axis("xaxis").unwrap();
    assert_eq!(xaxis.title.as_deref(), Some("Resources (n=2)"));
    assert_eq!(chart.figure.layout.showlegend, Some(true));
}

#[test]
fn table_plot_has_one_row_per_object() {
    let conn = open_db_in_memory().unwrap();
    let seeded = seed(&conn);

    let chart = table_plot(&conn, seeded.project).unwrap();
    let Trace::Heatmap(heatmap) = &chart.figure.data[0] else {
        panic!("heatmap trace expected");
    };
    assert_eq!(heatmap.y, vec!["Alpha".to_string(), "Beta".to_string()]);
    assert_eq!(
        heatmap.x,
        vec!["Accessible", "Findable", "Accessible", "Accessible", "Findable"]
    );
    assert_eq!(
        heatmap.z,
        vec![
            vec![Some(0.875), Some(1.0), Some(0.875)],
            vec![Some(0.0), Some(0.25)],
        ]
    );

    assert!(matches!(
        table_plot(&conn, 9_999),
        Err(StatsError::NotFound {
            entity: "project",
            id: 9_999
        })
    ));
}

#[test]
fn rubrics_by_metrics_titles_only_the_last_axis() {
    let conn = open_db_in_memory().unwrap();
    let seeded = seed(&conn);

    let chart = rubrics_by_metrics_breakdown(&conn, &AnswerScope::all()).unwrap();
    let bars: Vec<_> = chart.figure.bar_traces().collect();
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].xaxis.as_deref(), Some("x"));
    assert_eq!(bars[1].xaxis.as_deref(), Some("x2"));
    assert_eq!(texts(&bars[0].x), vec!["Accessible", "Findable"]);

    let layout = &chart.figure.layout;
    assert_eq!(layout.axis("xaxis").unwrap().title, None);
    assert_eq!(
        layout.axis("xaxis2").unwrap().title.as_deref(),
        Some("Mean FAIR Score by Metric")
    );
    assert_eq!(layout.axis("xaxis").unwrap().showticklabels, Some(false));

    assert!(matches!(
        rubrics_by_metrics_breakdown(&conn, &AnswerScope::project(seeded.empty_project)),
        Err(StatsError::EmptyAggregate(_))
    ));
}

#[test]
fn histogram_for_metric_scope() {
    let conn = open_db_in_memory().unwrap();
    let seeded = seed(&conn);

    let chart = score_histogram_for(&conn, &AnswerScope::metric(seeded.accessible))
        .unwrap()
        .unwrap();
    let bar = chart.figure.bar_traces().next().unwrap();
    assert_eq!(numbers(&bar.x), vec![0.0, 0.25, 0.75, 1.0]);
    assert_eq!(numbers(&bar.y), vec![1.0, 0.0, 1.0, 1.0]);
}

#[test]
fn single_query_summarizes_project_scores() {
    let conn = open_db_in_memory().unwrap();
    let seeded = seed(&conn);
    let mut console: Vec<u8> = Vec::new();

    let report = single_query(&conn, ScopeKind::Project, seeded.project, &mut console)
        .unwrap()
        .unwrap();
    assert_eq!(report.summary.questions, 5);
    assert_eq!(report.summary.mean, 0.6);
    assert_eq!(report.summary.median, 0.75);
    assert!((report.summary.assessments - 5.0 / 9.0).abs() < 1e-9);
    assert!(report.histogram.is_some());

    let printed = String::from_utf8(console).unwrap();
    assert!(printed.starts_with(&format!(
        "Overall FAIR Evaluations for the project: TOPMed (project id: {})",
        seeded.project
    )));
    assert!(printed.contains("Median FAIR score: 0.75"));
    assert!(printed.contains("Total Questions Answered: 5"));
}

#[test]
fn single_query_returns_nothing_without_answers() {
    let conn = open_db_in_memory().unwrap();
    let seeded = seed(&conn);

    for (kind, id) in [
        (ScopeKind::Project, seeded.empty_project),
        (ScopeKind::Rubric, seeded.unused_rubric),
        (ScopeKind::Metric, seeded.unused_metric),
    ] {
        let mut console: Vec<u8> = Vec::new();
        let report = single_query(&conn, kind, id, &mut console).unwrap();
        assert!(report.is_none(), "{} {id} should be empty", kind.as_str());
        assert!(console.is_empty());
    }
}

#[test]
fn single_query_rejects_unknown_ids() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);

    let err = single_query(&conn, ScopeKind::Rubric, 9_999, &mut Vec::<u8>::new()).unwrap_err();
    assert!(matches!(
        err,
        StatsError::NotFound {
            entity: "rubric",
            id: 9_999
        }
    ));
}
