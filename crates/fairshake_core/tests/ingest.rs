use fairshake_core::db::open_db_in_memory;
use fairshake_core::ingest::{dbgap_checklist, DirectoryArchive, IngestStage};
use fairshake_core::model::catalog::{NewMetric, NewProject, NewRubric};
use fairshake_core::{
    AnswerValue, ArchiveKind, AssessmentRepository, CatalogRepository, IngestConfig, IngestError,
    Ingestor, SqliteAssessmentRepository, SqliteCatalogRepository,
};
use rusqlite::Connection;
use std::fs;
use std::path::Path;

const FULL_DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<GaPExchange>
  <Studies>
    <Study accession="phs000001.v2.p1" source="dbGaP">
      <Configuration>
        <StudyNameEntrez>Heart Study v2</StudyNameEntrez>
        <Documents><Document/></Documents>
      </Configuration>
      <MetaVariables><Submitter><Method>Cohort</Method></Submitter></MetaVariables>
    </Study>
  </Studies>
  <DacInfo><DacEmail>dac@example.org</DacEmail></DacInfo>
  <Publications><Publication/></Publications>
</GaPExchange>"#;

const STALE_DESCRIPTOR: &str =
    r#"<GaPExchange><Studies><Study><StudyNameEntrez>Heart Study v1</StudyNameEntrez></Study></Studies></GaPExchange>"#;

const UNTITLED_DESCRIPTOR: &str =
    r#"<GaPExchange><Studies><Study accession="phs000003.v1.p1"/></Studies></GaPExchange>"#;

struct Reference {
    assessor: i64,
    project: i64,
    rubric: i64,
}

fn seed_reference(conn: &Connection, metric_count: usize) -> Reference {
    let catalog = SqliteCatalogRepository::new(conn);
    let assessor = catalog.create_author("maayanlab").unwrap();
    let project = catalog
        .create_project(&NewProject {
            title: "TOPMed".into(),
            ..NewProject::default()
        })
        .unwrap();
    let mut metrics = Vec::new();
    for index in 1..=metric_count {
        metrics.push(
            catalog
                .create_metric(&NewMetric {
                    title: format!("Metric {index}"),
                    ..NewMetric::default()
                })
                .unwrap(),
        );
    }
    let rubric = catalog
        .create_rubric(&NewRubric {
            title: "Dataset".into(),
            metrics,
            ..NewRubric::default()
        })
        .unwrap();
    Reference {
        assessor,
        project,
        rubric,
    }
}

fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn mirror() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_file(
        root,
        "dbgap/studies/phs000001/phs000001.v1.p1/GapExchange_phs000001.v1.p1.xml",
        STALE_DESCRIPTOR,
    );
    write_file(
        root,
        "dbgap/studies/phs000001/phs000001.v2.p1/GapExchange_phs000001.v2.p1.xml",
        FULL_DESCRIPTOR,
    );
    write_file(
        root,
        "dbgap/studies/phs000002/phs000002.v1.p1/README.txt",
        "no descriptor here",
    );
    write_file(
        root,
        "dbgap/studies/phs000003/phs000003.v1.p1/GapExchange_phs000003.v1.p1.xml",
        UNTITLED_DESCRIPTOR,
    );
    dir
}

fn settings(reference: &Reference, mirror: &Path) -> IngestConfig {
    IngestConfig {
        studies: ["phs000001", "phs000002", "phs000004", "phs000003"]
            .iter()
            .map(|study| study.to_string())
            .collect(),
        project_id: reference.project,
        rubric_id: reference.rubric,
        archive: ArchiveKind::Directory,
        mirror_dir: Some(mirror.to_path_buf()),
        ..IngestConfig::default()
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn failing_studies_are_skipped_and_the_batch_continues() {
    let conn = open_db_in_memory().unwrap();
    let reference = seed_reference(&conn, 29);
    let mirror = mirror();
    let ingestor = Ingestor::new(
        SqliteCatalogRepository::new(&conn),
        SqliteAssessmentRepository::new(&conn),
        settings(&reference, mirror.path()),
        dbgap_checklist().unwrap(),
    );

    let mut archive = DirectoryArchive::new(mirror.path()).unwrap();
    let report = ingestor.run(&mut archive).unwrap();

    let created: Vec<_> = report.created.iter().map(|r| r.study.as_str()).collect();
    assert_eq!(created, vec!["phs000001", "phs000003"]);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].study, "phs000002");
    assert_eq!(report.failures[0].stage, IngestStage::Fetch);
    assert!(report.failures[0].error.contains("no xml descriptor"));
    assert_eq!(report.failures[1].study, "phs000004");
    assert_eq!(report.failures[1].stage, IngestStage::Fetch);
    assert!(!report.is_clean());

    assert_eq!(count(&conn, "digital_objects"), 2);
    assert_eq!(count(&conn, "assessments"), 2);
    assert_eq!(count(&conn, "answers"), 18);
}

#[test]
fn ingested_study_uses_latest_version_and_checklist_answers() {
    let conn = open_db_in_memory().unwrap();
    let reference = seed_reference(&conn, 29);
    let mirror = mirror();
    let catalog = SqliteCatalogRepository::new(&conn);
    let assessments = SqliteAssessmentRepository::new(&conn);
    let ingestor = Ingestor::new(
        SqliteCatalogRepository::new(&conn),
        SqliteAssessmentRepository::new(&conn),
        settings(&reference, mirror.path()),
        dbgap_checklist().unwrap(),
    );

    let report = ingestor
        .run(&mut DirectoryArchive::new(mirror.path()).unwrap())
        .unwrap();
    let record = &report.created[0];
    assert_eq!(record.answers, 9);

    let object = catalog.get_digital_object(record.object_id).unwrap().unwrap();
    assert_eq!(object.title, "Heart Study v2");
    assert_eq!(
        object.url,
        "ftp://ftp.ncbi.nlm.nih.gov/dbgap/studies/phs000001/"
    );
    assert_eq!(object.kind, "data");
    assert_eq!(object.tags, "DCPPC");
    assert_eq!(object.projects, vec![reference.project]);
    assert_eq!(object.authors, vec![reference.assessor]);

    let assessment = assessments
        .get_assessment(record.assessment_id)
        .unwrap()
        .unwrap();
    assert_eq!(assessment.methodology, "auto");
    assert_eq!(assessment.assessor, reference.assessor);
    assert_eq!(assessment.project, Some(reference.project));
    assert_eq!(assessment.rubric, reference.rubric);

    let answers = assessments.list_answers(record.assessment_id).unwrap();
    let answer_for = |metric: i64| {
        answers
            .iter()
            .find(|answer| answer.metric == metric)
            .unwrap()
    };
    assert_eq!(answer_for(21).answer, AnswerValue::YES);
    assert_eq!(answer_for(23).comment, "Cohort");
    assert_eq!(answer_for(27).answer, AnswerValue::YES);
    assert_eq!(answer_for(27).comment, "dac@example.org");
    assert_eq!(answer_for(28).answer, AnswerValue::YES);
    assert_eq!(answer_for(29).answer, AnswerValue::NO);
    assert_eq!(answer_for(29).comment, ".//AuthorizedAccess/Policy");

    // Blank title falls back to the study id.
    let untitled = catalog
        .get_digital_object(report.created[1].object_id)
        .unwrap()
        .unwrap();
    assert_eq!(untitled.title, "phs000003");
}

#[test]
fn missing_reference_data_aborts_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let reference = seed_reference(&conn, 20);
    let mirror = mirror();
    let ingestor = Ingestor::new(
        SqliteCatalogRepository::new(&conn),
        SqliteAssessmentRepository::new(&conn),
        settings(&reference, mirror.path()),
        dbgap_checklist().unwrap(),
    );

    let err = ingestor
        .run(&mut DirectoryArchive::new(mirror.path()).unwrap())
        .unwrap_err();
    match err {
        IngestError::Setup(message) => assert!(message.contains("metric 21")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(count(&conn, "digital_objects"), 0);
}

#[test]
fn unknown_assessor_is_a_setup_error() {
    let conn = open_db_in_memory().unwrap();
    let reference = seed_reference(&conn, 29);
    let mirror = mirror();
    let mut config = settings(&reference, mirror.path());
    config.assessor = "someone-else".into();
    let ingestor = Ingestor::new(
        SqliteCatalogRepository::new(&conn),
        SqliteAssessmentRepository::new(&conn),
        config,
        dbgap_checklist().unwrap(),
    );

    assert!(matches!(
        ingestor.run(&mut DirectoryArchive::new(mirror.path()).unwrap()),
        Err(IngestError::Setup(_))
    ));
}
