use fairshake_core::db::open_db_in_memory;
use fairshake_core::model::catalog::{NewDigitalObject, NewMetric, NewProject, NewRubric};
use fairshake_core::model::ValidationError;
use fairshake_core::{CatalogRepository, RepoError, SqliteCatalogRepository};

#[test]
fn authors_are_unique_by_username() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::new(&conn);

    let id = repo.create_author("maayanlab").unwrap();
    let found = repo.find_author_by_username("maayanlab").unwrap().unwrap();
    assert_eq!(found.id, id);
    assert_eq!(repo.get_author(id).unwrap().unwrap().username, "maayanlab");

    assert!(repo.create_author("maayanlab").is_err());
    assert!(matches!(
        repo.create_author("   "),
        Err(RepoError::Validation(ValidationError::EmptyUsername))
    ));
    assert!(repo.find_author_by_username("nobody").unwrap().is_none());
}

#[test]
fn digital_object_links_projects_and_authors() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::new(&conn);
    let author = repo.create_author("maayanlab").unwrap();
    let project = repo
        .create_project(&NewProject {
            title: "TOPMed".into(),
            authors: vec![author],
            ..NewProject::default()
        })
        .unwrap();

    let object = repo
        .create_digital_object(&NewDigitalObject {
            title: "Framingham Cohort".into(),
            url: "ftp://ftp.ncbi.nlm.nih.gov/dbgap/studies/phs000007/".into(),
            kind: "data".into(),
            tags: "DCPPC".into(),
            projects: vec![project],
            authors: vec![author],
        })
        .unwrap();

    let loaded = repo.get_digital_object(object).unwrap().unwrap();
    assert_eq!(loaded.kind, "data");
    assert_eq!(loaded.projects, vec![project]);
    assert_eq!(loaded.authors, vec![author]);

    // Re-linking is a no-op.
    repo.add_object_to_project(object, project).unwrap();
    repo.add_object_author(object, author).unwrap();
    let listed = repo.list_project_objects(project).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, object);

    let project_row = repo.get_project(project).unwrap().unwrap();
    assert_eq!(project_row.authors, vec![author]);
}

#[test]
fn rubric_metrics_keep_position_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::new(&conn);

    let first = repo
        .create_metric(&NewMetric {
            title: "Has a license".into(),
            ..NewMetric::default()
        })
        .unwrap();
    let second = repo
        .create_metric(&NewMetric {
            title: "Has an identifier".into(),
            ..NewMetric::default()
        })
        .unwrap();

    let rubric = repo
        .create_rubric(&NewRubric {
            title: "Dataset rubric".into(),
            metrics: vec![second, first],
            ..NewRubric::default()
        })
        .unwrap();

    let loaded = repo.get_rubric(rubric).unwrap().unwrap();
    assert_eq!(loaded.metrics, vec![second, first]);
    assert_eq!(repo.get_metric(first).unwrap().unwrap().title, "Has a license");
}

#[test]
fn blank_titles_and_missing_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::new(&conn);

    let err = repo
        .create_project(&NewProject {
            title: " ".into(),
            ..NewProject::default()
        })
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptyTitle { .. })
    ));

    assert!(repo.get_project(404).unwrap().is_none());
    assert!(repo.get_digital_object(404).unwrap().is_none());
    assert!(repo.get_rubric(404).unwrap().is_none());
    assert!(repo.get_metric(404).unwrap().is_none());
}
