//! Catalog repository: authors, projects, digital objects, rubrics, metrics.
//!
//! # Invariants
//! - Link rows (authors, project membership, rubric metrics) are written in
//!   the same call as their owner but not inside one transaction.
//! - Rubric metrics are always returned in rubric position order.

use crate::model::author::{Author, AuthorId};
use crate::model::catalog::{
    DigitalObject, DigitalObjectId, Metric, MetricId, NewDigitalObject, NewMetric, NewProject,
    NewRubric, Project, ProjectId, Rubric, RubricId,
};
use crate::model::ValidationError;
use crate::repo::{query_ids, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for catalog resources.
pub trait CatalogRepository {
    fn create_author(&self, username: &str) -> RepoResult<AuthorId>;
    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>>;
    fn find_author_by_username(&self, username: &str) -> RepoResult<Option<Author>>;

    fn create_project(&self, project: &NewProject) -> RepoResult<ProjectId>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;

    fn create_digital_object(&self, object: &NewDigitalObject) -> RepoResult<DigitalObjectId>;
    fn get_digital_object(&self, id: DigitalObjectId) -> RepoResult<Option<DigitalObject>>;
    fn add_object_to_project(&self, object: DigitalObjectId, project: ProjectId)
        -> RepoResult<()>;
    fn add_object_author(&self, object: DigitalObjectId, author: AuthorId) -> RepoResult<()>;
    fn list_project_objects(&self, project: ProjectId) -> RepoResult<Vec<DigitalObject>>;

    fn create_metric(&self, metric: &NewMetric) -> RepoResult<MetricId>;
    fn get_metric(&self, id: MetricId) -> RepoResult<Option<Metric>>;

    fn create_rubric(&self, rubric: &NewRubric) -> RepoResult<RubricId>;
    fn get_rubric(&self, id: RubricId) -> RepoResult<Option<Rubric>>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn link_authors(&self, sql: &str, owner: i64, authors: &[AuthorId]) -> RepoResult<()> {
        for author in authors {
            self.conn.execute(sql, params![owner, author])?;
        }
        Ok(())
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn create_author(&self, username: &str) -> RepoResult<AuthorId> {
        if username.trim().is_empty() {
            return Err(ValidationError::EmptyUsername.into());
        }
        self.conn.execute(
            "INSERT INTO authors (username) VALUES (?1);",
            [username.trim()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>> {
        let author = self
            .conn
            .query_row(
                "SELECT id, username FROM authors WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Author {
                        id: row.get(0)?,
                        username: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(author)
    }

    fn find_author_by_username(&self, username: &str) -> RepoResult<Option<Author>> {
        let author = self
            .conn
            .query_row(
                "SELECT id, username FROM authors WHERE username = ?1;",
                [username],
                |row| {
                    Ok(Author {
                        id: row.get(0)?,
                        username: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(author)
    }

    fn create_project(&self, project: &NewProject) -> RepoResult<ProjectId> {
        project.validate()?;
        self.conn.execute(
            "INSERT INTO projects (title, description, url) VALUES (?1, ?2, ?3);",
            params![project.title, project.description, project.url],
        )?;
        let id = self.conn.last_insert_rowid();
        self.link_authors(
            "INSERT OR IGNORE INTO project_authors (project_id, author_id) VALUES (?1, ?2);",
            id,
            &project.authors,
        )?;
        Ok(id)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let row = self
            .conn
            .query_row(
                "SELECT title, description, url FROM projects WHERE id = ?1;",
                [id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((title, description, url)) = row else {
            return Ok(None);
        };
        Ok(Some(Project {
            id,
            title,
            description,
            url,
            authors: query_ids(
                self.conn,
                "SELECT author_id FROM project_authors WHERE project_id = ?1 ORDER BY author_id;",
                id,
            )?,
        }))
    }

    fn create_digital_object(&self, object: &NewDigitalObject) -> RepoResult<DigitalObjectId> {
        object.validate()?;
        self.conn.execute(
            "INSERT INTO digital_objects (title, url, type, tags) VALUES (?1, ?2, ?3, ?4);",
            params![object.title, object.url, object.kind, object.tags],
        )?;
        let id = self.conn.last_insert_rowid();
        for project in &object.projects {
            self.add_object_to_project(id, *project)?;
        }
        for author in &object.authors {
            self.add_object_author(id, *author)?;
        }
        Ok(id)
    }

    fn get_digital_object(&self, id: DigitalObjectId) -> RepoResult<Option<DigitalObject>> {
        let row = self
            .conn
            .query_row(
                "SELECT title, url, type, tags FROM digital_objects WHERE id = ?1;",
                [id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        let Some((title, url, kind, tags)) = row else {
            return Ok(None);
        };
        Ok(Some(DigitalObject {
            id,
            title,
            url,
            kind,
            tags,
            projects: query_ids(
                self.conn,
                "SELECT project_id FROM digital_object_projects WHERE object_id = ?1 ORDER BY project_id;",
                id,
            )?,
            authors: query_ids(
                self.conn,
                "SELECT author_id FROM digital_object_authors WHERE object_id = ?1 ORDER BY author_id;",
                id,
            )?,
        }))
    }

    fn add_object_to_project(
        &self,
        object: DigitalObjectId,
        project: ProjectId,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO digital_object_projects (object_id, project_id) VALUES (?1, ?2);",
            params![object, project],
        )?;
        Ok(())
    }

    fn add_object_author(&self, object: DigitalObjectId, author: AuthorId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO digital_object_authors (object_id, author_id) VALUES (?1, ?2);",
            params![object, author],
        )?;
        Ok(())
    }

    fn list_project_objects(&self, project: ProjectId) -> RepoResult<Vec<DigitalObject>> {
        let ids = query_ids(
            self.conn,
            "SELECT object_id FROM digital_object_projects WHERE project_id = ?1 ORDER BY object_id;",
            project,
        )?;
        let mut objects = Vec::with_capacity(ids.len());
        for id in ids {
            let object = self.get_digital_object(id)?.ok_or_else(|| {
                RepoError::InvalidData(format!("dangling digital object link {id}"))
            })?;
            objects.push(object);
        }
        Ok(objects)
    }

    fn create_metric(&self, metric: &NewMetric) -> RepoResult<MetricId> {
        metric.validate()?;
        self.conn.execute(
            "INSERT INTO metrics (title, description) VALUES (?1, ?2);",
            params![metric.title, metric.description],
        )?;
        let id = self.conn.last_insert_rowid();
        self.link_authors(
            "INSERT OR IGNORE INTO metric_authors (metric_id, author_id) VALUES (?1, ?2);",
            id,
            &metric.authors,
        )?;
        Ok(id)
    }

    fn get_metric(&self, id: MetricId) -> RepoResult<Option<Metric>> {
        let row = self
            .conn
            .query_row(
                "SELECT title, description FROM metrics WHERE id = ?1;",
                [id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        let Some((title, description)) = row else {
            return Ok(None);
        };
        Ok(Some(Metric {
            id,
            title,
            description,
            authors: query_ids(
                self.conn,
                "SELECT author_id FROM metric_authors WHERE metric_id = ?1 ORDER BY author_id;",
                id,
            )?,
        }))
    }

    fn create_rubric(&self, rubric: &NewRubric) -> RepoResult<RubricId> {
        rubric.validate()?;
        self.conn.execute(
            "INSERT INTO rubrics (title, description) VALUES (?1, ?2);",
            params![rubric.title, rubric.description],
        )?;
        let id = self.conn.last_insert_rowid();
        for (position, metric) in rubric.metrics.iter().enumerate() {
            self.conn.execute(
                "INSERT INTO rubric_metrics (rubric_id, metric_id, position) VALUES (?1, ?2, ?3);",
                params![id, metric, position as i64],
            )?;
        }
        self.link_authors(
            "INSERT OR IGNORE INTO rubric_authors (rubric_id, author_id) VALUES (?1, ?2);",
            id,
            &rubric.authors,
        )?;
        Ok(id)
    }

    fn get_rubric(&self, id: RubricId) -> RepoResult<Option<Rubric>> {
        let row = self
            .conn
            .query_row(
                "SELECT title, description FROM rubrics WHERE id = ?1;",
                [id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        let Some((title, description)) = row else {
            return Ok(None);
        };
        Ok(Some(Rubric {
            id,
            title,
            description,
            metrics: query_ids(
                self.conn,
                "SELECT metric_id FROM rubric_metrics WHERE rubric_id = ?1 ORDER BY position, metric_id;",
                id,
            )?,
            authors: query_ids(
                self.conn,
                "SELECT author_id FROM rubric_authors WHERE rubric_id = ?1 ORDER BY author_id;",
                id,
            )?,
        }))
    }
}
