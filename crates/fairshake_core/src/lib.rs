//! Core domain logic for FAIRshake.
//! Permissions, score reports and metadata ingestion over one SQLite store.

pub mod config;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod permission;
pub mod repo;
pub mod stats;

pub use config::{ArchiveKind, ConfigError, FairshakeConfig, IngestConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use ingest::{IngestError, IngestReport, Ingestor};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::answer::AnswerValue;
pub use model::author::{Actor, Author, AuthorId};
pub use permission::{
    authorize, has_permission, AccessRequest, Action, Decision, Method, ResourcePermission,
    RuleSet,
};
pub use repo::assessment_repo::{AssessmentRepository, SqliteAssessmentRepository};
pub use repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
pub use repo::{RepoError, RepoResult};
pub use stats::{single_query, Chart, ScopeKind, StatsError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
