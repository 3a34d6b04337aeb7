//! Batch ingestion of study metadata from a remote archive.
//!
//! # Responsibility
//! - Walk the archive layout `<studies_root>/<study>/<version>/<descriptor>.xml`.
//! - Evaluate a fixed checklist of path/pattern rules against each descriptor.
//! - Persist one digital object, one assessment and the mapped answers per
//!   study.
//!
//! # Invariants
//! - Studies are processed sequentially over one archive session.
//! - A failing study is logged, recorded and skipped; the batch continues.
//! - Writes for one study are not wrapped in a transaction.

use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod archive;
pub mod checklist;
pub mod runner;
pub mod xpath;

pub use archive::{DirectoryArchive, FtpArchive, RemoteArchive};
pub use checklist::{dbgap_checklist, evaluate_descriptor, ChecklistRule, RuleOutcome, TITLE_RULE};
pub use runner::{IngestReport, IngestStage, Ingestor, StudyFailure, StudyRecord};
pub use xpath::{ElementPath, PathError};

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug)]
pub enum IngestError {
    Ftp(suppaftp::FtpError),
    Io(std::io::Error),
    /// Archive navigation outside the supported layout.
    Archive(String),
    NoVersionDirectory { study: String },
    MissingDescriptor { study: String },
    Encoding(std::string::FromUtf8Error),
    Xml(roxmltree::Error),
    Path(PathError),
    Pattern(regex::Error),
    Repo(RepoError),
    /// Reference data the run depends on is missing.
    Setup(String),
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ftp(err) => write!(f, "ftp error: {err}"),
            Self::Io(err) => write!(f, "archive i/o error: {err}"),
            Self::Archive(message) => write!(f, "archive error: {message}"),
            Self::NoVersionDirectory { study } => {
                write!(f, "no version directory found for study {study}")
            }
            Self::MissingDescriptor { study } => {
                write!(f, "no xml descriptor found for study {study}")
            }
            Self::Encoding(err) => write!(f, "descriptor is not valid utf-8: {err}"),
            Self::Xml(err) => write!(f, "invalid xml descriptor: {err}"),
            Self::Path(err) => write!(f, "{err}"),
            Self::Pattern(err) => write!(f, "invalid rule pattern: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Setup(message) => write!(f, "ingest setup failed: {message}"),
        }
    }
}

impl Error for IngestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Ftp(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Encoding(err) => Some(err),
            Self::Xml(err) => Some(err),
            Self::Path(err) => Some(err),
            Self::Pattern(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Archive(_)
            | Self::NoVersionDirectory { .. }
            | Self::MissingDescriptor { .. }
            | Self::Setup(_) => None,
        }
    }
}

impl From<suppaftp::FtpError> for IngestError {
    fn from(value: suppaftp::FtpError) -> Self {
        Self::Ftp(value)
    }
}

impl From<std::io::Error> for IngestError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<std::string::FromUtf8Error> for IngestError {
    fn from(value: std::string::FromUtf8Error) -> Self {
        Self::Encoding(value)
    }
}

impl From<roxmltree::Error> for IngestError {
    fn from(value: roxmltree::Error) -> Self {
        Self::Xml(value)
    }
}

impl From<PathError> for IngestError {
    fn from(value: PathError) -> Self {
        Self::Path(value)
    }
}

impl From<regex::Error> for IngestError {
    fn from(value: regex::Error) -> Self {
        Self::Pattern(value)
    }
}

impl From<RepoError> for IngestError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
