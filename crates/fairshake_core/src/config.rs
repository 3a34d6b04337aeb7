//! Runtime configuration loaded from TOML.
//!
//! Source precedence: explicit path, then `FAIRSHAKE_CONFIG`, then built-in
//! defaults. Relative paths resolve against the config file's directory (or
//! the working directory when running on defaults).

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::catalog::{ProjectId, RubricId};
use crate::permission::RuleSet;

const DEFAULT_CONFIG_ENV: &str = "FAIRSHAKE_CONFIG";

const DEFAULT_STUDIES: &[&str] = &[
    "phs000007",
    "phs000179",
    "phs000200",
    "phs000209",
    "phs000280",
    "phs000284",
    "phs000285",
    "phs000286",
    "phs000287",
    "phs000920",
    "phs000921",
    "phs000946",
    "phs000951",
    "phs000954",
    "phs000956",
    "phs000964",
    "phs000974",
    "phs000988",
    "phs000993",
    "phs000997",
    "phs001013",
    "phs001024",
    "phs001032",
    "phs001040",
    "phs001062",
    "phs001143",
    "phs001189",
    "phs001211",
];

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read configuration: {err}"),
            Self::Toml(err) => write!(f, "invalid configuration file: {err}"),
            Self::Invalid(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Toml(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Toml(value)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FairshakeConfig {
    pub database_path: PathBuf,
    pub logging: LoggingSettings,
    pub permissions: PermissionSettings,
    pub ingest: IngestConfig,
}

impl Default for FairshakeConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("fairshake.sqlite3"),
            logging: LoggingSettings::default(),
            permissions: PermissionSettings::default(),
            ingest: IngestConfig::default(),
        }
    }
}

impl FairshakeConfig {
    pub fn from_sources(cli_path: Option<&str>) -> ConfigResult<Self> {
        if let Some(path) = cli_path {
            if path.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "configuration path must not be empty".into(),
                ));
            }
        }
        let env_path = std::env::var(DEFAULT_CONFIG_ENV).ok();

        let config = if let Some(path) = cli_path {
            Self::load_from_path(path)?
        } else if let Some(path) = env_path.as_deref().filter(|p| !p.trim().is_empty()) {
            Self::load_from_path(path)?
        } else {
            let mut config = Self::default();
            config.normalize_paths(&std::env::current_dir()?);
            config
        };

        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let absolute_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let raw = fs::read_to_string(&absolute_path)?;
        let base = absolute_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::parse(&raw, &base)
    }

    /// Parses TOML text, resolving relative paths against `base`.
    pub fn parse(raw: &str, base: &Path) -> ConfigResult<Self> {
        let mut config: FairshakeConfig = toml::from_str(raw)?;
        config.normalize_paths(base);
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "database_path must not be empty".into(),
            ));
        }
        self.ingest.validate()
    }

    fn normalize_paths(&mut self, base: &Path) {
        if self.database_path.is_relative() {
            self.database_path = base.join(&self.database_path);
        }
        if self.logging.dir.is_relative() {
            self.logging.dir = base.join(&self.logging.dir);
        }
        if let Some(mirror) = &mut self.ingest.mirror_dir {
            if mirror.is_relative() {
                *mirror = base.join(&*mirror);
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Falls back to the build-mode default when unset.
    pub level: Option<String>,
    pub dir: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: None,
            dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PermissionSettings {
    pub rules: RuleSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveKind {
    Ftp,
    Directory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub host: String,
    pub port: u16,
    pub studies_root: String,
    pub studies: Vec<String>,
    pub project_id: ProjectId,
    pub rubric_id: RubricId,
    /// Username of the author recorded as assessor and object author.
    pub assessor: String,
    pub object_type: String,
    pub tags: String,
    pub archive: ArchiveKind,
    /// Local mirror root, required for `archive = "directory"`.
    pub mirror_dir: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            host: "ftp.ncbi.nlm.nih.gov".into(),
            port: 21,
            studies_root: "/dbgap/studies".into(),
            studies: DEFAULT_STUDIES.iter().map(|s| s.to_string()).collect(),
            project_id: 61,
            rubric_id: 8,
            assessor: "maayanlab".into(),
            object_type: "data".into(),
            tags: "DCPPC".into(),
            archive: ArchiveKind::Ftp,
            mirror_dir: None,
        }
    }
}

impl IngestConfig {
    /// `studies_root` with exactly one leading slash and no trailing slash.
    pub fn studies_root(&self) -> String {
        format!("/{}", self.studies_root.trim_matches('/'))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.studies.is_empty() {
            return Err(ConfigError::Invalid(
                "ingest.studies must list at least one study".into(),
            ));
        }
        if self.studies.iter().any(|study| study.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "ingest.studies must not contain empty ids".into(),
            ));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("ingest.host must not be empty".into()));
        }
        if self.assessor.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "ingest.assessor must not be empty".into(),
            ));
        }
        if self.archive == ArchiveKind::Directory && self.mirror_dir.is_none() {
            return Err(ConfigError::Invalid(
                "ingest.mirror_dir must be set when using the directory archive".into(),
            ));
        }
        Ok(())
    }
}
