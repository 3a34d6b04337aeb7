//! Remote archive access: FTP and local directory mirrors.

use log::{debug, info};
use std::fs;
use std::path::{Component, Path, PathBuf};
use suppaftp::types::FileType;
use suppaftp::FtpStream;

use super::{IngestError, IngestResult};

/// Minimal navigation surface the ingestion batch needs.
///
/// Semantics follow FTP: `change_dir` accepts absolute (`/a/b`) or relative
/// paths, `list` returns entry names of the current directory.
pub trait RemoteArchive {
    fn change_dir(&mut self, path: &str) -> IngestResult<()>;
    fn list(&mut self) -> IngestResult<Vec<String>>;
    fn download(&mut self, name: &str) -> IngestResult<Vec<u8>>;
}

/// Anonymous FTP session, reused serially for every study.
pub struct FtpArchive {
    stream: FtpStream,
}

impl FtpArchive {
    pub fn connect(host: &str, port: u16) -> IngestResult<Self> {
        info!("event=archive_connect module=ingest status=start host={host} port={port}");
        let mut stream = FtpStream::connect((host, port))?;
        stream.login("anonymous", "anonymous@")?;
        stream.transfer_type(FileType::Binary)?;
        info!("event=archive_connect module=ingest status=ok host={host}");
        Ok(Self { stream })
    }

    pub fn quit(mut self) -> IngestResult<()> {
        self.stream.quit()?;
        Ok(())
    }
}

impl RemoteArchive for FtpArchive {
    fn change_dir(&mut self, path: &str) -> IngestResult<()> {
        debug!("event=archive_cwd module=ingest path={path}");
        self.stream.cwd(path)?;
        Ok(())
    }

    fn list(&mut self) -> IngestResult<Vec<String>> {
        Ok(self.stream.nlst(None)?)
    }

    fn download(&mut self, name: &str) -> IngestResult<Vec<u8>> {
        debug!("event=archive_download module=ingest file={name}");
        Ok(self.stream.retr_as_buffer(name)?.into_inner())
    }
}

/// Archive backed by a local directory with the same layout as the remote.
///
/// Paths never escape `root`; `..` components are rejected.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
    cwd: PathBuf,
}

impl DirectoryArchive {
    pub fn new(root: impl Into<PathBuf>) -> IngestResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(IngestError::Archive(format!(
                "mirror directory `{}` does not exist",
                root.display()
            )));
        }
        Ok(Self {
            cwd: root.clone(),
            root,
        })
    }

    fn resolve(&self, path: &str) -> IngestResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return Err(IngestError::Archive(format!(
                "parent components are not allowed in `{path}`"
            )));
        }
        let base = if path.starts_with('/') {
            &self.root
        } else {
            &self.cwd
        };
        Ok(base.join(relative))
    }
}

impl RemoteArchive for DirectoryArchive {
    fn change_dir(&mut self, path: &str) -> IngestResult<()> {
        let target = self.resolve(path)?;
        if !target.is_dir() {
            return Err(IngestError::Archive(format!("no such directory `{path}`")));
        }
        self.cwd = target;
        Ok(())
    }

    fn list(&mut self) -> IngestResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.cwd)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn download(&mut self, name: &str) -> IngestResult<Vec<u8>> {
        Ok(fs::read(self.resolve(name)?)?)
    }
}
