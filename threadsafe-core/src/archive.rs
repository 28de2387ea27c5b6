use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, ThreadSafeError};
use crate::model::{ArchiveSummary, Thread};

pub const JSON_FILE_NAME: &str = "thread.json";
pub const HTML_FILE_NAME: &str = "thread.html";
pub const ATTACHMENTS_DIR_NAME: &str = "attachments";

/// Directory holding the files of one saved thread: `<root>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDir {
    root: PathBuf,
    path: PathBuf,
}

impl ArchiveDir {
    /// Spaces in `name` become underscores.
    pub fn new(root: impl Into<PathBuf>, name: &str) -> Result<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || trimmed.contains(['/', '\\'])
        {
            return Err(ThreadSafeError::InvalidThreadName(name.to_string()));
        }

        let root = root.into();
        let path = root.join(trimmed.replace(' ', "_"));
        Ok(Self { root, path })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn create(&self) -> Result<()> {
        create_dir_all(&self.path)
    }

    pub fn join(&self, subpath: impl AsRef<Path>) -> PathBuf {
        self.path.join(subpath)
    }

    pub fn json_path(&self) -> PathBuf {
        self.join(JSON_FILE_NAME)
    }

    pub fn html_path(&self) -> PathBuf {
        self.join(HTML_FILE_NAME)
    }

    pub fn attachments_dir(&self) -> PathBuf {
        self.join(ATTACHMENTS_DIR_NAME)
    }

    pub fn ensure_absent(&self) -> Result<()> {
        if self.exists() {
            return Err(ThreadSafeError::ArchiveExists {
                path: self.path.clone(),
            });
        }
        Ok(())
    }

    pub fn ensure_present(&self) -> Result<()> {
        if !self.exists() {
            return Err(ThreadSafeError::ArchiveNotFound {
                path: self.path.clone(),
            });
        }
        Ok(())
    }
}

impl Thread {
    /// Writes `thread.json`, creating the archive directory if needed.
    pub fn to_json(&self, dir: &ArchiveDir) -> Result<PathBuf> {
        dir.create()?;

        let bytes =
            serde_json::to_vec(self).map_err(|err| ThreadSafeError::Serialization(err.to_string()))?;
        let path = dir.json_path();
        write_file(&path, &bytes)?;
        debug!("wrote {}", path.display());
        Ok(path)
    }

    pub fn load(dir: &ArchiveDir) -> Result<Self> {
        Self::from_json_file(&dir.json_path())
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| ThreadSafeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_slice(&bytes).map_err(|source| ThreadSafeError::InvalidThreadFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Saved threads directly below `root`, sorted by directory name.
///
/// Directories without a readable `thread.json` are skipped.
pub fn list_archives(root: &Path) -> Result<Vec<ArchiveSummary>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut summaries = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry under {}: {err}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let json_path = entry.path().join(JSON_FILE_NAME);
        if !json_path.is_file() {
            continue;
        }

        match Thread::from_json_file(&json_path) {
            Ok(thread) => summaries.push(ArchiveSummary::from_thread(entry.path(), &thread)),
            Err(err) => warn!("skipping {}: {err}", entry.path().display()),
        }
    }

    Ok(summaries)
}

pub(crate) fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| ThreadSafeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|source| ThreadSafeError::Io {
        path: path.to_path_buf(),
        source,
    })
}
