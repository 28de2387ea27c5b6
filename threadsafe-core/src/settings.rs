use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use dirs::home_dir;

use crate::error::{Result, ThreadSafeError};

pub const PATH_ENV: &str = "THREAD_SAFE_PATH";
pub const TOKEN_ENV: &str = "THREAD_SAFE_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Top-level directory holding one subdirectory per saved thread.
    pub root: PathBuf,
    pub token: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::var_os(PATH_ENV), env::var_os(TOKEN_ENV), home_dir())
    }

    pub fn from_vars(
        path: Option<OsString>,
        token: Option<OsString>,
        home: Option<PathBuf>,
    ) -> Result<Self> {
        // Precedence:
        // 1) THREAD_SAFE_PATH, with a leading `~` expanded
        // 2) current directory
        let root = match path.filter(|path| !path.is_empty()) {
            Some(path) => expand_home(Path::new(&path), home.as_deref())?,
            None => PathBuf::from("."),
        };

        let token = token
            .map(|token| token.to_string_lossy().trim().to_string())
            .filter(|token| !token.is_empty());

        Ok(Self { root, token })
    }

    /// Applies command-line overrides on top of the environment.
    #[must_use]
    pub fn with_overrides(mut self, root: Option<PathBuf>, token: Option<String>) -> Self {
        if let Some(root) = root {
            self.root = root;
        }
        if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
            self.token = Some(token);
        }
        self
    }

    pub fn require_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or(ThreadSafeError::MissingToken { var: TOKEN_ENV })
    }
}

fn expand_home(path: &Path, home: Option<&Path>) -> Result<PathBuf> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home = home.ok_or(ThreadSafeError::HomeDirectoryNotFound)?;
    Ok(home.join(rest))
}
