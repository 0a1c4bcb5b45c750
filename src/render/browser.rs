use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ScrapeError;

/// Executable names tried, in order, when no explicit path is configured.
pub const SEARCH_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// How to find the browser binary.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserLocator {
    /// Use this file; fail if it does not exist.
    Explicit(PathBuf),
    /// First of these names found on `PATH`.
    Search(Vec<String>),
}

impl BrowserLocator {
    pub fn from_option(path: Option<PathBuf>) -> Self {
        match path {
            Some(p) => Self::Explicit(p),
            None => Self::default(),
        }
    }

    pub fn locate(&self) -> Result<PathBuf, ScrapeError> {
        match self {
            Self::Explicit(path) => {
                if path.is_file() {
                    Ok(path.clone())
                } else {
                    Err(ScrapeError::RenderDriverNotFound(format!(
                        "{} does not exist",
                        path.display()
                    )))
                }
            }
            Self::Search(names) => search(names, None),
        }
    }
}

impl Default for BrowserLocator {
    fn default() -> Self {
        Self::Search(SEARCH_NAMES.iter().map(|s| s.to_string()).collect())
    }
}

/// Look each name up on `PATH`, or in `dirs` (a `PATH`-style list) when given.
fn search(names: &[String], dirs: Option<&std::ffi::OsStr>) -> Result<PathBuf, ScrapeError> {
    for name in names {
        let found = match dirs {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| Path::new(".").into());
                which::which_in(name, Some(paths), cwd)
            }
            None => which::which(name),
        };
        if let Ok(path) = found {
            debug!("Browser found: {}", path.display());
            return Ok(path);
        }
    }
    Err(ScrapeError::RenderDriverNotFound(format!(
        "none of [{}] on PATH; set browser_path (--browser-path)",
        names.join(", ")
    )))
}
