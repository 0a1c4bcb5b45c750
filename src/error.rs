use std::path::PathBuf;
use std::time::Duration;

/// Exit status for a run that found nothing to export.
pub const EXIT_NO_RECORDS: u8 = 1;
/// Exit status for every other fatal condition.
pub const EXIT_FAILURE: u8 = 2;

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("page did not become ready within {}s: {url}", .timeout.as_secs())]
    RenderTimeout { url: String, timeout: Duration },

    #[error("browser binary not found: {0}")]
    RenderDriverNotFound(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("no bookcases found on the page")]
    NoRecordsFound,

    #[error("malformed coord_gps {value:?} on record {id}")]
    MalformedCoordinate { id: i64, value: String },

    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl ScrapeError {
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NoRecordsFound => EXIT_NO_RECORDS,
            _ => EXIT_FAILURE,
        }
    }
}

impl From<config::ConfigError> for ScrapeError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

/// One embedded literal that could not be turned into a record.
///
/// Collected during extraction and reported; never aborts a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordParseFailure {
    pub error: String,
    pub text: String,
}
