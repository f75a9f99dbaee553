//! Error types shared by the preprocessing pipeline and the visualization
//! adapter.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A file or directory the caller pointed at does not exist.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Artifacts were loaded fine but do not describe the same corpus.
    #[error("mismatched artifacts: {0}")]
    Mismatch(String),

    /// An output was requested before the step producing it ran.
    #[error("{0} has not been generated yet")]
    NotGenerated(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify an I/O failure on `path`, turning a missing file into
    /// [`Error::NotFound`].
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Error::NotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io(err),
        }
    }

    pub fn parse<S: Into<String>>(path: &Path, line: usize, message: S) -> Self {
        Error::Parse {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    pub fn mismatch<S: Into<String>>(message: S) -> Self {
        Error::Mismatch(message.into())
    }

    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Error::InvalidArgument(message.into())
    }
}
