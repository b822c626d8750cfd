//! Error taxonomy for the staging pipeline.
//!
//! | Kind           | Meaning                                         | Effect                     |
//! |----------------|-------------------------------------------------|----------------------------|
//! | `Io`           | file unreadable/unwritable, path missing        | warning, run continues     |
//! | `Parse`        | malformed bundle artifact                       | that artifact is skipped   |
//! | `Precondition` | collision or attempt to delete the last copy    | file untouched, exit != 0  |

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type StageResult<T> = Result<T, StageError>;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("{op} failed for `{}`", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed bundle `{}`: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("{op} refused for `{path}`: {reason}")]
    Precondition {
        op: &'static str,
        path: String,
        reason: String,
    },
}

impl StageError {
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn precondition(
        op: &'static str,
        path: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self::Precondition {
            op,
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition { .. })
    }

    /// Full message including the underlying io cause, for one-line logging.
    pub fn detail(&self) -> String {
        match self {
            Self::Io { source, .. } => format!("{self}: {source}"),
            _ => self.to_string(),
        }
    }
}

/// Attach operation and path context to raw io results.
pub trait IoResultExt<T> {
    fn op(self, op: &'static str, path: &Path) -> StageResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    #[inline]
    fn op(self, op: &'static str, path: &Path) -> StageResult<T> {
        self.map_err(|err| StageError::io(op, path, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_error_display() {
        let err: StageResult<()> =
            Err(Error::new(ErrorKind::NotFound, "gone")).op("read", Path::new("data/app.js"));
        let err = err.unwrap_err();
        assert_eq!(err.to_string(), "read failed for `data/app.js`");
        assert!(err.detail().ends_with(": gone"));
        assert!(!err.is_precondition());
    }

    #[test]
    fn test_precondition_display() {
        let err = StageError::precondition("archive", "shared/utils.js", "destination exists");
        assert!(err.is_precondition());
        assert_eq!(
            err.to_string(),
            "archive refused for `shared/utils.js`: destination exists"
        );
    }

    #[test]
    fn test_parse_display() {
        let err = StageError::parse("bundle.js", "no asset markers found");
        assert!(err.to_string().contains("bundle.js"));
        assert!(err.to_string().contains("no asset markers"));
    }
}
