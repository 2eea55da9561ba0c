//! Errors raised outside the pure core: files, templates, prompts.
//!
//! Normalization and totals never fail; anything in here comes from the
//! surroundings of a proposal rather than its contents.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode proposal: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{} is not valid TOML: {source}", .path.display())]
    TomlDecode {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to encode settings: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error(transparent)]
    Prompt(#[from] inquire::InquireError),

    #[error("no proposals found in {}", .0.display())]
    NoProposals(PathBuf),

    #[error("typst could not compile {}", .0.display())]
    Compile(PathBuf),
}

impl AppError {
    /// Adapter for `map_err` that attaches the path an I/O call worked on.
    pub fn io(path: &Path) -> impl FnOnce(std::io::Error) -> AppError + '_ {
        move |source| AppError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            AppError::Prompt(
                inquire::InquireError::OperationCanceled
                    | inquire::InquireError::OperationInterrupted
            )
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_name_the_path() {
        let err = AppError::io(Path::new("/tmp/missing.json"))(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        assert_eq!(err.to_string(), "I/O error at /tmp/missing.json: gone");
    }

    #[test]
    fn cancelled_prompts_are_recognised() {
        assert!(AppError::Prompt(inquire::InquireError::OperationCanceled).is_cancelled());
        assert!(!AppError::NoProposals(PathBuf::from("x")).is_cancelled());
    }
}
