use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OutlineError>;

/// Failures at the edges: file input, config, globs.
/// Extraction itself never fails.
#[derive(Error, Debug)]
pub enum OutlineError {
    #[error("{}: not found{}", path.display(), did_you_mean(suggestion.as_deref()))]
    NotFound {
        path: PathBuf,
        suggestion: Option<String>,
    },

    #[error("{}: permission denied", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: binary file, not markdown", path.display())]
    Binary { path: PathBuf },

    #[error("config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("invalid glob \"{pattern}\": {reason}")]
    InvalidGlob { pattern: String, reason: String },
}

fn did_you_mean(suggestion: Option<&str>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean {s}?)"),
        None => String::new(),
    }
}
