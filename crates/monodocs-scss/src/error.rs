//! Error types for stylesheet compilation.

use std::path::PathBuf;

/// Errors raised by the individual compilation stages.
#[derive(Debug, thiserror::Error)]
pub enum ScssError {
    #[error("Could not find ending bracket for :global( at start {start}")]
    MalformedGlobal { start: usize },

    #[error("Could not locate url \"{file}\" from \"{dir}\"")]
    UnresolvableUrl { file: String, dir: String },

    #[error("Invalid url literal {literal}: {message}")]
    InvalidUrl { literal: String, message: String },

    #[error("{0}")]
    Sass(String),

    #[error("Failed to map asset {path}: {source}")]
    AssetMapping {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A failed compilation of one stylesheet, tagged with its filename.
#[derive(Debug, thiserror::Error)]
#[error("Error compiling {}: {source}", .filename.display())]
pub struct CompileError {
    pub filename: PathBuf,

    #[source]
    pub source: ScssError,
}

impl CompileError {
    pub fn new(filename: impl Into<PathBuf>, source: ScssError) -> Self {
        Self {
            filename: filename.into(),
            source,
        }
    }
}
