use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocSplitterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("{path}:{line}: unknown language '{tag}' in conditional block")]
    UnknownLanguage {
        path: PathBuf,
        line: usize,
        tag: String,
    },

    #[error("{path}:{line}: ':::{inner}' opened inside ':::{outer}' block started at line {outer_line}")]
    NestedRegion {
        path: PathBuf,
        line: usize,
        inner: String,
        outer: String,
        outer_line: usize,
    },

    #[error("{path}:{line}: closing ':::' without an open conditional block")]
    UnmatchedClose { path: PathBuf, line: usize },

    #[error("{path}:{line}: ':::{language}' block is never closed")]
    UnterminatedRegion {
        path: PathBuf,
        line: usize,
        language: String,
    },

    #[error("At least one target language is required")]
    EmptyLanguageSet,

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    #[error("Output directory error: {reason}")]
    OutputDirectory { reason: String },

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl DocSplitterError {
    /// True for errors caused by malformed conditional markers in a document.
    pub fn is_markup_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownLanguage { .. }
                | Self::NestedRegion { .. }
                | Self::UnmatchedClose { .. }
                | Self::UnterminatedRegion { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DocSplitterError>;
