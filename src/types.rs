use crate::error::DocSplitterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Languages a conditional block may be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Js,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Python, Language::Js];

    /// Identifier used in `:::tag` markers and in configuration.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Js => "js",
        }
    }

    /// Directory name used for this language in published URLs.
    pub fn url_name(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Js => "javascript",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.tag() == tag)
    }

    pub fn from_url_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.url_name() == name)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = DocSplitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        Self::from_tag(&lowered)
            .or_else(|| Self::from_url_name(&lowered))
            .ok_or_else(|| DocSplitterError::Config {
                reason: format!("Unknown language '{}' (expected one of: python, js)", s),
            })
    }
}

/// A source document as read from disk.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub content: String,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A `:::lang` ... `:::` span located in a document.
///
/// `start..end` covers both marker lines; `inner_start..inner_end` is the
/// raw text between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRegion {
    pub language: Language,
    pub line: usize,
    pub start: usize,
    pub end: usize,
    pub inner_start: usize,
    pub inner_end: usize,
}

impl TagRegion {
    pub fn inner<'a>(&self, source: &'a str) -> &'a str {
        &source[self.inner_start..self.inner_end]
    }
}

/// How a single output file was produced during a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Preprocessed,
    Copied,
    ConvertedYaml,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuiltFile {
    pub source: PathBuf,
    pub output: PathBuf,
    pub language: Option<Language>,
    pub kind: OutputKind,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub built: usize,
    pub skipped: usize,
    pub outputs: Vec<BuiltFile>,
}

impl BuildReport {
    pub fn merge(&mut self, other: BuildReport) {
        self.built += other.built;
        self.skipped += other.skipped;
        self.outputs.extend(other.outputs);
    }

    pub fn record(
        &mut self,
        source: &Path,
        output: PathBuf,
        language: Option<Language>,
        kind: OutputKind,
    ) {
        self.built += 1;
        self.outputs.push(BuiltFile {
            source: source.to_path_buf(),
            output,
            language,
            kind,
        });
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of validating conditional markers across a set of documents.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub checked: usize,
    pub regions: usize,
    pub failures: Vec<CheckFailure>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}
