//! Build configuration.
//!
//! Loaded from a JSON file (`doc-split.json` by default) and passed explicitly
//! to the builder, preprocessor and redirect middleware. Every field has a
//! default, so an empty object `{}` is a valid config.

use crate::error::{DocSplitterError, Result};
use crate::services::autolinks::LinkMap;
use crate::types::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = "doc-split.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    #[serde(default = "default_src_dir")]
    pub src_dir: PathBuf,

    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,

    /// Languages every versioned page is rendered for.
    #[serde(default = "default_languages")]
    pub languages: Vec<Language>,

    /// Language used to resolve conditional blocks in unversioned sections.
    #[serde(default = "default_language")]
    pub default_language: Language,

    /// Top-level source directories rendered once per language.
    #[serde(default = "default_versioned_sections")]
    pub versioned_sections: Vec<String>,

    /// Top-level source directories rendered once with `default_language`.
    #[serde(default = "default_unversioned_sections")]
    pub unversioned_sections: Vec<String>,

    /// File extensions (with leading dot) copied into the build.
    #[serde(default = "default_copy_extensions")]
    pub copy_extensions: Vec<String>,

    /// Values for `$[name]` tokens.
    #[serde(default)]
    pub constants: BTreeMap<String, String>,

    /// Targets for `@[name]` cross-references, per language.
    #[serde(default)]
    pub link_maps: Vec<LinkMap>,

    /// Base URL for the "edit this page" footer; no footer when unset.
    #[serde(default)]
    pub edit_url_base: Option<String>,

    /// Request path prefixes the lowercase redirect applies to.
    #[serde(default = "default_redirect_prefixes")]
    pub redirect_prefixes: Vec<String>,
}

fn default_src_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_languages() -> Vec<Language> {
    Language::ALL.to_vec()
}

fn default_language() -> Language {
    Language::Python
}

fn default_versioned_sections() -> Vec<String> {
    vec!["oss".to_string()]
}

fn default_unversioned_sections() -> Vec<String> {
    vec!["langsmith".to_string()]
}

fn default_copy_extensions() -> Vec<String> {
    [
        ".mdx", ".md", ".json", ".svg", ".png", ".jpg", ".jpeg", ".gif", ".yml", ".yaml",
        ".css", ".js", ".html",
    ]
    .iter()
    .map(|ext| ext.to_string())
    .collect()
}

fn default_redirect_prefixes() -> Vec<String> {
    vec!["/python".to_string(), "/javascript".to_string()]
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            build_dir: default_build_dir(),
            languages: default_languages(),
            default_language: default_language(),
            versioned_sections: default_versioned_sections(),
            unversioned_sections: default_unversioned_sections(),
            copy_extensions: default_copy_extensions(),
            constants: BTreeMap::new(),
            link_maps: Vec::new(),
            edit_url_base: None,
            redirect_prefixes: default_redirect_prefixes(),
        }
    }
}

impl BuildConfig {
    /// Load a config file. A missing file is an error only when the path was
    /// given explicitly; otherwise defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !path.exists() {
            if explicit {
                return Err(DocSplitterError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            debug!("No config file at {}, using defaults", path.display());
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let raw = std::fs::read_to_string(&path)?;
        let config = Self::from_json(&raw)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            return Err(DocSplitterError::Config {
                reason: "'languages' must list at least one language".to_string(),
            });
        }

        if !self.languages.contains(&self.default_language) {
            return Err(DocSplitterError::Config {
                reason: format!(
                    "default language '{}' is not one of the configured languages",
                    self.default_language
                ),
            });
        }

        if let Some(section) = self
            .versioned_sections
            .iter()
            .find(|section| self.unversioned_sections.contains(section))
        {
            return Err(DocSplitterError::Config {
                reason: format!("section '{}' is both versioned and unversioned", section),
            });
        }

        if let Some(prefix) = self.redirect_prefixes.iter().find(|p| !p.starts_with('/')) {
            return Err(DocSplitterError::Config {
                reason: format!("redirect prefix '{}' must start with '/'", prefix),
            });
        }

        Ok(())
    }

    /// Reject a build directory that contains, or sits inside, the source
    /// directory. The build directory is wiped before every full build.
    pub fn check_output_location(&self) -> Result<()> {
        let src = resolve_path(&self.src_dir)?;
        let build = resolve_path(&self.build_dir)?;

        if src.starts_with(&build) || build.starts_with(&src) {
            return Err(DocSplitterError::Config {
                reason: format!(
                    "build directory {} overlaps source directory {}",
                    self.build_dir.display(),
                    self.src_dir.display()
                ),
            });
        }

        Ok(())
    }

    pub fn copies_extension(&self, extension: &str) -> bool {
        let wanted = format!(".{}", extension.to_lowercase());
        self.copy_extensions.iter().any(|ext| ext.to_lowercase() == wanted)
    }
}

/// Absolute form of `path` with the longest existing prefix canonicalized.
fn resolve_path(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = existing.canonicalize()?;
    for part in missing.iter().rev() {
        resolved.push(part);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = BuildConfig::from_json("{}").unwrap();

        assert_eq!(config.languages, vec![Language::Python, Language::Js]);
        assert_eq!(config.default_language, Language::Python);
        assert_eq!(config.versioned_sections, vec!["oss"]);
        assert!(config.copies_extension("MDX"));
        assert!(!config.copies_extension("txt"));
    }

    #[test]
    fn test_overrides() {
        let config = BuildConfig::from_json(
            r#"{"languages": ["js"], "default_language": "js", "constants": {"v": "1.0"}}"#,
        )
        .unwrap();

        assert_eq!(config.languages, vec![Language::Js]);
        assert_eq!(config.constants.get("v").map(String::as_str), Some("1.0"));
    }

    #[test]
    fn test_rejects_invalid_configs() {
        assert!(BuildConfig::from_json(r#"{"languages": []}"#).is_err());
        assert!(BuildConfig::from_json(r#"{"languages": ["js"]}"#).is_err());
        assert!(BuildConfig::from_json(r#"{"languages": ["rust"]}"#).is_err());
        assert!(BuildConfig::from_json(r#"{"redirect_prefixes": ["python"]}"#).is_err());
        assert!(BuildConfig::from_json(r#"{"unknown": 1}"#).is_err());
    }

    #[test]
    fn test_output_location_must_not_overlap_sources() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();

        let config = |build: PathBuf| BuildConfig {
            src_dir: src.clone(),
            build_dir: build,
            ..BuildConfig::default()
        };

        assert!(config(src.clone()).check_output_location().is_err());
        assert!(config(dir.path().to_path_buf()).check_output_location().is_err());
        assert!(config(src.join("out")).check_output_location().is_err());
        assert!(config(src.join("..").join("src")).check_output_location().is_err());
        assert!(config(dir.path().join("build")).check_output_location().is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = BuildConfig::load(Some(Path::new("/nonexistent/doc-split.json"))).unwrap_err();
        assert!(matches!(err, DocSplitterError::FileNotFound { .. }));
    }
}
