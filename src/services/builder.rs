use crate::config::BuildConfig;
use crate::error::{DocSplitterError, Result};
use crate::services::preprocessor::{Preprocessor, RenderContext};
use crate::services::splitter::ContentSplitter;
use crate::types::{
    BuildReport, CheckFailure, CheckReport, Document, Language, OutputKind,
};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const MANIFEST_FILE: &str = "build-manifest.json";
const TEMPLATE_FILE: &str = "TEMPLATE.mdx";

/// How a source file maps into the build tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Rendered once per language into `<build>/<section>/<lang>/<rest>`.
    Versioned {
        section: String,
        rest: PathBuf,
        languages: Vec<Language>,
    },
    /// Rendered with a fixed language into `<build>/<relative>`.
    Single { language: Language },
    /// Identical for every language, written to `<build>/<relative>`.
    Shared,
}

#[derive(Debug, Clone)]
pub struct BuildTask {
    pub source: PathBuf,
    pub relative: PathBuf,
    pub route: Route,
}

/// Builds the documentation tree from `src_dir` into `build_dir`.
///
/// Cheap to clone; documents are processed concurrently, one task per file.
#[derive(Clone)]
pub struct DocumentationBuilder {
    config: Arc<BuildConfig>,
    preprocessor: Arc<Preprocessor>,
}

impl DocumentationBuilder {
    pub fn new(config: BuildConfig) -> Self {
        let preprocessor = Preprocessor::new(&config);
        Self {
            config: Arc::new(config),
            preprocessor: Arc::new(preprocessor),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Clear the build directory and rebuild everything under the source directory.
    pub async fn build_all(&self) -> Result<BuildReport> {
        let src_dir = &self.config.src_dir;
        let build_dir = &self.config.build_dir;

        info!(
            "Building documentation from {} to {}",
            src_dir.display(),
            build_dir.display()
        );

        if !src_dir.is_dir() {
            return Err(DocSplitterError::FileNotFound {
                path: src_dir.display().to_string(),
            });
        }

        self.config.check_output_location()?;

        if build_dir.exists() {
            fs::remove_dir_all(build_dir).await.map_err(|e| {
                DocSplitterError::OutputDirectory {
                    reason: format!("Failed to clear {}: {}", build_dir.display(), e),
                }
            })?;
        }
        fs::create_dir_all(build_dir).await.map_err(|e| {
            DocSplitterError::OutputDirectory {
                reason: format!("Failed to create {}: {}", build_dir.display(), e),
            }
        })?;

        let (tasks, skipped) = self.plan()?;
        let mut report = self.run(tasks).await?;
        report.skipped += skipped;

        info!(
            "Build complete: {} files written, {} files skipped",
            report.built, report.skipped
        );
        Ok(report)
    }

    /// Rebuild specific source files without clearing the build directory.
    pub async fn build_files(&self, files: &[PathBuf]) -> Result<BuildReport> {
        let mut tasks = Vec::new();
        let mut skipped = 0;

        for file in files {
            if !file.is_file() {
                return Err(DocSplitterError::FileNotFound {
                    path: file.display().to_string(),
                });
            }
            let relative = self.relative_to_src(file)?;
            match self.route(&relative) {
                Some(route) => tasks.push(BuildTask {
                    source: file.clone(),
                    relative,
                    route,
                }),
                None => skipped += 1,
            }
        }

        let mut report = self.run(tasks).await?;
        report.skipped += skipped;
        Ok(report)
    }

    /// Walk the source directory and route every file. Returns the tasks and
    /// the number of files that have no route.
    pub fn plan(&self) -> Result<(Vec<BuildTask>, usize)> {
        let mut tasks = Vec::new();
        let mut skipped = 0;

        let walker = WalkDir::new(&self.config.src_dir)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()));
        for entry in walker {
            let entry = entry.map_err(|e| DocSplitterError::Anyhow(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = self.relative_to_src(entry.path())?;
            match self.route(&relative) {
                Some(route) => tasks.push(BuildTask {
                    source: entry.path().to_path_buf(),
                    relative,
                    route,
                }),
                None => {
                    debug!("Skipping {}", relative.display());
                    skipped += 1;
                }
            }
        }

        debug!("Planned {} build tasks", tasks.len());
        Ok((tasks, skipped))
    }

    /// Decide where a file (relative to the source root) goes, if anywhere.
    pub fn route(&self, relative: &Path) -> Option<Route> {
        let file_name = relative.file_name()?.to_str()?;
        if file_name == TEMPLATE_FILE {
            return None;
        }

        if !is_yaml_nav(file_name) {
            let extension = relative.extension()?.to_str()?;
            if !self.config.copies_extension(extension) {
                return None;
            }
        }

        if self.is_shared(relative) {
            return Some(Route::Shared);
        }

        let mut components = relative.components();
        let first = match components.next() {
            Some(Component::Normal(first)) => first.to_str()?,
            _ => return None,
        };
        let rest: PathBuf = components.as_path().to_path_buf();

        if self.config.versioned_sections.iter().any(|s| s == first) {
            let mut inner = rest.components();
            if let Some(Component::Normal(dir)) = inner.next() {
                let lang_dir = Language::from_url_name(dir.to_str()?);
                let has_more = inner.clone().next().is_some();
                if let (Some(language), true) = (lang_dir, has_more) {
                    if !self.config.languages.contains(&language) {
                        return None;
                    }
                    return Some(Route::Versioned {
                        section: first.to_string(),
                        rest: inner.as_path().to_path_buf(),
                        languages: vec![language],
                    });
                }
            }

            return Some(Route::Versioned {
                section: first.to_string(),
                rest,
                languages: self.config.languages.clone(),
            });
        }

        if self.config.unversioned_sections.iter().any(|s| s == first) {
            return Some(Route::Single {
                language: self.config.default_language,
            });
        }

        Some(Route::Shared)
    }

    /// Files that are the same for every language: navigation config, the
    /// root index, images, snippets and site scripts/styles.
    pub fn is_shared(&self, relative: &Path) -> bool {
        let file_name = relative
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        if file_name == "docs.json" || is_yaml_nav(file_name) {
            return true;
        }

        if file_name == "index.mdx" && relative.components().count() == 1 {
            return true;
        }

        if relative
            .components()
            .any(|c| matches!(c.as_os_str().to_str(), Some("images") | Some("snippets")))
        {
            return true;
        }

        matches!(extension_of(relative).as_deref(), Some("js") | Some("css"))
    }

    async fn run(&self, tasks: Vec<BuildTask>) -> Result<BuildReport> {
        let mut set = JoinSet::new();
        for task in tasks {
            let builder = self.clone();
            set.spawn(async move { builder.process(task).await });
        }

        let mut report = BuildReport::default();
        while let Some(joined) = set.join_next().await {
            // Returning early drops the set, which aborts the remaining tasks.
            let task_report = joined.map_err(anyhow::Error::from)??;
            report.merge(task_report);
        }

        report.outputs.sort_by(|a, b| a.output.cmp(&b.output));
        Ok(report)
    }

    async fn process(&self, task: BuildTask) -> Result<BuildReport> {
        let build_dir = &self.config.build_dir;
        let targets: Vec<(Option<Language>, PathBuf)> = match &task.route {
            Route::Versioned {
                section,
                rest,
                languages,
            } => languages
                .iter()
                .map(|lang| {
                    (
                        Some(*lang),
                        build_dir.join(section).join(lang.url_name()).join(rest),
                    )
                })
                .collect(),
            Route::Single { language } => {
                vec![(Some(*language), build_dir.join(&task.relative))]
            }
            Route::Shared => vec![(None, build_dir.join(&task.relative))],
        };

        let file_name = task
            .relative
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let mut report = BuildReport::default();

        if is_yaml_nav(file_name) {
            let raw = fs::read_to_string(&task.source).await?;
            let value: serde_json::Value = serde_yaml::from_str(&raw)?;
            let json = serde_json::to_string_pretty(&value)?;
            for (language, path) in targets {
                let output = path.with_file_name("docs.json");
                write_output(&output, json.as_bytes()).await?;
                report.record(&task.source, output, language, OutputKind::ConvertedYaml);
            }
            return Ok(report);
        }

        if is_markdown(&task.relative) {
            let content = fs::read_to_string(&task.source).await?;
            let document = Document::new(&task.relative, content);
            let rendered = self.render(&document, &task)?;

            for (language, path) in targets {
                let Some((_, text)) = rendered.iter().find(|(l, _)| *l == language) else {
                    continue;
                };
                let output = path.with_extension("mdx");
                write_output(&output, text.as_bytes()).await?;
                report.record(&task.source, output, language, OutputKind::Preprocessed);
            }
            debug!("Built {}", task.relative.display());
            return Ok(report);
        }

        for (language, path) in targets {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::copy(&task.source, &path).await.map_err(|e| {
                DocSplitterError::OutputDirectory {
                    reason: format!("Failed to copy {}: {}", task.source.display(), e),
                }
            })?;
            report.record(&task.source, path, language, OutputKind::Copied);
        }
        Ok(report)
    }

    fn render(
        &self,
        document: &Document,
        task: &BuildTask,
    ) -> Result<Vec<(Option<Language>, String)>> {
        let in_snippets = task
            .relative
            .components()
            .any(|c| c.as_os_str() == "snippets");
        let footer_path = (!in_snippets).then_some(task.relative.as_path());

        let rendered = match &task.route {
            Route::Versioned {
                section, languages, ..
            } => self
                .preprocessor
                .render_languages(
                    document,
                    languages,
                    RenderContext {
                        section: Some(section.as_str()),
                        relative_path: footer_path,
                    },
                )?
                .into_iter()
                .map(|(lang, text)| (Some(lang), text))
                .collect(),
            Route::Single { language } => vec![(
                Some(*language),
                self.preprocessor.render(
                    document,
                    *language,
                    RenderContext {
                        section: None,
                        relative_path: footer_path,
                    },
                )?,
            )],
            Route::Shared => vec![(
                None,
                self.preprocessor.render_shared(
                    document,
                    RenderContext {
                        section: None,
                        relative_path: footer_path,
                    },
                )?,
            )],
        };

        Ok(rendered)
    }

    /// Split standalone files into `<out_dir>/<lang>/<file name>`.
    pub async fn split_file(
        &self,
        source: &Path,
        out_dir: &Path,
        languages: &[Language],
    ) -> Result<BuildReport> {
        if !source.is_file() {
            return Err(DocSplitterError::FileNotFound {
                path: source.display().to_string(),
            });
        }

        let content = fs::read_to_string(source).await?;
        let document = Document::new(source, content);
        let outputs = self
            .preprocessor
            .render_languages(&document, languages, RenderContext::default())?;

        let file_name = source
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("document.mdx"));
        let mut report = BuildReport::default();
        for (language, text) in outputs {
            let output = out_dir.join(language.url_name()).join(&file_name);
            write_output(&output, text.as_bytes()).await?;
            report.record(source, output, Some(language), OutputKind::Preprocessed);
        }

        info!(
            "Split '{}' into {} language outputs",
            source.display(),
            report.built
        );
        Ok(report)
    }

    /// Write a JSON summary of a build next to its outputs.
    pub async fn write_manifest(&self, report: &BuildReport) -> Result<PathBuf> {
        let manifest = serde_json::json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "src_dir": self.config.src_dir,
            "languages": self.config.languages,
            "built": report.built,
            "skipped": report.skipped,
            "outputs": report.outputs,
        });

        let path = self.config.build_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(&manifest)?;
        write_output(&path, json.as_bytes()).await?;

        info!("Generated build manifest: {}", path.display());
        Ok(path)
    }

    fn relative_to_src(&self, path: &Path) -> Result<PathBuf> {
        path.strip_prefix(&self.config.src_dir)
            .map(Path::to_path_buf)
            .map_err(|_| DocSplitterError::Config {
                reason: format!(
                    "{} is not inside the source directory {}",
                    path.display(),
                    self.config.src_dir.display()
                ),
            })
    }
}

/// Validate conditional markers in every markdown file under `paths`
/// without writing anything.
pub async fn check_sources(paths: &[PathBuf]) -> Result<CheckReport> {
    let mut report = CheckReport::default();

    for root in paths {
        if !root.exists() {
            return Err(DocSplitterError::FileNotFound {
                path: root.display().to_string(),
            });
        }

        let walker = WalkDir::new(root).sort_by(|a, b| a.file_name().cmp(b.file_name()));
        for entry in walker {
            let entry = entry.map_err(|e| DocSplitterError::Anyhow(e.into()))?;
            if !entry.file_type().is_file() || !is_markdown(entry.path()) {
                continue;
            }

            let content = fs::read_to_string(entry.path()).await?;
            let document = Document::new(entry.path(), content);
            report.checked += 1;

            match ContentSplitter::scan(&document) {
                Ok(regions) => report.regions += regions.len(),
                Err(e) if e.is_markup_error() => {
                    warn!("{}", e);
                    report.failures.push(CheckFailure {
                        path: entry.path().to_path_buf(),
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(report)
}

async fn write_output(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, contents).await.map_err(|e| DocSplitterError::OutputDirectory {
        reason: format!("Failed to write {}: {}", path.display(), e),
    })
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn is_markdown(path: &Path) -> bool {
    matches!(extension_of(path).as_deref(), Some("md") | Some("mdx"))
}

fn is_yaml_nav(file_name: &str) -> bool {
    file_name == "docs.yml" || file_name == "docs.yaml"
}
