use crate::config::BuildConfig;
use crate::error::{DocSplitterError, Result};
use crate::services::autolinks::AutoLinker;
use crate::services::constants::ConstantSubstituter;
use crate::services::splitter::ContentSplitter;
use crate::types::{Document, Language};
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// Where a document lives in the site, for the passes that depend on it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext<'a> {
    /// Versioned section the page belongs to (enables link rewriting).
    pub section: Option<&'a str>,
    /// Path relative to the source root (enables the edit footer).
    pub relative_path: Option<&'a Path>,
}

/// Per-language markdown pipeline: cross-references -> split -> constants ->
/// ignored code blocks -> link rewriting -> edit footer.
pub struct Preprocessor {
    autolinks: AutoLinker,
    constants: ConstantSubstituter,
    default_language: Language,
    edit_url_base: Option<String>,
    code_fence_open: Regex,
    section_links: HashMap<String, Regex>,
}

impl Preprocessor {
    pub fn new(config: &BuildConfig) -> Self {
        let section_links = config
            .versioned_sections
            .iter()
            .map(|section| (section.clone(), section_link_pattern(section)))
            .collect();

        Self {
            autolinks: AutoLinker::new(&config.link_maps),
            constants: ConstantSubstituter::new(config.constants.clone()),
            default_language: config.default_language,
            edit_url_base: config
                .edit_url_base
                .as_ref()
                .map(|base| base.trim_end_matches('/').to_string()),
            code_fence_open: Regex::new(r"^([ \t]*)```(\w+)[ ]*(.*?)\s*$").unwrap(),
            section_links,
        }
    }

    /// Render the document once per language.
    pub fn render_languages(
        &self,
        document: &Document,
        languages: &[Language],
        context: RenderContext<'_>,
    ) -> Result<BTreeMap<Language, String>> {
        if languages.is_empty() {
            return Err(DocSplitterError::EmptyLanguageSet);
        }

        let mut outputs = BTreeMap::new();
        for &language in languages {
            outputs.insert(language, self.render(document, language, context)?);
        }
        Ok(outputs)
    }

    pub fn render(
        &self,
        document: &Document,
        language: Language,
        context: RenderContext<'_>,
    ) -> Result<String> {
        let text = self.resolve(document, language)?;
        Ok(self.finish(document, text, language, context))
    }

    /// Render a page shared by all languages. Conditional blocks resolve to
    /// the default language; section links are left alone.
    pub fn render_shared(&self, document: &Document, context: RenderContext<'_>) -> Result<String> {
        let language = self.default_language;
        let text = self.resolve(document, language)?;
        let context = RenderContext {
            section: None,
            ..context
        };
        Ok(self.finish(document, text, language, context))
    }

    /// Cross-references are resolved on the whole page before splitting.
    fn resolve(&self, document: &Document, language: Language) -> Result<String> {
        let linked = self
            .autolinks
            .replace(&document.content, &document.path, language);

        if linked == document.content {
            ContentSplitter::resolve(document, language)
        } else {
            ContentSplitter::resolve(&Document::new(document.path.clone(), linked), language)
        }
    }

    fn finish(
        &self,
        document: &Document,
        text: String,
        language: Language,
        context: RenderContext<'_>,
    ) -> String {
        let mut text = if text.contains("$[") {
            self.constants.replace(&text, &document.path)
        } else {
            text
        };

        text = self.strip_ignored_code_blocks(&text);

        if let Some(section) = context.section {
            text = self.rewrite_section_links(&text, section, language);
        }

        if let (Some(base), Some(relative)) = (&self.edit_url_base, context.relative_path) {
            text = append_edit_footer(&text, base, relative);
        }

        text
    }

    /// Drop fenced code blocks whose info string carries `ignore`.
    pub fn strip_ignored_code_blocks(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut skipping: Option<String> = None;
        let mut dropped = 0usize;

        for line in text.split_inclusive('\n') {
            let body = line.trim_end_matches(['\n', '\r']);

            if let Some(indent) = &skipping {
                let closes = body
                    .strip_prefix(indent.as_str())
                    .and_then(|rest| rest.strip_prefix("```"))
                    .map(|rest| rest.trim().is_empty())
                    .unwrap_or(false);
                if closes {
                    skipping = None;
                }
                continue;
            }

            if let Some(caps) = self.code_fence_open.captures(body) {
                if caps[3].contains("ignore") {
                    skipping = Some(caps[1].to_string());
                    dropped += 1;
                    continue;
                }
            }

            out.push_str(line);
        }

        if skipping.is_some() {
            // Unclosed ignored fence: leave the page untouched.
            return text.to_string();
        }

        if dropped > 0 {
            debug!("Removed {} ignored code blocks", dropped);
        }
        out
    }

    /// `/oss/concepts` becomes `/oss/python/concepts` in the python output.
    pub fn rewrite_section_links(&self, text: &str, section: &str, language: Language) -> String {
        let Some(pattern) = self.section_links.get(section) else {
            return text.to_string();
        };

        pattern
            .replace_all(text, |caps: &Captures| {
                let url = &caps[2];
                let rest = &url[section.len() + 2..];
                let first_segment = rest.split('/').next().unwrap_or_default();

                if url.contains("images") || Language::from_url_name(first_segment).is_some() {
                    return caps[0].to_string();
                }

                format!(
                    "{}/{}/{}/{}{}",
                    &caps[1],
                    section,
                    language.url_name(),
                    rest,
                    &caps[3]
                )
            })
            .into_owned()
    }
}

fn section_link_pattern(section: &str) -> Regex {
    Regex::new(&format!(
        r#"(\[[^\]]*?\]\(|\bhref="|")(/{}/[^")\s]+)([")\s])"#,
        regex::escape(section)
    ))
    .unwrap()
}

fn append_edit_footer(text: &str, base: &str, relative: &Path) -> String {
    let relative = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    format!(
        "{}\n\n---\n\n<Callout icon=\"pen-to-square\" iconType=\"regular\">\n    [Edit the source of this page on GitHub.]({}/{})\n</Callout>\n",
        text.trim_end(),
        base,
        relative
    )
}
