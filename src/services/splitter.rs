use crate::error::{DocSplitterError, Result};
use crate::types::{Document, Language, TagRegion};
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::debug;

const FENCE: &str = ":::";
const ESCAPED_FENCE: &str = "\\:::";

/// Resolves `:::python` / `:::js` conditional blocks into one document per language.
///
/// ```text
/// Shared intro.
/// :::python
/// pip install langchain
/// :::
/// :::js
/// npm install langchain
/// :::
/// ```
///
/// Marker lines disappear from every output. A block's inner lines survive only
/// in the output for its own language. A line starting with `\:::` is literal
/// text and is published as `:::`.
pub struct ContentSplitter;

#[derive(Debug, PartialEq, Eq)]
enum Marker<'a> {
    Open(&'a str),
    Close,
    Text,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Outside,
    Inside {
        language: Language,
        line: usize,
        start: usize,
        inner_start: usize,
    },
}

impl State {
    fn owner(&self) -> Option<Language> {
        match self {
            Self::Outside => None,
            Self::Inside { language, .. } => Some(*language),
        }
    }
}

impl ContentSplitter {
    /// Split a document into one output per requested language.
    pub fn split(
        document: &Document,
        languages: &[Language],
    ) -> Result<BTreeMap<Language, String>> {
        if languages.is_empty() {
            return Err(DocSplitterError::EmptyLanguageSet);
        }

        let mut outputs: BTreeMap<Language, String> = languages
            .iter()
            .map(|lang| (*lang, String::with_capacity(document.content.len())))
            .collect();

        let regions = Self::walk(document, |owner, line| {
            let text = unescape(line);
            match owner {
                None => outputs.values_mut().for_each(|out| out.push_str(&text)),
                Some(lang) => {
                    if let Some(out) = outputs.get_mut(&lang) {
                        out.push_str(&text);
                    }
                }
            }
        })?;

        debug!(
            "Split '{}' into {} outputs ({} conditional blocks)",
            document.path.display(),
            outputs.len(),
            regions.len()
        );

        Ok(outputs)
    }

    /// Produce the output for a single language.
    pub fn resolve(document: &Document, language: Language) -> Result<String> {
        let mut outputs = Self::split(document, &[language])?;
        Ok(outputs.remove(&language).unwrap_or_default())
    }

    /// Locate every conditional block, validating marker structure.
    pub fn scan(document: &Document) -> Result<Vec<TagRegion>> {
        Self::walk(document, |_, _| {})
    }

    /// Single pass over the document. Non-marker lines are handed to `emit`
    /// together with the language of the block they sit in.
    fn walk<'a>(
        document: &'a Document,
        mut emit: impl FnMut(Option<Language>, &'a str),
    ) -> Result<Vec<TagRegion>> {
        let mut regions = Vec::new();
        let mut state = State::Outside;
        let mut offset = 0;

        for (idx, line) in document.content.split_inclusive('\n').enumerate() {
            let line_no = idx + 1;
            let line_start = offset;
            offset += line.len();

            match classify(line) {
                Marker::Open(tag) => {
                    let language =
                        Language::from_tag(tag).ok_or_else(|| DocSplitterError::UnknownLanguage {
                            path: document.path.clone(),
                            line: line_no,
                            tag: tag.to_string(),
                        })?;

                    if let State::Inside {
                        language: outer,
                        line: outer_line,
                        ..
                    } = state
                    {
                        return Err(DocSplitterError::NestedRegion {
                            path: document.path.clone(),
                            line: line_no,
                            inner: language.tag().to_string(),
                            outer: outer.tag().to_string(),
                            outer_line,
                        });
                    }

                    state = State::Inside {
                        language,
                        line: line_no,
                        start: line_start,
                        inner_start: offset,
                    };
                }
                Marker::Close => match state {
                    State::Outside => {
                        return Err(DocSplitterError::UnmatchedClose {
                            path: document.path.clone(),
                            line: line_no,
                        });
                    }
                    State::Inside {
                        language,
                        line,
                        start,
                        inner_start,
                    } => {
                        regions.push(TagRegion {
                            language,
                            line,
                            start,
                            end: offset,
                            inner_start,
                            inner_end: line_start,
                        });
                        state = State::Outside;
                    }
                },
                Marker::Text => emit(state.owner(), line),
            }
        }

        if let State::Inside { language, line, .. } = state {
            return Err(DocSplitterError::UnterminatedRegion {
                path: document.path.clone(),
                line,
                language: language.tag().to_string(),
            });
        }

        Ok(regions)
    }
}

fn classify(line: &str) -> Marker<'_> {
    let body = line.trim_end_matches(['\n', '\r']);
    let body = body.trim_start_matches([' ', '\t']);

    let Some(rest) = body.strip_prefix(FENCE) else {
        return Marker::Text;
    };

    let word = rest.trim_end();
    if word.is_empty() {
        Marker::Close
    } else if word.chars().all(|c| c.is_alphanumeric() || c == '_') {
        Marker::Open(word)
    } else {
        Marker::Text
    }
}

fn unescape(line: &str) -> Cow<'_, str> {
    if line.contains(ESCAPED_FENCE) {
        Cow::Owned(line.replace(ESCAPED_FENCE, FENCE))
    } else {
        Cow::Borrowed(line)
    }
}
