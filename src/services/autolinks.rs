use crate::types::Language;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::info;

/// Reference targets for one language, resolved against `host`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkMap {
    pub host: String,
    pub scope: Language,
    pub links: BTreeMap<String, String>,
}

/// Rewrites `@[name]` and `@[title][name]` into markdown links using the
/// link maps of the page's language.
pub struct AutoLinker {
    scopes: HashMap<Language, HashMap<String, String>>,
    pattern: Regex,
}

impl AutoLinker {
    /// Later maps override earlier ones for the same scope and name.
    pub fn new(link_maps: &[LinkMap]) -> Self {
        let mut scopes: HashMap<Language, HashMap<String, String>> = HashMap::new();
        for map in link_maps {
            let entries = scopes.entry(map.scope).or_default();
            for (name, target) in &map.links {
                let url = if target.starts_with("http") {
                    target.clone()
                } else {
                    format!("{}{}", map.host, target)
                };
                entries.insert(name.clone(), url);
            }
        }

        Self {
            scopes,
            pattern: Regex::new(r"@\[([^\]]+)\](?:\[([^\]]+)\])?").unwrap(),
        }
    }

    pub fn lookup(&self, scope: Language, name: &str) -> Option<&str> {
        self.scopes.get(&scope)?.get(name).map(String::as_str)
    }

    pub fn replace(&self, markdown: &str, file_path: &Path, scope: Language) -> String {
        if !markdown.contains("@[") {
            return markdown.to_string();
        }

        self.pattern
            .replace_all(markdown, |caps: &Captures| {
                let (title, name) = match caps.get(2) {
                    Some(name) => (&caps[1], name.as_str()),
                    None => (&caps[1], &caps[1]),
                };

                match self.lookup(scope, name) {
                    Some(url) => format!("[{}]({})", title, url),
                    None => {
                        info!(
                            "{}: Link '{}' not found in {} link map.",
                            file_path.display(),
                            name,
                            scope
                        );
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }
}
