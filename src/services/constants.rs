use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Substitutes `$[name]` tokens with values from a constants table.
///
/// Unknown names are left as written. `\$[name]` is never substituted and is
/// published as `$[name]`.
pub struct ConstantSubstituter {
    constants: BTreeMap<String, String>,
    token_pattern: Regex,
    escape_pattern: Regex,
}

impl ConstantSubstituter {
    pub fn new(constants: BTreeMap<String, String>) -> Self {
        Self {
            constants,
            // Group 1 swallows a preceding backslash so escaped tokens can be skipped.
            token_pattern: Regex::new(r"(\\?)\$\[([^\]]+)\]").unwrap(),
            escape_pattern: Regex::new(r"\\(\$\[)").unwrap(),
        }
    }

    pub fn replace(&self, markdown: &str, file_path: &Path) -> String {
        let substituted = self.token_pattern.replace_all(markdown, |caps: &Captures| {
            if !caps[1].is_empty() {
                return caps[0].to_string();
            }

            let name = &caps[2];
            match self.constants.get(name) {
                Some(value) => value.clone(),
                None => {
                    info!(
                        "{}: Constant '{}' not found in constants map.",
                        file_path.display(),
                        name
                    );
                    caps[0].to_string()
                }
            }
        });

        self.escape_pattern
            .replace_all(&substituted, "$1")
            .into_owned()
    }
}

impl Default for ConstantSubstituter {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn substituter() -> ConstantSubstituter {
        let mut constants = BTreeMap::new();
        constants.insert("example-constant".to_string(), "example-value".to_string());
        ConstantSubstituter::new(constants)
    }

    #[test]
    fn test_known_constant_is_replaced() {
        let result = substituter().replace("Use $[example-constant] here.", Path::new("a.mdx"));
        assert_eq!(result, "Use example-value here.");
    }

    #[test]
    fn test_missing_constant_is_left_untouched() {
        let result = substituter().replace("Unknown $[missing] value.", Path::new("a.mdx"));
        assert_eq!(result, "Unknown $[missing] value.");
    }

    #[test]
    fn test_escaped_token_renders_literally() {
        let result = substituter().replace(r"Literal \$[example-constant] token.", Path::new("a.mdx"));
        assert_eq!(result, "Literal $[example-constant] token.");
    }
}
