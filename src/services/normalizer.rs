use serde::Serialize;
use tracing::debug;

/// Status used for case-normalizing redirects (permanent, method preserving).
pub const PERMANENT_REDIRECT: u16 = 308;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Normalization {
    pub should_redirect: bool,
    pub target_path: String,
}

pub struct PathNormalizer;

impl PathNormalizer {
    /// Lowercase the path portion of a request target. The query string is
    /// kept byte-for-byte.
    pub fn normalize(request_path: &str) -> Normalization {
        let (path, query) = match request_path.find('?') {
            Some(idx) => request_path.split_at(idx),
            None => (request_path, ""),
        };

        let lowered = path.to_lowercase();
        if lowered == path {
            return Normalization {
                should_redirect: false,
                target_path: request_path.to_string(),
            };
        }

        Normalization {
            should_redirect: true,
            target_path: format!("{}{}", lowered, query),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RedirectDecision {
    PassThrough,
    Redirect { location: String, status: u16 },
}

/// Request-path policy for the lowercase redirect, limited to a set of
/// path prefixes.
#[derive(Debug, Clone)]
pub struct RedirectMiddleware {
    prefixes: Vec<String>,
}

impl RedirectMiddleware {
    pub fn new(prefixes: &[String]) -> Self {
        Self {
            prefixes: prefixes
                .iter()
                .map(|p| p.trim_end_matches('/').to_lowercase())
                .collect(),
        }
    }

    /// Whether the path sits under a configured prefix. Matching ignores case
    /// and respects segment boundaries, so `/python` covers `/Python/x` but
    /// not `/pythonic`.
    pub fn matches(&self, request_path: &str) -> bool {
        let path = request_path
            .split('?')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        self.prefixes.iter().any(|prefix| {
            prefix.is_empty()
                || path
                    .strip_prefix(prefix.as_str())
                    .map(|rest| rest.is_empty() || rest.starts_with('/'))
                    .unwrap_or(false)
        })
    }

    pub fn handle(&self, request_path: &str) -> RedirectDecision {
        if !self.matches(request_path) {
            return RedirectDecision::PassThrough;
        }

        let normalization = PathNormalizer::normalize(request_path);
        if !normalization.should_redirect {
            return RedirectDecision::PassThrough;
        }

        debug!(
            "Redirecting {} -> {}",
            request_path, normalization.target_path
        );
        RedirectDecision::Redirect {
            location: normalization.target_path,
            status: PERMANENT_REDIRECT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mixed_case_path_redirects() {
        let result = PathNormalizer::normalize("/python/LangChain/Index.html");
        assert!(result.should_redirect);
        assert_eq!(result.target_path, "/python/langchain/index.html");
    }

    #[test]
    fn test_lowercase_path_is_unchanged() {
        let result = PathNormalizer::normalize("/python/langchain/index.html");
        assert!(!result.should_redirect);
        assert_eq!(result.target_path, "/python/langchain/index.html");
    }

    #[test]
    fn test_query_string_is_preserved() {
        let result = PathNormalizer::normalize("/JavaScript/Agents?Tab=JS&q=A");
        assert!(result.should_redirect);
        assert_eq!(result.target_path, "/javascript/agents?Tab=JS&q=A");

        let untouched = PathNormalizer::normalize("/javascript/agents?Tab=JS");
        assert!(!untouched.should_redirect);
        assert_eq!(untouched.target_path, "/javascript/agents?Tab=JS");
    }

    #[test]
    fn test_non_ascii_and_percent_encoded_paths() {
        let result = PathNormalizer::normalize("/Ünïcode/%C3%A9?Q=1");
        assert!(result.should_redirect);
        assert_eq!(result.target_path, "/ünïcode/%c3%a9?Q=1");

        let again = PathNormalizer::normalize(&result.target_path);
        assert!(!again.should_redirect);
        assert_eq!(again.target_path, result.target_path);
    }

    #[test]
    fn test_middleware_only_handles_prefixes() {
        let middleware =
            RedirectMiddleware::new(&["/python".to_string(), "/javascript/".to_string()]);

        assert_eq!(
            middleware.handle("/Python/Intro"),
            RedirectDecision::Redirect {
                location: "/python/intro".to_string(),
                status: PERMANENT_REDIRECT,
            }
        );
        assert_eq!(middleware.handle("/javascript/intro"), RedirectDecision::PassThrough);
        assert_eq!(middleware.handle("/LangSmith/Home"), RedirectDecision::PassThrough);
        assert_eq!(middleware.handle("/Pythonic/Thing"), RedirectDecision::PassThrough);
        assert!(middleware.matches("/JAVASCRIPT"));
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(
            path in "/[a-zA-Z0-9/._%ÀÉÜàéüÏïΣσẞßİ-]{0,40}(\\?[a-zA-Z0-9=&%Éé]{0,10})?"
        ) {
            let once = PathNormalizer::normalize(&path);
            let twice = PathNormalizer::normalize(&once.target_path);

            prop_assert_eq!(&twice.target_path, &once.target_path);
            prop_assert!(!twice.should_redirect);
        }
    }
}
