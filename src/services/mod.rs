pub mod autolinks;
pub mod builder;
pub mod constants;
pub mod normalizer;
pub mod preprocessor;
pub mod splitter;

pub use autolinks::{AutoLinker, LinkMap};
pub use builder::{check_sources, DocumentationBuilder, Route};
pub use constants::ConstantSubstituter;
pub use normalizer::{Normalization, PathNormalizer, RedirectDecision, RedirectMiddleware};
pub use preprocessor::{Preprocessor, RenderContext};
pub use splitter::ContentSplitter;
