//! # Doc Splitter Library
//!
//! Build preprocessing for a multi-language documentation site. Markdown/MDX
//! pages carry language-conditional blocks:
//!
//! ```text
//! :::python
//! pip install langchain
//! :::
//! :::js
//! npm install langchain
//! :::
//! ```
//!
//! [`ContentSplitter`] resolves them into one page per language, and
//! [`DocumentationBuilder`] applies that across a source tree. [`PathNormalizer`]
//! holds the lowercase-redirect decision used by the site's request middleware.
//!
//! ## Example Usage
//!
//! ```rust
//! use doc_splitter::{ContentSplitter, Document, Language, PathNormalizer};
//!
//! let doc = Document::new("install.mdx", ":::python\npip install x\n:::\nDone.\n");
//! let outputs = ContentSplitter::split(&doc, &[Language::Python, Language::Js]).unwrap();
//! assert_eq!(outputs[&Language::Js], "Done.\n");
//!
//! let n = PathNormalizer::normalize("/python/LangChain/Index.html");
//! assert!(n.should_redirect);
//! ```

pub mod config;
pub mod error;
pub mod services;
pub mod types;

// Re-export main types and services for easier usage
pub use config::BuildConfig;
pub use error::{DocSplitterError, Result};
pub use services::{
    check_sources, AutoLinker, ContentSplitter, DocumentationBuilder, LinkMap, Normalization,
    PathNormalizer, Preprocessor, RedirectDecision, RedirectMiddleware, RenderContext,
};
pub use types::{
    BuildReport, BuiltFile, CheckFailure, CheckReport, Document, Language, OutputKind, TagRegion,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
