//! Content module - articles, excerpts and markdown rendering

mod article;
pub mod directive;
pub mod excerpt;
pub mod frontmatter;
mod markdown;
pub mod store;

pub use article::Article;
pub use excerpt::{derive_excerpt, derive_excerpt_with, ExcerptOptions, EXCERPT_PLACEHOLDER};
pub use frontmatter::FrontMatter;
pub use markdown::{MarkdownRenderer, DEFAULT_THEME};
pub use store::{ContentStore, SharedStore};
