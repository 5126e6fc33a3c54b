//! Error types for the content pipeline

use std::path::PathBuf;

/// Failure while loading the article collection.
///
/// Any of these aborts the whole load; callers never see a partial collection.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk posts directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid front-matter in {path:?}: {message}")]
    FrontMatter { path: PathBuf, message: String },

    #[error("{path:?} is missing required front-matter field `{field}`")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("{path:?} has an unrecognized date `{value}`")]
    InvalidDate { path: PathBuf, value: String },

    #[error("duplicate slug `{slug}` ({first:?} and {second:?})")]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("article loader task failed: {0}")]
    Join(String),
}

/// Failure while rendering a single article body.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unknown highlight theme `{0}`")]
    UnknownTheme(String),

    #[error("directives nested deeper than {0} levels")]
    DirectiveDepth(usize),
}
