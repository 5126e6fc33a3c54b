//! Shared server state

use std::sync::Arc;

use crate::config::SiteConfig;
use crate::content::{ExcerptOptions, MarkdownRenderer, SharedStore};
use crate::pagination::Paginator;
use crate::Blog;

/// State handed to every request handler.
///
/// Cheap to clone; everything heavy sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SiteConfig>,
    pub store: SharedStore,
    pub renderer: Arc<MarkdownRenderer>,
    pub excerpt: ExcerptOptions,
    pub index: Paginator,
    pub blog: Paginator,
}

impl AppState {
    pub fn new(blog: &Blog) -> anyhow::Result<Self> {
        Ok(Self::with_store(blog, blog.store(), blog.renderer()?))
    }

    /// Build state around an existing store handle
    pub fn with_store(blog: &Blog, store: SharedStore, renderer: MarkdownRenderer) -> Self {
        Self {
            config: Arc::new(blog.config.clone()),
            store,
            renderer: Arc::new(renderer),
            excerpt: blog.config.excerpt.clone(),
            index: blog.index_paginator(),
            blog: blog.blog_paginator(),
        }
    }
}
