//! folio-rs: content pipeline for a markdown blog
//!
//! Loads dated markdown articles with front-matter into an immutable,
//! date-ordered collection, derives plain-text excerpts for listings,
//! renders article bodies to safe HTML and paginates listings.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod helpers;
pub mod listing;
pub mod pagination;
pub mod server;

use anyhow::Result;
use std::path::{Path, PathBuf};

use content::{MarkdownRenderer, SharedStore};
use pagination::Paginator;

/// A blog site rooted at a directory
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Directory holding the markdown articles
    pub posts_dir: PathBuf,
}

impl Blog {
    /// Open the site in `base_dir`, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        check_blog_dir(&config.blog_dir)?;
        let posts_dir = base_dir.join(&config.posts_dir);

        Ok(Self {
            config,
            base_dir,
            posts_dir,
        })
    }

    /// Load-once handle to the article collection
    pub fn store(&self) -> SharedStore {
        SharedStore::new(&self.posts_dir)
    }

    /// Renderer configured from the `highlight` section
    pub fn renderer(&self) -> Result<MarkdownRenderer> {
        let highlight = &self.config.highlight;
        Ok(MarkdownRenderer::with_options(
            &highlight.theme,
            highlight.line_number,
        )?)
    }

    /// Paginator for the index listing at `/`
    pub fn index_paginator(&self) -> Paginator {
        Paginator::new(self.config.per_page, "/")
    }

    /// Paginator for the blog listing
    pub fn blog_paginator(&self) -> Paginator {
        Paginator::new(
            self.config.blog_per_page,
            helpers::url_for(&self.config.blog_dir),
        )
    }
}

/// Route prefixes served by fixed handlers
const RESERVED_PATHS: &[&str] = &["posts", "healthz"];

/// Reject `blog_dir` values the router cannot mount
fn check_blog_dir(blog_dir: &str) -> Result<()> {
    let path = helpers::url_for(blog_dir);
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    if path == "/" {
        anyhow::bail!("blog_dir must not be empty, `/` is the index listing");
    }
    if segments.iter().any(|s| s.is_empty()) {
        anyhow::bail!("blog_dir `{}` contains an empty path segment", blog_dir);
    }
    let valid = segments.iter().all(|s| {
        s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    });
    if !valid {
        anyhow::bail!(
            "blog_dir `{}` may only contain letters, digits, `-`, `_`, `.` and `/`",
            blog_dir
        );
    }
    if RESERVED_PATHS.contains(&segments[0]) {
        anyhow::bail!("blog_dir `{}` collides with the `/{}` route", blog_dir, segments[0]);
    }
    Ok(())
}
