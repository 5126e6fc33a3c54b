//! Content store - loads every article into memory once
//!
//! The collection is read in file-name order and then stably sorted by date,
//! newest first, so articles sharing a date keep their file-name order on every
//! load. Any unreadable or malformed record fails the whole load.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use walkdir::WalkDir;

use super::{Article, FrontMatter};
use crate::error::StoreError;

/// In-memory, date-ordered article collection
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    articles: Vec<Article>,
    by_slug: HashMap<String, usize>,
}

impl ContentStore {
    /// Load all articles below `posts_dir`
    pub fn load<P: AsRef<Path>>(posts_dir: P) -> Result<Self, StoreError> {
        let posts_dir = posts_dir.as_ref();
        if !posts_dir.is_dir() {
            return Err(StoreError::Io {
                path: posts_dir.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "posts directory does not exist",
                ),
            });
        }

        let mut articles = Vec::new();
        for entry in WalkDir::new(posts_dir)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_file() && is_markdown_file(path) {
                let article = load_article(posts_dir, path)?;
                tracing::debug!("Loaded article `{}` from {:?}", article.slug, path);
                articles.push(article);
            }
        }

        let store = Self::from_articles(articles)?;
        tracing::info!("Loaded {} articles from {:?}", store.len(), posts_dir);
        Ok(store)
    }

    /// Build a store from already-parsed articles
    pub fn from_articles(mut articles: Vec<Article>) -> Result<Self, StoreError> {
        // Stable sort: equal dates keep their incoming order
        articles.sort_by(|a, b| b.published.cmp(&a.published));

        let mut by_slug = HashMap::with_capacity(articles.len());
        for (i, article) in articles.iter().enumerate() {
            if let Some(first) = by_slug.insert(article.slug.clone(), i) {
                return Err(StoreError::DuplicateSlug {
                    slug: article.slug.clone(),
                    first: PathBuf::from(&articles[first].source),
                    second: PathBuf::from(&article.source),
                });
            }
        }

        Ok(Self { articles, by_slug })
    }

    /// All articles, newest first
    pub fn get_all_articles(&self) -> &[Article] {
        &self.articles
    }

    /// Exact-match lookup
    pub fn get_article_by_slug(&self, slug: &str) -> Option<&Article> {
        self.by_slug.get(slug).map(|&i| &self.articles[i])
    }

    /// The `n` newest articles
    pub fn recent(&self, n: usize) -> &[Article] {
        &self.articles[..n.min(self.articles.len())]
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Load a single article from a file
fn load_article(posts_dir: &Path, path: &Path) -> Result<Article, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let (fm, body) = FrontMatter::parse(&content).map_err(|e| StoreError::FrontMatter {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let title = fm
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| StoreError::MissingField {
            path: path.to_path_buf(),
            field: "title",
        })?;
    let date = fm
        .date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| StoreError::MissingField {
            path: path.to_path_buf(),
            field: "date",
        })?;
    let published = fm.parse_date().ok_or_else(|| StoreError::InvalidDate {
        path: path.to_path_buf(),
        value: date.to_string(),
    })?;

    // The slug is the file name, so `/posts/{slug}` mirrors the source layout
    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| StoreError::MissingField {
            path: path.to_path_buf(),
            field: "slug",
        })?;

    let source = path
        .strip_prefix(posts_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();

    let mut article = Article::new(slug, title, date, published);
    article.body = body.to_string();
    article.excerpt = fm.excerpt.clone().filter(|e| !e.trim().is_empty());
    article.cover_image = fm.cover_image();
    article.source = source;
    article.extra = fm.extra;

    Ok(article)
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

/// Process-wide, load-once handle to the content store.
///
/// Concurrent first calls to [`SharedStore::get`] wait on a single load. A
/// failed load leaves the cell empty, so the next call tries again.
#[derive(Debug, Clone)]
pub struct SharedStore {
    posts_dir: PathBuf,
    cell: Arc<OnceCell<Arc<ContentStore>>>,
    attempts: Arc<AtomicUsize>,
}

impl SharedStore {
    pub fn new<P: Into<PathBuf>>(posts_dir: P) -> Self {
        Self {
            posts_dir: posts_dir.into(),
            cell: Arc::new(OnceCell::new()),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wrap an already-loaded store
    pub fn preloaded(store: ContentStore) -> Self {
        Self {
            posts_dir: PathBuf::new(),
            cell: Arc::new(OnceCell::new_with(Some(Arc::new(store)))),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The loaded store, loading it on first use
    pub async fn get(&self) -> Result<Arc<ContentStore>, StoreError> {
        self.cell
            .get_or_try_init(|| async {
                let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::debug!("Loading articles from {:?} (attempt {})", self.posts_dir, attempt);
                let posts_dir = self.posts_dir.clone();
                let store = tokio::task::spawn_blocking(move || ContentStore::load(posts_dir))
                    .await
                    .map_err(|e| StoreError::Join(e.to_string()))??;
                Ok::<_, StoreError>(Arc::new(store))
            })
            .await
            .cloned()
    }

    pub fn posts_dir(&self) -> &Path {
        &self.posts_dir
    }
}
