//! Article model

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;

use super::excerpt::{derive_excerpt_with, ExcerptOptions};

/// A blog article, immutable once loaded
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Slug (URL-safe unique key, taken from the file name)
    pub slug: String,

    /// Article title
    pub title: String,

    /// Publication date exactly as written in front-matter
    pub date: String,

    /// Parsed publication date, used for ordering
    #[serde(skip)]
    pub published: NaiveDateTime,

    /// Raw markdown body
    pub body: String,

    /// Author-supplied summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,

    /// Cover image for social previews
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,

    /// Source file path, relative to the posts directory
    pub source: String,

    /// Custom front-matter fields
    #[serde(skip)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Article {
    /// Create an article with the required fields only
    pub fn new(slug: &str, title: &str, date: &str, published: NaiveDateTime) -> Self {
        Self {
            slug: slug.to_string(),
            title: title.to_string(),
            date: date.to_string(),
            published,
            body: String::new(),
            excerpt: None,
            cover_image: None,
            source: format!("{}.md", slug),
            extra: HashMap::new(),
        }
    }

    /// Excerpt for listings: the author's summary, or one derived from the body
    pub fn listing_excerpt(&self, options: &ExcerptOptions) -> String {
        derive_excerpt_with(Some(&self.body), self.excerpt.as_deref(), options)
    }

    /// Get the newer neighbour in a date-descending list
    pub fn prev<'a>(&self, articles: &'a [Article]) -> Option<&'a Article> {
        let pos = articles.iter().position(|a| a.slug == self.slug)?;
        pos.checked_sub(1).map(|i| &articles[i])
    }

    /// Get the older neighbour in a date-descending list
    pub fn next<'a>(&self, articles: &'a [Article]) -> Option<&'a Article> {
        let pos = articles.iter().position(|a| a.slug == self.slug)?;
        articles.get(pos + 1)
    }
}
