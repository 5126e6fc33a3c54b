//! Paginated article listings
//!
//! Combines the paginator with excerpt derivation. Excerpts are derived only
//! for the articles on the requested page.

use serde::Serialize;

use crate::content::{Article, ExcerptOptions};
use crate::helpers::{html_escape, post_url};
use crate::pagination::Paginator;

/// One article row in a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub excerpt: String,
    pub href: String,
}

/// A listing page with its navigation links
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
    pub entries: Vec<ListingEntry>,
}

impl Listing {
    /// Build the listing page for a requested page number
    pub fn build(
        articles: &[Article],
        paginator: &Paginator,
        requested: i64,
        excerpt: &ExcerptOptions,
    ) -> Self {
        let window = paginator.paginate(articles, requested);

        let entries = window
            .items
            .iter()
            .map(|article| ListingEntry {
                slug: article.slug.clone(),
                title: article.title.clone(),
                date: article.date.clone(),
                excerpt: article.listing_excerpt(excerpt),
                href: post_url(&article.slug),
            })
            .collect();

        Self {
            current_page: window.current_page,
            total_pages: window.total_pages,
            total_items: window.total_items,
            prev_href: window.prev_page.map(|p| paginator.href(p)),
            next_href: window.next_page.map(|p| paginator.href(p)),
            entries,
        }
    }

    /// Render the article rows as HTML
    pub fn entries_html(&self) -> String {
        let mut html = r#"<section class="post-list">"#.to_string();
        for entry in &self.entries {
            html.push_str(&format!(
                concat!(
                    r#"<article class="post-preview"><a href="{}">"#,
                    r#"<h3 class="post-preview-title">{}</h3>"#,
                    r#"<p class="post-preview-excerpt">{}</p>"#,
                    r#"<span class="post-preview-date">{}</span>"#,
                    "</a></article>"
                ),
                html_escape(&entry.href),
                html_escape(&entry.title),
                html_escape(&entry.excerpt),
                html_escape(&entry.date),
            ));
        }
        html.push_str("</section>");
        html
    }

    /// Render the page navigation, see [`pagination_nav`]
    pub fn nav_html(&self) -> String {
        pagination_nav(
            self.current_page,
            self.total_pages,
            self.prev_href.as_deref(),
            self.next_href.as_deref(),
        )
    }
}

/// Previous / `current / total` / next navigation.
///
/// Renders nothing when everything fits on one page. A missing neighbour is
/// shown as a disabled label.
pub fn pagination_nav(
    current: usize,
    total: usize,
    prev_href: Option<&str>,
    next_href: Option<&str>,
) -> String {
    if total <= 1 {
        return String::new();
    }

    let mut html = r#"<nav class="pagination" aria-label="記事一覧のページング">"#.to_string();
    html.push_str(&nav_link("pagination-prev", prev_href, "前へ"));
    html.push_str(&format!(
        r#"<span class="pagination-status">{} / {}</span>"#,
        current, total
    ));
    html.push_str(&nav_link("pagination-next", next_href, "次へ"));
    html.push_str("</nav>");
    html
}

fn nav_link(class: &str, href: Option<&str>, text: &str) -> String {
    match href {
        Some(href) => format!(
            r#"<a class="{}" href="{}">{}</a>"#,
            class,
            html_escape(href),
            text
        ),
        None => format!(r#"<span class="{} disabled">{}</span>"#, class, text),
    }
}
