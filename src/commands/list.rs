//! Print one listing page

use anyhow::Result;
use std::io::Write;

use crate::content::ContentStore;
use crate::listing::Listing;
use crate::pagination::parse_page_param;
use crate::Blog;

/// Print a page of the index listing, or of the blog listing with `blog`
pub fn run(blog: &Blog, page: Option<&str>, use_blog: bool) -> Result<()> {
    let store = ContentStore::load(&blog.posts_dir)?;
    let stdout = std::io::stdout();
    write_listing(blog, &store, page, use_blog, &mut stdout.lock())
}

fn write_listing<W: Write>(
    blog: &Blog,
    store: &ContentStore,
    page: Option<&str>,
    use_blog: bool,
    out: &mut W,
) -> Result<()> {
    let paginator = if use_blog {
        blog.blog_paginator()
    } else {
        blog.index_paginator()
    };
    let listing = Listing::build(
        store.get_all_articles(),
        &paginator,
        parse_page_param(page),
        &blog.config.excerpt,
    );

    writeln!(
        out,
        "Posts ({}), page {} / {}:",
        listing.total_items, listing.current_page, listing.total_pages
    )?;
    for entry in &listing.entries {
        writeln!(out, "  {} - {} [{}]", entry.date, entry.title, entry.href)?;
        writeln!(out, "      {}", entry.excerpt)?;
    }
    if let Some(prev) = &listing.prev_href {
        writeln!(out, "Previous: {}", prev)?;
    }
    if let Some(next) = &listing.next_href {
        writeln!(out, "Next: {}", next)?;
    }

    Ok(())
}
