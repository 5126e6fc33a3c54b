//! Print the rendered HTML of one article

use anyhow::Result;

use crate::content::ContentStore;
use crate::Blog;

/// Render the article with `slug` to stdout
pub fn run(blog: &Blog, slug: &str) -> Result<()> {
    let store = ContentStore::load(&blog.posts_dir)?;
    let html = render(blog, &store, slug)?;
    println!("{}", html);
    Ok(())
}

fn render(blog: &Blog, store: &ContentStore, slug: &str) -> Result<String> {
    let article = match store.get_article_by_slug(slug) {
        Some(article) => article,
        None => anyhow::bail!("No article with slug `{}`", slug),
    };
    tracing::debug!("Rendering {:?}", article.source);
    let renderer = blog.renderer()?;
    Ok(renderer.render_or_escape(&article.body))
}
