//! HTML page shell around rendered fragments

use crate::config::SiteConfig;
use crate::content::Article;
use crate::helpers::{full_url_for, html_escape, link_to, meta_generator, open_graph, post_url};
use crate::listing::Listing;

/// Registers `<embed-katex>` and friends in the browser
const EMBED_LOADER: &str =
    r#"<script type="module">import "https://esm.sh/zenn-embed-elements";</script>"#;

/// Head metadata for one page
pub struct PageMeta<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub path: &'a str,
    pub image: Option<&'a str>,
}

/// Wrap `body` in the site layout
pub fn layout(config: &SiteConfig, meta: &PageMeta<'_>, body: &str) -> String {
    let title = if meta.title == config.title {
        html_escape(&config.title)
    } else {
        format!("{} | {}", html_escape(meta.title), html_escape(&config.title))
    };
    let og = open_graph(
        meta.title,
        meta.description,
        &full_url_for(config, meta.path),
        meta.image,
        &config.title,
    );

    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<meta name="description" content="{description}">
{og}
{generator}
</head>
<body>
<header class="site-header"><a href="/">{site}</a></header>
<main>
{body}
</main>
{loader}
</body>
</html>
"#,
        title = title,
        description = html_escape(meta.description),
        og = og,
        generator = meta_generator(),
        site = html_escape(&config.title),
        body = body,
        loader = EMBED_LOADER,
    )
}

/// Listing page: article rows followed by the page navigation
pub fn listing_page(config: &SiteConfig, listing: &Listing, path: &str) -> String {
    let body = format!("{}\n{}", listing.entries_html(), listing.nav_html());
    let meta = PageMeta {
        title: &config.title,
        description: &config.description,
        path,
        image: None,
    };
    layout(config, &meta, &body)
}

/// Article detail page
pub fn article_page(
    config: &SiteConfig,
    article: &Article,
    content: &str,
    newer: Option<&Article>,
    older: Option<&Article>,
) -> String {
    let mut body = format!(
        r#"<article class="post"><h1 class="post-title">{}</h1><time class="post-date">{}</time>"#,
        html_escape(&article.title),
        html_escape(&article.date),
    );
    if let Some(cover) = &article.cover_image {
        body.push_str(&format!(
            r#"<img class="post-cover" src="{}" alt="{}">"#,
            html_escape(cover),
            html_escape(&article.title)
        ));
    }
    body.push_str(r#"<div class="znc post-body">"#);
    body.push_str(content);
    body.push_str("</div></article>");

    if newer.is_some() || older.is_some() {
        body.push_str(r#"<nav class="post-nav">"#);
        if let Some(newer) = newer {
            body.push_str(&link_to(&post_url(&newer.slug), &newer.title));
        }
        if let Some(older) = older {
            body.push_str(&link_to(&post_url(&older.slug), &older.title));
        }
        body.push_str("</nav>");
    }

    let path = post_url(&article.slug);
    let meta = PageMeta {
        title: &article.title,
        description: article
            .excerpt
            .as_deref()
            .unwrap_or(config.description.as_str()),
        path: &path,
        image: article.cover_image.as_deref(),
    };
    layout(config, &meta, &body)
}

/// Minimal standalone error page
pub fn error_page(title: &str, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
<meta charset="utf-8">
<meta name="robots" content="noindex">
<title>{title}</title>
</head>
<body>
<main class="error-page"><h1>{title}</h1><p>{message}</p><a href="/">トップへ戻る</a></main>
</body>
</html>
"#,
        title = html_escape(title),
        message = html_escape(message),
    )
}
