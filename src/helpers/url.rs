//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::config::SiteConfig;

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Root-relative URL for a site path
///
/// # Examples
/// ```ignore
/// url_for("blog") // -> "/blog"
/// ```
pub fn url_for(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

/// Absolute URL including the site domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/posts/hello") // -> "https://example.com/posts/hello"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    let path = url_for(path);
    if path == "/" {
        format!("{}/", base)
    } else {
        format!("{}{}", base, path)
    }
}

/// Link target of an article detail page
///
/// # Examples
/// ```ignore
/// post_url("hello world") // -> "/posts/hello%20world"
/// ```
pub fn post_url(slug: &str) -> String {
    format!("/posts/{}", encode_segment(slug))
}

/// Percent-encode one path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}
