//! Markdown rendering with syntax highlighting
//!
//! Output is an HTML fragment meant to be injected into an article page as-is,
//! so the renderer sanitizes on the way out: raw HTML in the source is escaped
//! and script-capable link targets are neutralized. Besides CommonMark + GFM it
//! understands `$math$`, `$$display math$$` and the `:::` callout directives
//! from [`super::directive`].

use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd,
};
use std::collections::HashMap;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::directive::{self, Block, DirectiveKind};
use crate::error::RenderError;
use crate::helpers::html_escape;

/// Default syntect theme
pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Directive nesting beyond this depth is rejected
pub const MAX_DIRECTIVE_DEPTH: usize = 8;

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme: Theme,
    line_numbers: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        let mut theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .remove(DEFAULT_THEME)
            .unwrap_or_default();
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
            line_numbers: false,
        }
    }

    /// Create with custom settings
    pub fn with_options(theme: &str, line_numbers: bool) -> Result<Self, RenderError> {
        let mut theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .remove(theme)
            .ok_or_else(|| RenderError::UnknownTheme(theme.to_string()))?;
        Ok(Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
            line_numbers,
        })
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> Result<String, RenderError> {
        // Directives become marker lines so the whole body is parsed once and
        // reference links and footnotes resolve across directive boundaries
        let mut markers = DirectiveMarkers::new(markdown);
        let mut source = String::with_capacity(markdown.len());
        markers.flatten(markdown, 0, &mut source)?;
        Ok(self.render_markdown(&source, &markers))
    }

    /// Render markdown, falling back to the escaped source on failure
    pub fn render_or_escape(&self, markdown: &str) -> String {
        match self.render(markdown) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Falling back to raw article text: {}", e);
                format!(r#"<pre class="raw-fallback">{}</pre>"#, html_escape(markdown))
            }
        }
    }

    fn render_markdown(&self, markdown: &str, markers: &DirectiveMarkers) -> String {
        // Front-matter is split off before rendering, so no metadata blocks here
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_DEFINITION_LIST
            | Options::ENABLE_GFM
            | Options::ENABLE_MATH;
        let parser = Parser::new_ext(markdown, options);

        let mut anchors = HeadingAnchors::default();
        let mut events: Vec<Event> = Vec::new();
        let mut code_block: Option<(Option<String>, String)> = None;
        let mut heading: Option<PendingHeading> = None;

        for event in parser {
            if code_block.is_some() {
                match event {
                    Event::Text(text) => {
                        if let Some((_, code)) = code_block.as_mut() {
                            code.push_str(&text);
                        }
                    }
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some((info, code)) = code_block.take() {
                            let html = self.highlight_code(&code, info.as_deref());
                            events.push(Event::Html(CowStr::from(html)));
                        }
                    }
                    _ => {}
                }
                continue;
            }

            let event = match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let info = match kind {
                        CodeBlockKind::Fenced(info) if !info.trim().is_empty() => {
                            Some(info.trim().to_string())
                        }
                        _ => None,
                    };
                    code_block = Some((info, String::new()));
                    continue;
                }
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    heading = Some(PendingHeading {
                        level,
                        id,
                        classes,
                        attrs,
                        inner: Vec::new(),
                    });
                    continue;
                }
                Event::End(TagEnd::Heading(level)) => {
                    if let Some(pending) = heading.take() {
                        let id = match pending.id {
                            Some(id) => id,
                            None => CowStr::from(anchors.next(&heading_text(&pending.inner))),
                        };
                        events.push(Event::Start(Tag::Heading {
                            level: pending.level,
                            id: Some(id),
                            classes: pending.classes,
                            attrs: pending.attrs,
                        }));
                        events.extend(pending.inner);
                    }
                    events.push(Event::End(TagEnd::Heading(level)));
                    continue;
                }
                Event::Html(raw) => match markers.lookup(&raw) {
                    Some(html) => Event::Html(CowStr::from(html.to_string())),
                    None => Event::Text(raw),
                },
                Event::InlineHtml(raw) => Event::Text(raw),
                Event::InlineMath(tex) => Event::InlineHtml(CowStr::from(format!(
                    r#"<embed-katex><eq class="zn-inline-equation">{}</eq></embed-katex>"#,
                    html_escape(&tex)
                ))),
                Event::DisplayMath(tex) => Event::InlineHtml(CowStr::from(format!(
                    r#"<embed-katex display-mode="1"><eq class="zn-block-equation">{}</eq></embed-katex>"#,
                    html_escape(&tex)
                ))),
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => Event::Start(Tag::Link {
                    link_type,
                    dest_url: safe_url(dest_url, false),
                    title,
                    id,
                }),
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => Event::Start(Tag::Image {
                    link_type,
                    dest_url: safe_url(dest_url, true),
                    title,
                    id,
                }),
                other => other,
            };

            match heading.as_mut() {
                Some(pending) => pending.inner.push(event),
                None => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Highlight a code block, `info` being the fence's `lang[:filename]`
    fn highlight_code(&self, code: &str, info: Option<&str>) -> String {
        let (lang, filename) = split_info(info);

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let lines = match self.highlight_lines(code, syntax) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::debug!("Highlighting failed for `{}`: {}", lang, e);
                LinesWithEndings::from(code).map(html_escape).collect()
            }
        };

        let class = css_class(lang);
        let block = if self.line_numbers {
            self.numbered_block(&lines, &class)
        } else {
            format!(
                r#"<pre class="highlight"{}><code class="language-{}">{}</code></pre>"#,
                self.background_style(),
                class,
                lines.concat()
            )
        };

        match filename {
            Some(name) => format!(
                r#"<div class="code-block-container"><div class="code-block-filename-container"><span class="code-block-filename">{}</span></div>{}</div>"#,
                html_escape(name),
                block
            ),
            None => block,
        }
    }

    fn highlight_lines(
        &self,
        code: &str,
        syntax: &syntect::parsing::SyntaxReference,
    ) -> Result<Vec<String>, syntect::Error> {
        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        LinesWithEndings::from(code)
            .map(|line| {
                let regions = highlighter.highlight_line(line, &self.syntax_set)?;
                styled_line_to_highlighted_html(&regions, IncludeBackground::No)
            })
            .collect()
    }

    /// Add line numbers to highlighted code
    fn numbered_block(&self, lines: &[String], class: &str) -> String {
        let gutter: Vec<String> = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect();
        let code: Vec<String> = lines.iter().map(|l| l.replace(['\n', '\r'], "")).collect();

        format!(
            r#"<figure class="highlight {}"{}><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre>{}</pre></td></tr></table></figure>"#,
            class,
            self.background_style(),
            gutter.join("\n"),
            code.join("\n")
        )
    }

    fn background_style(&self) -> String {
        self.theme
            .settings
            .background
            .map(|c| format!(r#" style="background-color:#{:02x}{:02x}{:02x};""#, c.r, c.g, c.b))
            .unwrap_or_default()
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Heading whose content is buffered until its id is known
struct PendingHeading<'a> {
    level: HeadingLevel,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    inner: Vec<Event<'a>>,
}

/// Allocates unique heading ids in document order
#[derive(Default)]
struct HeadingAnchors {
    seen: HashMap<String, usize>,
}

impl HeadingAnchors {
    fn next(&mut self, text: &str) -> String {
        let mut base = slug::slugify(text);
        if base.is_empty() {
            base = "section".to_string();
        }
        let count = self.seen.entry(base.clone()).or_insert(0);
        let id = if *count == 0 {
            base
        } else {
            format!("{}-{}", base, count)
        };
        *count += 1;
        id
    }
}

fn heading_text(events: &[Event]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Text(t) | Event::Code(t) | Event::InlineMath(t) => Some(t.as_ref()),
            _ => None,
        })
        .collect()
}

/// Directive wrappers keyed by the marker lines standing in for them
struct DirectiveMarkers {
    tag: String,
    html: Vec<String>,
}

impl DirectiveMarkers {
    fn new(source: &str) -> Self {
        // A tag that never occurs in the source, so authors can't forge markers
        let mut tag = String::from("folio-directive");
        while source.contains(&tag) {
            tag.push('x');
        }
        Self {
            tag,
            html: Vec::new(),
        }
    }

    /// Copy `source` into `out`, replacing directive fences with marker lines
    fn flatten(&mut self, source: &str, depth: usize, out: &mut String) -> Result<(), RenderError> {
        if depth > MAX_DIRECTIVE_DEPTH {
            return Err(RenderError::DirectiveDepth(MAX_DIRECTIVE_DEPTH));
        }

        for block in directive::split_blocks(source) {
            match block {
                Block::Markdown(text) => out.push_str(&text),
                Block::Directive { kind, body } => {
                    let (open, close) = directive_html(&kind);
                    self.push_marker(open, out);
                    self.flatten(body, depth + 1, out)?;
                    self.push_marker(close, out);
                }
            }
        }
        Ok(())
    }

    /// Emit a marker as its own HTML block
    fn push_marker(&mut self, html: String, out: &mut String) {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&format!("\n<!--{}:{}-->\n\n", self.tag, self.html.len()));
        self.html.push(html);
    }

    fn lookup(&self, raw: &str) -> Option<&str> {
        let index = raw
            .trim()
            .strip_prefix("<!--")?
            .strip_suffix("-->")?
            .strip_prefix(self.tag.as_str())?
            .strip_prefix(':')?;
        let index: usize = index.parse().ok()?;
        self.html.get(index).map(String::as_str)
    }
}

/// Opening and closing markup of a directive
fn directive_html(kind: &DirectiveKind) -> (String, String) {
    match kind {
        DirectiveKind::Message { alert } => (
            format!(
                "<aside class=\"msg {}\"><div class=\"msg-content\">\n",
                if *alert { "alert" } else { "message" }
            ),
            "</div></aside>\n".to_string(),
        ),
        DirectiveKind::Details { summary } => (
            format!(
                "<details><summary>{}</summary><div class=\"details-content\">\n",
                html_escape(summary)
            ),
            "</div></details>\n".to_string(),
        ),
    }
}

/// Replace destinations that could run script with `#`
fn safe_url(url: CowStr<'_>, image: bool) -> CowStr<'_> {
    let Some((scheme, rest)) = url.split_once(':') else {
        return url;
    };
    let scheme: String = scheme
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_ascii_lowercase();

    // A colon after a path, query or fragment separator is not a scheme
    let blocked = !scheme.contains(['/', '?', '#'])
        && match scheme.as_str() {
            "javascript" | "vbscript" | "file" => true,
            "data" => !(image && rest.trim_start().starts_with("image/")),
            _ => false,
        };

    if blocked {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

fn split_info(info: Option<&str>) -> (&str, Option<&str>) {
    let Some(info) = info else {
        return ("text", None);
    };
    let token = info.split_whitespace().next().unwrap_or("text");
    match token.split_once(':') {
        Some((lang, name)) if !name.is_empty() => {
            (if lang.is_empty() { "text" } else { lang }, Some(name))
        }
        Some((lang, _)) if !lang.is_empty() => (lang, None),
        Some(_) => ("text", None),
        None => (token, None),
    }
}

/// Keep a language tag usable inside a class attribute
fn css_class(lang: &str) -> String {
    lang.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Hello World\n\nThis is a test.").unwrap();
        assert!(html.contains(r#"<h1 id="hello-world">Hello World</h1>"#));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_render_constructs() {
        let renderer = MarkdownRenderer::new();
        let md = "- one\n- two\n\n> quoted\n\n*em* **strong** [link](/posts/a) ![alt](/img.png)\n\n| a | b |\n|---|---|\n| 1 | 2 |\n";
        let html = renderer.render(md).unwrap();
        assert!(html.contains("<ul>"));
        assert!(html.contains("<blockquote>"));
        assert!(html.contains("<em>em</em>"));
        assert!(html.contains("<strong>strong</strong>"));
        assert!(html.contains(r#"<a href="/posts/a">link</a>"#));
        assert!(html.contains(r#"<img src="/img.png" alt="alt" />"#));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("## Setup\n\n## Setup\n\n## `code` *x*").unwrap();
        assert!(html.contains(r#"<h2 id="setup">Setup</h2>"#));
        assert!(html.contains(r#"<h2 id="setup-1">Setup</h2>"#));
        assert!(html.contains(r#"<h2 id="code-x"><code>code</code> <em>x</em></h2>"#));
    }

    #[test]
    fn test_render_code_block() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```").unwrap();
        assert!(html.contains(r#"class="language-rust""#));
        assert!(html.contains("<span"));
        assert!(!html.contains("```"));
    }

    #[test]
    fn test_code_block_filename() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```js:src/<app>.js\nconst a = 1;\n```").unwrap();
        assert!(html.contains(r#"<span class="code-block-filename">src/&lt;app&gt;.js</span>"#));
        assert!(html.contains(r#"class="language-js""#));
    }

    #[test]
    fn test_code_block_is_escaped() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```\n<script>alert(1)</script>\n```").unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_line_numbers() {
        let renderer = MarkdownRenderer::with_options(DEFAULT_THEME, true).unwrap();
        let html = renderer.render("```\na\nb\n```").unwrap();
        assert!(html.contains(r#"<span class="line-number">2</span>"#));
        assert!(html.contains(r#"<td class="gutter">"#));
    }

    #[test]
    fn test_unknown_theme() {
        assert!(matches!(
            MarkdownRenderer::with_options("no-such-theme", false),
            Err(RenderError::UnknownTheme(_))
        ));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("<script>alert(1)</script>\n\nText <img src=x onerror=alert(1)> here")
            .unwrap();
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<img src=x"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_unsafe_links_are_neutralized() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("[a](javascript:alert(1)) [b](JavaScript:alert(1)) [c](data:text/html,x) [d](https://ok.example)")
            .unwrap();
        assert!(!html.to_ascii_lowercase().contains("javascript:"));
        assert!(!html.contains("data:text/html"));
        assert!(html.contains(r#"<a href="https://ok.example">d</a>"#));
        assert_eq!(html.matches(r##"href="#""##).count(), 3);
    }

    #[test]
    fn test_data_image_allowed_for_images_only() {
        assert_eq!(
            safe_url(CowStr::Borrowed("data:image/png;base64,AAAA"), true).as_ref(),
            "data:image/png;base64,AAAA"
        );
        assert_eq!(
            safe_url(CowStr::Borrowed("data:image/png;base64,AAAA"), false).as_ref(),
            "#"
        );
        assert_eq!(safe_url(CowStr::Borrowed("/a:b"), false).as_ref(), "/a:b");
    }

    #[test]
    fn test_math() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("Inline $a<b$ and\n\n$$x^2$$").unwrap();
        assert!(html.contains(
            r#"<embed-katex><eq class="zn-inline-equation">a&lt;b</eq></embed-katex>"#
        ));
        assert!(html.contains(r#"<embed-katex display-mode="1"><eq class="zn-block-equation">"#));
    }

    #[test]
    fn test_message_directive() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render(":::message alert\n**Careful**\n:::\n\nafter")
            .unwrap();
        assert!(html.starts_with(
            "<aside class=\"msg alert\"><div class=\"msg-content\">\n<p><strong>Careful</strong></p>\n</div></aside>"
        ));
        assert!(html.contains("<p>after</p>"));
    }

    #[test]
    fn test_references_resolve_across_directives() {
        let renderer = MarkdownRenderer::new();
        let md = "See [docs][d] and a claim[^1].\n\n:::message\nnote\n:::\n\n[d]: https://example.com\n[^1]: The source.\n";
        let html = renderer.render(md).unwrap();
        assert!(html.contains(r#"<a href="https://example.com">docs</a>"#));
        assert!(html.contains(r#"class="footnote-reference""#));
        assert!(!html.contains("[docs][d]"));
        assert!(!html.contains("[^1]"));
    }

    #[test]
    fn test_references_defined_inside_directive() {
        let renderer = MarkdownRenderer::new();
        let md = ":::details More\n[here][x]\n:::\n\n::::message\n[x]: /posts/a\n::::\n";
        let html = renderer.render(md).unwrap();
        assert!(html.contains(r#"<a href="/posts/a">here</a>"#));
    }

    #[test]
    fn test_nested_directives_wrap_in_order() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("::::details Outer\n:::message\ninner\n:::\n::::\n")
            .unwrap();
        let details = html.find("<details>").unwrap();
        let aside = html.find("<aside").unwrap();
        let inner = html.find("<p>inner</p>").unwrap();
        let aside_end = html.find("</aside>").unwrap();
        let details_end = html.find("</details>").unwrap();
        assert!(details < aside && aside < inner && inner < aside_end && aside_end < details_end);
    }

    #[test]
    fn test_author_comments_cannot_forge_directives() {
        let renderer = MarkdownRenderer::new();
        let md = "<!--folio-directive:0-->\n\n:::message\nx\n:::\n";
        let html = renderer.render(md).unwrap();
        assert!(html.contains("&lt;!--folio-directive:0--&gt;"));
        assert_eq!(html.matches("<aside").count(), 1);
        assert_eq!(html.matches("</aside>").count(), 1);
    }

    #[test]
    fn test_details_directive() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render(":::details <Open> me\nhidden *text*\n:::")
            .unwrap();
        assert!(html.contains("<details><summary>&lt;Open&gt; me</summary>"));
        assert!(html.contains("<em>text</em>"));
    }

    #[test]
    fn test_malformed_directive_degrades_to_text() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render(":::message\nnot closed").unwrap();
        assert!(html.contains(":::message"));
        assert!(html.contains("not closed"));
    }

    #[test]
    fn test_too_deep_nesting_falls_back() {
        let depth = MAX_DIRECTIVE_DEPTH + 2;
        let mut md = String::new();
        for level in 0..depth {
            md.push_str(&format!("{}message\n", ":".repeat(3 + depth - level)));
        }
        md.push_str("core <b>\n");
        for level in (0..depth).rev() {
            md.push_str(&format!("{}\n", ":".repeat(3 + depth - level)));
        }

        let renderer = MarkdownRenderer::new();
        assert!(matches!(
            renderer.render(&md),
            Err(RenderError::DirectiveDepth(_))
        ));
        let fallback = renderer.render_or_escape(&md);
        assert!(fallback.starts_with(r#"<pre class="raw-fallback">"#));
        assert!(fallback.contains("core &lt;b&gt;"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = MarkdownRenderer::new();
        let md = "# A\n\n## A\n\n```python\nprint('x')\n```\n\n:::details d\n$x$\n:::\n";
        assert_eq!(renderer.render(md).unwrap(), renderer.render(md).unwrap());
        assert_eq!(
            renderer.render(md).unwrap(),
            MarkdownRenderer::new().render(md).unwrap()
        );
    }

    #[test]
    fn test_split_info() {
        assert_eq!(split_info(None), ("text", None));
        assert_eq!(split_info(Some("rust")), ("rust", None));
        assert_eq!(split_info(Some("rust:main.rs")), ("rust", Some("main.rs")));
        assert_eq!(split_info(Some(":main.rs")), ("text", Some("main.rs")));
        assert_eq!(split_info(Some("diff rust")), ("diff", None));
    }
}
