//! Block directives (`:::message`, `:::details Title`)
//!
//! Directives fence a run of markdown between an opening line such as
//! `:::message alert` and a closing line made of the same number of colons.
//! Outer blocks use longer fences to contain inner ones:
//!
//! ```text
//! ::::details Click to expand
//! :::message
//! nested
//! :::
//! ::::
//! ```
//!
//! Anything that does not form a complete, known directive stays literal
//! markdown. Fenced code is never scanned for directives.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref OPEN_RE: Regex =
        Regex::new(r"^ {0,3}(:{3,})([A-Za-z]+)(?:[ \t]+(.*?))?[ \t]*$").unwrap();
}

/// Kind of a recognized directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Callout box; `alert` switches to the warning style
    Message { alert: bool },
    /// Collapsible section with a summary line
    Details { summary: String },
}

/// A slice of the source, either plain markdown or a directive body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    Markdown(String),
    Directive { kind: DirectiveKind, body: &'a str },
}

struct Opening {
    colons: usize,
    kind: DirectiveKind,
}

/// Split `source` into top-level markdown runs and directive blocks
pub fn split_blocks(source: &str) -> Vec<Block<'_>> {
    let lines: Vec<(usize, &str)> = line_spans(source);
    let mut blocks = Vec::new();
    let mut markdown = String::new();
    let mut fence = CodeFence::default();
    let mut i = 0;

    while i < lines.len() {
        let (start, line) = lines[i];

        if fence.update(line) {
            markdown.push_str(line);
            i += 1;
            continue;
        }

        if let Some(open) = parse_opening(line) {
            if let Some(close) = find_close(&lines[i + 1..], open.colons) {
                let close_idx = i + 1 + close;
                let body_start = start + line.len();
                let body_end = lines[close_idx].0;

                if !markdown.is_empty() {
                    blocks.push(Block::Markdown(std::mem::take(&mut markdown)));
                }
                blocks.push(Block::Directive {
                    kind: open.kind,
                    body: &source[body_start..body_end],
                });
                i = close_idx + 1;
                continue;
            }
        }

        markdown.push_str(line);
        i += 1;
    }

    if !markdown.is_empty() {
        blocks.push(Block::Markdown(markdown));
    }
    blocks
}

/// Lines with their byte offsets, line endings kept
fn line_spans(source: &str) -> Vec<(usize, &str)> {
    let mut offset = 0;
    source
        .split_inclusive('\n')
        .map(|line| {
            let span = (offset, line);
            offset += line.len();
            span
        })
        .collect()
}

fn parse_opening(line: &str) -> Option<Opening> {
    let caps = OPEN_RE.captures(line.trim_end_matches(['\n', '\r']))?;
    let colons = caps[1].len();
    let arg = caps.get(3).map(|m| m.as_str().trim()).unwrap_or_default();

    let kind = match caps[2].to_ascii_lowercase().as_str() {
        "message" => DirectiveKind::Message {
            alert: arg.eq_ignore_ascii_case("alert"),
        },
        "details" => DirectiveKind::Details {
            summary: arg.to_string(),
        },
        _ => return None,
    };

    Some(Opening { colons, kind })
}

/// Index of the line closing a directive opened with `colons` colons
fn find_close(lines: &[(usize, &str)], colons: usize) -> Option<usize> {
    let mut fence = CodeFence::default();
    lines.iter().position(|(_, line)| {
        if fence.update(line) {
            return false;
        }
        let trimmed = line.trim();
        trimmed.len() == colons && trimmed.bytes().all(|b| b == b':')
    })
}

/// Tracks whether the scanner is inside a fenced code block
#[derive(Default)]
struct CodeFence {
    open: Option<(char, usize)>,
}

impl CodeFence {
    /// Feed one line; true when the line belongs to a code fence
    fn update(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start_matches(' ');
        let indent = line.len() - trimmed.len();

        match self.open {
            Some((ch, len)) => {
                let run = trimmed.chars().take_while(|&c| c == ch).count();
                if indent <= 3 && run >= len && trimmed[run..].trim().is_empty() {
                    self.open = None;
                }
                true
            }
            None => {
                if indent > 3 {
                    return false;
                }
                let ch = match trimmed.chars().next() {
                    Some(c @ ('`' | '~')) => c,
                    _ => return false,
                };
                let run = trimmed.chars().take_while(|&c| c == ch).count();
                if run >= 3 {
                    self.open = Some((ch, run));
                    true
                } else {
                    false
                }
            }
        }
    }
}
