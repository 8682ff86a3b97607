//! Parsing of `tree` output into depth-tagged entries.
//!
//! Every line below the root marker is a run of 4-character prefix units
//! (`│   `, `    `, or the ASCII `|   `) closed by a connector (`├── `,
//! `└── `, `|-- `, `` `-- ``), followed by the entry name. Each unit is one
//! nesting level, so a top-level entry sits at depth 1.

use crate::app::models::{EntryKind, Summary, TreeEntry};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const UNIT_WIDTH: usize = 4;

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)\s+director(?:y|ies)(?:\s*,\s*(\d+)\s+files?)?$")
        .expect("summary pattern compiles")
});

/// A line that could not be reduced to a depth and a name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedLine {
    #[error("line {line}: unrecognised prefix {prefix:?}")]
    BadPrefix {
        line: usize,
        depth: usize,
        prefix: String,
    },
    #[error("line {line}: entry has no name")]
    EmptyName { line: usize, depth: usize },
    #[error("line {line}: unsafe entry name {name:?}")]
    UnsafeName {
        line: usize,
        depth: usize,
        name: String,
    },
    #[error("line {line}: {text:?} has no connector")]
    NoConnector { line: usize, text: String },
    #[error("line {line}: {name:?} at depth {depth} has no parent directory")]
    Orphan {
        line: usize,
        name: String,
        depth: usize,
    },
}

impl MalformedLine {
    /// Depth the line would have occupied, when its prefix got that far.
    pub fn depth(&self) -> Option<usize> {
        match self {
            MalformedLine::BadPrefix { depth, .. }
            | MalformedLine::EmptyName { depth, .. }
            | MalformedLine::UnsafeName { depth, .. }
            | MalformedLine::Orphan { depth, .. } => Some(*depth),
            MalformedLine::NoConnector { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingLine {
    Blank,
    Root(String),
    Summary(Summary),
    Entry(TreeEntry),
}

/// Heuristic file detection by name: a period after the first character,
/// followed by a non-empty extension without path separators.
pub fn is_probably_file(name: &str) -> bool {
    let Some(dot) = name.rfind('.') else {
        return false;
    };
    if dot == 0 {
        return false;
    }
    let extension = &name[dot + 1..];
    !extension.is_empty() && !extension.contains(['/', '\\'])
}

pub fn parse_summary(text: &str) -> Option<Summary> {
    let caps = SUMMARY_RE.captures(text.trim())?;
    let directories = caps.get(1)?.as_str().parse().ok()?;
    let files = match caps.get(2) {
        Some(m) => Some(m.as_str().parse().ok()?),
        None => None,
    };
    Some(Summary { directories, files })
}

/// Walks a listing, classifying every line.
pub struct ListingParser<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    seen_root: bool,
}

impl<'a> ListingParser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            seen_root: false,
        }
    }

    fn classify(&mut self, number: usize, raw: &str) -> Result<ListingLine, MalformedLine> {
        let text = raw.trim_end();
        if text.trim_start().is_empty() {
            return Ok(ListingLine::Blank);
        }

        if let Some(summary) = parse_summary(text) {
            return Ok(ListingLine::Summary(summary));
        }

        if !starts_with_prefix_unit(text) {
            if self.seen_root {
                return Err(MalformedLine::NoConnector {
                    line: number,
                    text: text.to_string(),
                });
            }
            self.seen_root = true;
            return Ok(ListingLine::Root(text.to_string()));
        }
        // An indented listing without a root marker still parses
        self.seen_root = true;

        let (depth, rest) = split_prefix(number, text)?;
        let (name, kind) = clean_name(number, depth, rest)?;
        Ok(ListingLine::Entry(TreeEntry {
            name,
            depth,
            kind,
            line: number,
        }))
    }
}

impl Iterator for ListingParser<'_> {
    type Item = Result<ListingLine, MalformedLine>;

    fn next(&mut self) -> Option<Self::Item> {
        let (index, raw) = self.lines.next()?;
        Some(self.classify(index + 1, raw))
    }
}

fn normalise(c: char) -> char {
    if c == '\u{a0}' {
        ' '
    } else {
        c
    }
}

fn starts_with_prefix_unit(text: &str) -> bool {
    matches!(
        text.chars().next().map(normalise),
        Some('│' | '├' | '└' | '|' | '`' | ' ')
    )
}

/// Splits the connector run off a line, returning the depth and the remainder.
fn split_prefix(number: usize, text: &str) -> Result<(usize, &str), MalformedLine> {
    let mut depth = 0;
    let mut rest = text;
    loop {
        let end = rest
            .char_indices()
            .nth(UNIT_WIDTH)
            .map_or(rest.len(), |(i, _)| i);
        let (unit, tail) = rest.split_at(end);
        let unit: String = unit.chars().map(normalise).collect();
        depth += 1;
        match unit.as_str() {
            "│   " | "|   " | "    " => rest = tail,
            "├── " | "└── " | "|-- " | "`-- " => return Ok((depth, tail)),
            // Trailing whitespace was trimmed, so a nameless entry ends early
            "├──" | "└──" | "|--" | "`--" if tail.is_empty() => return Ok((depth, tail)),
            _ => {
                return Err(MalformedLine::BadPrefix {
                    line: number,
                    depth,
                    prefix: text[..text.len() - rest.len() + end].to_string(),
                })
            }
        }
    }
}

fn clean_name(
    number: usize,
    depth: usize,
    rest: &str,
) -> Result<(String, EntryKind), MalformedLine> {
    // `tree -l` and plain `tree` print symlinks as `name -> target`
    let name = rest.split(" -> ").next().unwrap_or(rest).trim();

    // `tree -F` marks directories with a trailing slash
    let (name, marked_dir) = match name.strip_suffix('/') {
        Some(stripped) => (stripped, true),
        None => (name, false),
    };

    if name.is_empty() {
        return Err(MalformedLine::EmptyName {
            line: number,
            depth,
        });
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(MalformedLine::UnsafeName {
            line: number,
            depth,
            name: name.to_string(),
        });
    }

    let kind = if !marked_dir && is_probably_file(name) {
        EntryKind::File
    } else {
        EntryKind::Directory
    };
    Ok((name.to_string(), kind))
}
