//! Placeholder rendering for template files.
//!
//! # Syntax
//!
//! - `<%= key %>` - replaced with the HTML-escaped value of `key`
//! - `<%- key %>` - replaced with the raw value of `key`
//! - `<%%` - produces a literal `<%`
//!
//! Any other `<%` is left as it is. Keys may be dotted (`author.name`) to
//! reach into nested objects.
//!
//! # Example
//!
//! ```text
//! { "name": "<%= className %>", "version": "<%= version %>" }
//! ```

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, SproutError};

/// Paths under the project directory that are never rendered.
pub const ALWAYS_IGNORE: &[&str] = &["**/node_modules/**"];

const DEPENDENCY_DIR: &str = "node_modules";

/// A piece of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Text copied as is.
    Literal(String),
    /// `<%= key %>`
    Escaped(String),
    /// `<%- key %>`
    Raw(String),
}

/// Split template text into segments.
pub fn parse_template(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = input;

    while let Some(start) = rest.find("<%") {
        literal.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let tag = match after.chars().next() {
            Some('%') => {
                literal.push_str("<%");
                rest = &after[1..];
                continue;
            }
            Some(c @ ('=' | '-')) => c,
            _ => {
                literal.push_str("<%");
                rest = after;
                continue;
            }
        };

        let body = &after[1..];
        let Some(end) = body.find("%>") else {
            // Unterminated tag, keep the remainder verbatim.
            literal.push_str(&rest[start..]);
            rest = "";
            break;
        };

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        let key = body[..end].trim().trim_end_matches('-').trim_end().to_string();
        segments.push(if tag == '=' {
            Segment::Escaped(key)
        } else {
            Segment::Raw(key)
        });
        rest = &body[end + 2..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Whether the text contains any placeholder.
pub fn has_placeholders(input: &str) -> bool {
    parse_template(input)
        .iter()
        .any(|s| !matches!(s, Segment::Literal(_)))
}

/// Render template text against `context`.
///
/// `path` only names the source in errors.
///
/// # Errors
/// Returns [`SproutError::UnresolvedPlaceholder`] for a key missing from
/// `context`.
pub fn render_str(input: &str, context: &Map<String, Value>, path: &Path) -> Result<String> {
    let mut out = String::with_capacity(input.len());

    for segment in parse_template(input) {
        match segment {
            Segment::Literal(text) => out.push_str(&text),
            Segment::Escaped(key) => out.push_str(&escape_html(&lookup(context, &key, path)?)),
            Segment::Raw(key) => out.push_str(&lookup(context, &key, path)?),
        }
    }

    Ok(out)
}

fn lookup(context: &Map<String, Value>, key: &str, path: &Path) -> Result<String> {
    let unresolved = || SproutError::UnresolvedPlaceholder {
        path: path.to_path_buf(),
        key: key.to_string(),
    };

    let mut parts = key.split('.');
    let first = parts.next().ok_or_else(unresolved)?;
    let mut value = context.get(first).ok_or_else(unresolved)?;
    for part in parts {
        value = value.get(part).ok_or_else(unresolved)?;
    }

    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Escape the characters HTML treats specially.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render one file in place.
///
/// Files that are not UTF-8 are left alone. Returns whether the file changed.
pub fn render_file(path: &Path, context: &Map<String, Value>) -> Result<bool> {
    let bytes = fs::read(path)?;
    let Ok(text) = String::from_utf8(bytes) else {
        debug!("Skipping non-UTF-8 file {}", path.display());
        return Ok(false);
    };

    let rendered = render_str(&text, context, path)?;
    if rendered == text {
        return Ok(false);
    }
    fs::write(path, rendered)?;
    Ok(true)
}

/// Compile ignore globs, always including [`ALWAYS_IGNORE`].
pub fn ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let all = ALWAYS_IGNORE
        .iter()
        .map(|p| p.to_string())
        .chain(patterns.iter().cloned());

    for pattern in all {
        let glob = Glob::new(&pattern).map_err(|e| {
            SproutError::Other(anyhow::anyhow!("Invalid ignore pattern '{}': {}", pattern, e))
        })?;
        builder.add(glob);
    }

    builder
        .build()
        .map_err(|e| SproutError::Other(anyhow::anyhow!("Failed to build ignore set: {}", e)))
}

/// Render every non-ignored file under `root` in place.
///
/// `ignore` globs are matched against paths relative to `root`. Returns the
/// files that changed.
pub fn render_dir(
    root: &Path,
    ignore: &[String],
    context: &Map<String, Value>,
) -> Result<Vec<PathBuf>> {
    let ignored = ignore_set(ignore)?;
    let mut changed = Vec::new();

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != DEPENDENCY_DIR);

    for entry in walker {
        let entry = entry.map_err(|e| SproutError::Other(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if ignored.is_match(relative) {
            debug!("Not rendering ignored {}", relative.display());
            continue;
        }

        if render_file(entry.path(), context)? {
            changed.push(entry.path().to_path_buf());
        }
    }

    Ok(changed)
}
