//! Text file helpers used to edit the target system's configuration.

use std::fs;
use std::io;
use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::error::Result;

/// Overwrite `path` with `content`, trimmed of surrounding whitespace and
/// terminated by exactly one newline.
pub fn write_to_file(path: &Path, content: &str) -> Result<()> {
    debug!(path = %path.display(), "writing file");
    fs::write(path, format!("{}\n", content.trim()))?;
    Ok(())
}

/// Apply `pattern` -> `replacement` to every line of `path` independently.
///
/// `replacement` uses regex syntax for groups (`$1`, `${name}`). Lines that do
/// not match are written back untouched, including their line endings.
pub fn replace_in_file(path: &Path, pattern: &Regex, replacement: &str) -> Result<()> {
    let original = fs::read_to_string(path)?;
    let edited = replace_lines(&original, pattern, replacement);

    if edited != original {
        debug!(path = %path.display(), pattern = pattern.as_str(), "editing file");
        fs::write(path, edited)?;
    }
    Ok(())
}

fn replace_lines(text: &str, pattern: &Regex, replacement: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| {
            let (body, ending) = match line.strip_suffix('\n') {
                Some(body) => (body, "\n"),
                None => (line, ""),
            };
            format!("{}{}", pattern.replace_all(body, replacement), ending)
        })
        .collect()
}

/// Remove `path` if it exists (files and symlinks, including dangling ones).
pub fn delete_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "deleted file");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Collapse every run of tabs and every run of two or more spaces into a
/// single space, on every line.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_gap = false;

    for c in text.chars() {
        if c == '\t' || c == ' ' {
            pending_gap = true;
            continue;
        }
        if pending_gap {
            out.push(' ');
            pending_gap = false;
        }
        out.push(c);
    }
    if pending_gap {
        out.push(' ');
    }
    out
}
