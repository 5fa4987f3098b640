//! Marker-driven line scanning for quantum chemistry output files.
//!
//! Nearly every parser in this crate follows the same recipe: find a line
//! containing a marker string, then consume a fixed number of following lines
//! and pull numbers out of whitespace-separated fields or fixed column ranges.
//! This module provides the shared pieces of that recipe:
//!
//! - [`LineCursor`]: a forward-only cursor over the lines of a file
//! - [`column`] / [`parse_column`]: fixed-column slicing that tolerates short lines
//! - [`parse_fields`] / [`parse_triple`]: whitespace-separated numeric fields
//!
//! # Examples
//!
//! ```
//! use qctools::scanner::{LineCursor, parse_triple};
//!
//! let text = "header\n The g-matrix:\n  2.0  0.0  0.0\n";
//! let mut cursor = LineCursor::new(text);
//! cursor.seek("The g-matrix").unwrap();
//! let row = parse_triple(cursor.next_line().unwrap(), 0).unwrap();
//! assert_eq!(row, [2.0, 0.0, 0.0]);
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Error type for output scraping and text-format reading.
#[derive(Error, Debug)]
pub enum ScanError {
    /// File system or I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A required marker string never appeared
    #[error("Marker not found: '{0}'")]
    MarkerNotFound(String),
    /// The file ended while a block was still being read
    #[error("Unexpected end of file while reading {0}")]
    UnexpectedEof(String),
    /// A value could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Type alias for scanning results
pub type Result<T> = std::result::Result<T, ScanError>;

/// Reads a whole file into memory.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        ScanError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}

/// A forward-only cursor over the lines of a text file.
///
/// The cursor owns nothing; it borrows the file contents and hands out `&str`
/// slices. `seek` leaves the cursor on the line *after* the matching marker,
/// mirroring the `for line in file: if marker in line: next(file)` idiom that
/// output scrapers are built around.
#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    /// Creates a cursor positioned at the first line of `text`.
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            pos: 0,
        }
    }

    /// Index of the next line to be returned.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// True when all lines have been consumed.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.lines.len()
    }

    /// Moves the cursor back to the first line.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Returns the next line without consuming it.
    pub fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    /// Consumes and returns the next line.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::UnexpectedEof`] when no lines remain.
    pub fn next_line(&mut self) -> Result<&'a str> {
        match self.lines.get(self.pos) {
            Some(line) => {
                self.pos += 1;
                Ok(line)
            }
            None => Err(ScanError::UnexpectedEof(format!(
                "line {} (file has {} lines)",
                self.pos + 1,
                self.lines.len()
            ))),
        }
    }

    /// Consumes `n` lines, failing if the file ends first.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        for _ in 0..n {
            self.next_line()?;
        }
        Ok(())
    }

    /// Advances past the next line containing `marker` and returns that line.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::MarkerNotFound`] when the marker does not occur in
    /// the remaining lines. The cursor is left at the end of the file.
    pub fn seek(&mut self, marker: &str) -> Result<&'a str> {
        self.try_seek(marker)
            .ok_or_else(|| ScanError::MarkerNotFound(marker.to_string()))
    }

    /// Like [`seek`](Self::seek) but returns `None` instead of an error.
    pub fn try_seek(&mut self, marker: &str) -> Option<&'a str> {
        self.seek_with(|line| line.contains(marker))
    }

    /// Advances past the next line for which `pred` holds and returns it.
    pub fn seek_with<F: Fn(&str) -> bool>(&mut self, pred: F) -> Option<&'a str> {
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            self.pos += 1;
            if pred(line) {
                return Some(line);
            }
        }
        None
    }

    /// Positions the cursor after the *last* line containing `marker`.
    ///
    /// Useful for geometry optimizations, where only the final printout of a
    /// block is wanted.
    pub fn seek_last(&mut self, marker: &str) -> Result<&'a str> {
        let found = self
            .lines
            .iter()
            .enumerate()
            .skip(self.pos)
            .filter(|(_, line)| line.contains(marker))
            .last()
            .map(|(i, line)| (i, *line));
        match found {
            Some((i, line)) => {
                self.pos = i + 1;
                Ok(line)
            }
            None => Err(ScanError::MarkerNotFound(marker.to_string())),
        }
    }
}

/// Returns the trimmed text between character columns `start` and `end`.
///
/// Columns past the end of the line are clamped, so a short line gives an
/// empty (or partial) slice rather than a panic.
///
/// ```
/// use qctools::scanner::column;
///
/// assert_eq!(column("   1  -0.0123", 0, 4), "1");
/// assert_eq!(column("abc", 5, 10), "");
/// ```
pub fn column(line: &str, start: usize, end: usize) -> &str {
    let byte_at = |col: usize| {
        line.char_indices()
            .nth(col)
            .map(|(b, _)| b)
            .unwrap_or(line.len())
    };
    let (s, e) = (byte_at(start), byte_at(end.max(start)));
    line[s..e].trim()
}

/// Parses the value found in a fixed column range.
///
/// # Arguments
///
/// * `line` - Line to slice
/// * `start`, `end` - Character column range (end exclusive)
/// * `what` - Name of the quantity, used in error messages
pub fn parse_column<T: FromStr>(line: &str, start: usize, end: usize, what: &str) -> Result<T> {
    let text = column(line, start, end);
    text.parse().map_err(|_| {
        ScanError::Parse(format!(
            "cannot read {} from columns {}..{} ('{}') of line '{}'",
            what, start, end, text, line
        ))
    })
}

/// Parses every whitespace-separated field after the first `skip` fields.
pub fn parse_fields<T: FromStr>(line: &str, skip: usize) -> Result<Vec<T>> {
    line.split_whitespace()
        .skip(skip)
        .map(|tok| {
            tok.parse()
                .map_err(|_| ScanError::Parse(format!("bad field '{}' in line '{}'", tok, line)))
        })
        .collect()
}

/// Parses exactly three floating-point fields after the first `skip` fields.
pub fn parse_triple(line: &str, skip: usize) -> Result<[f64; 3]> {
    let tokens: Vec<&str> = line.split_whitespace().skip(skip).take(3).collect();
    if tokens.len() != 3 {
        return Err(ScanError::Parse(format!(
            "expected three values after {} fields in line '{}'",
            skip, line
        )));
    }
    let mut out = [0.0; 3];
    for (slot, tok) in out.iter_mut().zip(&tokens) {
        *slot = tok
            .parse()
            .map_err(|_| ScanError::Parse(format!("bad number '{}' in line '{}'", tok, line)))?;
    }
    Ok(out)
}

/// Returns the `index`-th whitespace field of a line as a float.
pub fn field_f64(line: &str, index: usize) -> Result<f64> {
    let tok = line.split_whitespace().nth(index).ok_or_else(|| {
        ScanError::Parse(format!("line '{}' has no field {}", line, index))
    })?;
    tok.parse()
        .map_err(|_| ScanError::Parse(format!("bad number '{}' in line '{}'", tok, line)))
}
