//! Parsing unified diffs into [`FileDiff`]s and [`Hunk`]s.
//!
//! The parser reads what [`crate::diff`] prints, plus what `git diff` and
//! `diff -ru` produce:
//!
//! - extended headers (`diff --git`, modes, renames, `index`, ...)
//! - `---`/`+++` file headers with optional quoted names and timestamps
//! - hunks, including `\ No newline at end of file` markers
//! - headers-only diffs (mode changes, pure renames, empty or binary files)
//! - `Only in <dir>: <file>` lines
//!
//! Text before the first `diff` line that does not belong to a file diff,
//! such as a mail preamble, is skipped, as are trailing lines after the last
//! file diff.
//!
//! # Examples
//!
//! ```
//! use git_unidiff::parse::parse_multi_file_diff;
//!
//! let diffs = parse_multi_file_diff(
//!     "diff --git a/x b/x\n--- a/x\n+++ b/x\n@@ -1,1 +1,1 @@\n-old\n+new\n",
//! )
//! .unwrap();
//! assert_eq!(diffs.len(), 1);
//! assert_eq!(diffs[0].orig_name, "a/x");
//! assert_eq!(diffs[0].hunks.as_ref().unwrap()[0].body, b"-old\n+new\n");
//! ```

use crate::diff::hunk::RangeHeader;
use crate::diff::{FileDiff, Hunk, ONLY_IN_PREFIX};
use crate::header::ExtendedHeaderKind;
use crate::quote::{DEV_NULL, parse_diff_git_args, read_quoted_filename};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use error_set::error_set;
use log::{debug, trace};

error_set! {
    /// Errors from parsing a unified diff
    ParseError := {
        /// `@@` line that is not a valid hunk range header
        #[display("Line {line}: invalid hunk header '{header}'")]
        InvalidHunkHeader { line: usize, header: String },
        /// Hunk body line that does not fit the hunk's line counts
        #[display("Line {line}: unexpected line in hunk '{content}'")]
        UnexpectedHunkLine { line: usize, content: String },
        /// Input ended or changed before the hunk's line counts were met
        #[display("Line {line}: hunk is missing {orig} original and {new} new lines")]
        TruncatedHunk { line: usize, orig: u32, new: u32 },
        /// `---` line not followed by a `+++` line
        #[display("Line {line}: expected '+++' file header")]
        MissingNewFileHeader { line: usize },
        /// Text after the tab of a file header is not a timestamp
        #[display("Line {line}: invalid timestamp '{value}'")]
        InvalidTimestamp { line: usize, value: String },
        /// Quoted file name that cannot be decoded
        #[display("Line {line}: invalid quoted file name '{name}'")]
        InvalidFileName { line: usize, name: String },
        /// Headers-only diff whose file names cannot be recovered
        #[display("Line {line}: cannot determine file names from extended headers")]
        MissingFileNames { line: usize },
        /// Hunk that is not preceded by `---`/`+++` file headers
        #[display("Line {line}: hunk without file headers")]
        UnexpectedHunk { line: usize },
        /// Input holds no file diff at all
        #[display("No file diff found")]
        NoFileDiff,
    }
}

/// Parse every file diff in `input`, in order.
///
/// # Errors
///
/// Returns [`ParseError`] for the first malformed file diff.
pub fn parse_multi_file_diff(input: &str) -> Result<Vec<FileDiff>, ParseError> {
    let mut parser = Parser::new(input);
    let mut files = Vec::new();
    while let Some(file) = parser.file_diff()? {
        files.push(file);
    }
    Ok(files)
}

/// Parse the first file diff in `input`.
///
/// # Errors
///
/// Returns [`ParseError::NoFileDiff`] if `input` holds no file diff, or the
/// error for a malformed one.
pub fn parse_file_diff(input: &str) -> Result<FileDiff, ParseError> {
    Parser::new(input).file_diff()?.ok_or(ParseError::NoFileDiff)
}

/// Parse a sequence of hunks with no file headers.
///
/// # Errors
///
/// Returns [`ParseError`] if a hunk is malformed or `input` contains
/// anything besides hunks.
pub fn parse_hunks(input: &str) -> Result<Vec<Hunk>, ParseError> {
    let mut parser = Parser::new(input);
    let hunks = parser.hunks()?;
    if let Some(rest) = parser.lines.peek() {
        return Err(ParseError::UnexpectedHunkLine {
            line: parser.lines.line_number(),
            content: strip_newline(rest).to_string(),
        });
    }
    Ok(hunks)
}

/// Cursor over the lines of the input, newlines included
struct Lines<'a> {
    rest: &'a str,
    consumed: usize,
}

impl<'a> Lines<'a> {
    fn peek(&self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        Some(match self.rest.find('\n') {
            Some(end) => &self.rest[..=end],
            None => self.rest,
        })
    }

    fn advance(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.rest = &self.rest[line.len()..];
        self.consumed += 1;
        Some(line)
    }

    /// 1-based number of the line `peek` returns
    fn line_number(&self) -> usize {
        self.consumed + 1
    }
}

fn strip_newline(line: &str) -> &str {
    line.strip_suffix('\n').unwrap_or(line)
}

struct Parser<'a> {
    lines: Lines<'a>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            lines: Lines {
                rest: input,
                consumed: 0,
            },
        }
    }

    /// Parse the next file diff, or `None` at the end of the input
    fn file_diff(&mut self) -> Result<Option<FileDiff>, ParseError> {
        let mut diff = FileDiff::default();
        let mut start = self.lines.line_number();

        while let Some(raw) = self.lines.peek() {
            let line = strip_newline(raw);

            if line.starts_with("--- ") {
                return self.file_headers_and_hunks(diff).map(Some);
            }

            if line.starts_with("@@ ") {
                return Err(ParseError::UnexpectedHunk {
                    line: self.lines.line_number(),
                });
            }

            if line.starts_with("diff ") && !diff.extended.is_empty() {
                if starts_file(&diff.extended) {
                    // Headers-only diff; this line begins the next file
                    break;
                }
                debug!(
                    "Skipping {} lines before line {}",
                    diff.extended.len(),
                    self.lines.line_number()
                );
                diff.extended.clear();
                start = self.lines.line_number();
            }

            if let Some((dir, file)) = line
                .strip_prefix(ONLY_IN_PREFIX)
                .and_then(|rest| rest.split_once(": "))
            {
                if starts_file(&diff.extended) {
                    break;
                }
                trace!("Only in {dir}: {file}");
                diff.orig_name = join_path(dir, file);
                self.lines.advance();
                return Ok(Some(diff));
            }

            trace!("Extended header: {line}");
            diff.extended.push(line.to_string());
            self.lines.advance();
        }

        if !starts_file(&diff.extended) {
            if !diff.extended.is_empty() {
                debug!("Skipping {} trailing lines", diff.extended.len());
            }
            return Ok(None);
        }

        resolve_header_names(&mut diff, start)?;
        Ok(Some(diff))
    }

    fn file_headers_and_hunks(&mut self, mut diff: FileDiff) -> Result<FileDiff, ParseError> {
        (diff.orig_name, diff.orig_time, diff.orig_tab) = self.file_header("--- ")?;
        (diff.new_name, diff.new_time, diff.new_tab) = self.file_header("+++ ")?;
        trace!("File headers: {} -> {}", diff.orig_name, diff.new_name);
        diff.hunks = Some(self.hunks()?);
        Ok(diff)
    }

    /// Parse `<prefix><name>[\t[<timestamp>]]`.
    ///
    /// The flag is set for a tab with nothing after it.
    fn file_header(
        &mut self,
        prefix: &str,
    ) -> Result<(String, Option<DateTime<FixedOffset>>, bool), ParseError> {
        let line = self.lines.line_number();
        let Some(header) = self
            .lines
            .peek()
            .map(strip_newline)
            .and_then(|l| l.strip_prefix(prefix))
        else {
            return Err(ParseError::MissingNewFileHeader { line });
        };
        self.lines.advance();

        let (name, timestamp, tab) = match header.split_once('\t') {
            Some((name, timestamp)) => (name, timestamp, timestamp.is_empty()),
            None => (header, "", false),
        };

        let name = if name.starts_with('"') {
            match read_quoted_filename(name) {
                Ok((value, "")) => value,
                _ => {
                    return Err(ParseError::InvalidFileName {
                        line,
                        name: name.to_string(),
                    });
                }
            }
        } else {
            name.to_string()
        };

        let time = if timestamp.trim().is_empty() {
            None
        } else {
            Some(
                parse_timestamp(timestamp).ok_or_else(|| ParseError::InvalidTimestamp {
                    line,
                    value: timestamp.to_string(),
                })?,
            )
        };

        Ok((name, time, tab))
    }

    fn hunks(&mut self) -> Result<Vec<Hunk>, ParseError> {
        let mut hunks = Vec::new();
        while self.lines.peek().is_some_and(|l| l.starts_with("@@ ")) {
            hunks.push(self.hunk()?);
        }
        Ok(hunks)
    }

    /// Parse one hunk, reading body lines until its line counts are met
    fn hunk(&mut self) -> Result<Hunk, ParseError> {
        let line = self.lines.line_number();
        let header = self.lines.advance().map(strip_newline).unwrap_or_default();
        let range = RangeHeader::parse(header).ok_or_else(|| ParseError::InvalidHunkHeader {
            line,
            header: header.to_string(),
        })?;
        trace!("Hunk header: {header}");

        let mut hunk = Hunk {
            orig_start_line: range.orig_start_line,
            orig_lines: range.orig_lines,
            new_start_line: range.new_start_line,
            new_lines: range.new_lines,
            section: range.section.to_string(),
            body: Vec::new(),
            orig_no_newline_at: 0,
        };

        let (mut orig_left, mut new_left) = (hunk.orig_lines, hunk.new_lines);
        let mut marker_at = None;

        while let Some(raw) = self.lines.peek() {
            if raw.starts_with('\\') && !hunk.body.is_empty() {
                self.lines.advance();
                marker_at = Some(hunk.body.len());
                continue;
            }

            if orig_left == 0 && new_left == 0 {
                break;
            }

            let (orig, new) = match raw.as_bytes().first() {
                Some(b' ' | b'\n') => (1, 1),
                Some(b'-') => (1, 0),
                Some(b'+') => (0, 1),
                _ => break,
            };
            if orig > orig_left || new > new_left {
                return Err(ParseError::UnexpectedHunkLine {
                    line: self.lines.line_number(),
                    content: strip_newline(raw).to_string(),
                });
            }
            orig_left -= orig;
            new_left -= new;

            // A marker followed by more lines ends the original side mid-body
            if let Some(at) = marker_at.take() {
                hunk.orig_no_newline_at = at;
            }
            hunk.body.extend_from_slice(raw.as_bytes());
            self.lines.advance();
        }

        if orig_left > 0 || new_left > 0 {
            return Err(ParseError::TruncatedHunk {
                line,
                orig: orig_left,
                new: new_left,
            });
        }

        if marker_at.is_some() && hunk.body.ends_with(b"\n") {
            hunk.body.pop();
        }

        Ok(hunk)
    }
}

/// Whether collected lines open a file diff (`diff --git`, `diff -ru`, ...)
fn starts_file(extended: &[String]) -> bool {
    extended.first().is_some_and(|line| line.starts_with("diff "))
}

/// Recover the file names of a diff that has no `---`/`+++` lines.
///
/// Names come from the `diff --git` arguments, then from `rename`/`copy`
/// lines, then from a `Binary files` line.
fn resolve_header_names(diff: &mut FileDiff, line: usize) -> Result<(), ParseError> {
    let mut orig = None;
    let mut new = None;
    let mut created = false;
    let mut deleted = false;

    for header in &diff.extended {
        let kind = ExtendedHeaderKind::classify(header);
        let value = kind.prefix().map_or("", |prefix| &header[prefix.len()..]);

        match kind {
            ExtendedHeaderKind::DiffGit => {
                if let Some((a, b)) = header
                    .strip_prefix("diff --git ")
                    .and_then(parse_diff_git_args)
                {
                    orig = Some(a);
                    new = Some(b);
                } else {
                    debug!("Ambiguous '{header}', looking for names in later headers");
                }
            }
            ExtendedHeaderKind::RenameFrom | ExtendedHeaderKind::CopyFrom if orig.is_none() => {
                orig = Some(format!("a/{}", header_name(value, line)?));
            }
            ExtendedHeaderKind::RenameTo | ExtendedHeaderKind::CopyTo if new.is_none() => {
                new = Some(format!("b/{}", header_name(value, line)?));
            }
            ExtendedHeaderKind::NewFileMode => created = true,
            ExtendedHeaderKind::DeletedFileMode => deleted = true,
            ExtendedHeaderKind::Unrecognized if orig.is_none() || new.is_none() => {
                if let Some((a, b)) = binary_files_names(header) {
                    orig.get_or_insert_with(|| a.to_string());
                    new.get_or_insert_with(|| b.to_string());
                }
            }
            _ => {}
        }
    }

    if created {
        orig = Some(DEV_NULL.to_string());
    }
    if deleted {
        new = Some(DEV_NULL.to_string());
    }

    match (orig, new) {
        (Some(orig), Some(new)) => {
            trace!("Headers-only diff: {orig} -> {new}");
            diff.orig_name = orig;
            diff.new_name = new;
            Ok(())
        }
        _ => Err(ParseError::MissingFileNames { line }),
    }
}

/// Decode a possibly quoted name from a `rename`/`copy` line
fn header_name(value: &str, line: usize) -> Result<String, ParseError> {
    if !value.starts_with('"') {
        return Ok(value.to_string());
    }
    match read_quoted_filename(value) {
        Ok((name, "")) => Ok(name),
        _ => Err(ParseError::InvalidFileName {
            line,
            name: value.to_string(),
        }),
    }
}

/// Names from `Binary files <a> and <b> differ`
fn binary_files_names(line: &str) -> Option<(&str, &str)> {
    line.strip_prefix("Binary files ")?
        .strip_suffix(" differ")?
        .split_once(" and ")
}

fn join_path(dir: &str, file: &str) -> String {
    match dir {
        "." => file.to_string(),
        _ => format!("{}/{file}", dir.trim_end_matches('/')),
    }
}

/// Parse a file header timestamp, with or without a zone offset (UTC)
fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f %z")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|time| time.and_utc().fixed_offset())
        })
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod proptests {
    use super::*;
    use crate::diff::print_hunks;
    use proptest::prelude::*;

    /// One body line with its side prefix
    fn arb_body_line() -> impl Strategy<Value = (u8, String)> {
        (prop_oneof![Just(b' '), Just(b'-'), Just(b'+')], "[ -~]{0,20}")
    }

    /// A hunk whose counts match its body, optionally without a final newline
    fn arb_hunk() -> impl Strategy<Value = Hunk> {
        (
            prop::collection::vec(arb_body_line(), 1..12),
            1..500u32,
            1..500u32,
            "[a-z(){ ]{0,12}",
            any::<bool>(),
        )
            .prop_map(|(lines, orig_start_line, new_start_line, section, no_newline)| {
                let mut body = Vec::new();
                let (mut orig_lines, mut new_lines) = (0, 0);
                for (side, content) in lines {
                    match side {
                        b'-' => orig_lines += 1,
                        b'+' => new_lines += 1,
                        _ => {
                            orig_lines += 1;
                            new_lines += 1;
                        }
                    }
                    body.push(side);
                    body.extend_from_slice(content.as_bytes());
                    body.push(b'\n');
                }
                if no_newline {
                    body.pop();
                }
                Hunk {
                    orig_start_line,
                    orig_lines,
                    new_start_line,
                    new_lines,
                    section: section.trim().to_string(),
                    body,
                    orig_no_newline_at: 0,
                }
            })
    }

    proptest! {
        /// Printed hunks parse back to the same hunks
        #[test]
        fn hunks_roundtrip(hunks in prop::collection::vec(arb_hunk(), 1..4)) {
            let printed = String::from_utf8(print_hunks(&hunks).unwrap()).unwrap();
            let parsed = parse_hunks(&printed).unwrap();
            prop_assert_eq!(parsed, hunks);
        }

        /// Printing what was parsed reproduces the input exactly
        #[test]
        fn printed_hunks_are_stable(hunks in prop::collection::vec(arb_hunk(), 1..4)) {
            let printed = print_hunks(&hunks).unwrap();
            let reparsed = parse_hunks(std::str::from_utf8(&printed).unwrap()).unwrap();
            prop_assert_eq!(print_hunks(&reparsed).unwrap(), printed);
        }
    }
}
