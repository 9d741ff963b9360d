use super::PrintOptions;
use super::hunk::Hunk;
use crate::header::{self, ExtendedHeaderKind};
use crate::quote::quote_filename;
use chrono::{DateTime, FixedOffset};
use std::io::{self, Write};

/// Layout of the timestamp after a `---`/`+++` file name
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f %z";

/// Start of the message printed for a file that exists on one side only
pub const ONLY_IN_PREFIX: &str = "Only in ";

/// A complete diff for a single file.
///
/// Holds the extended headers, the `---`/`+++` file headers and the hunks.
/// An empty `new_name` marks a file that exists on one side only, printed
/// as `Only in <dir>: <file>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDiff {
    /// Name on the `---` line, `/dev/null` for created files
    pub orig_name: String,
    pub orig_time: Option<DateTime<FixedOffset>>,
    /// The `---` name was followed by a bare tab, as git writes for names
    /// containing a space
    pub orig_tab: bool,
    /// Name on the `+++` line, `/dev/null` for deleted files
    pub new_name: String,
    pub new_time: Option<DateTime<FixedOffset>>,
    pub new_tab: bool,
    /// Raw extended header lines without their newline, in input order
    pub extended: Vec<String>,
    /// `None` for headers-only diffs (mode changes, pure renames, binary
    /// files), which have no `---`/`+++` lines
    pub hunks: Option<Vec<Hunk>>,
}

impl FileDiff {
    /// Put the extended headers into canonical order
    pub fn sort_extended(&mut self) {
        header::sort_extended_headers(&mut self.extended);
    }

    /// Write this file diff in unified diff format.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W, options: &PrintOptions) -> io::Result<()> {
        for line in &self.extended {
            if options.quote_names {
                self.write_quoted_extended(w, line)?;
            } else {
                writeln!(w, "{line}")?;
            }
        }

        if self.new_name.is_empty() {
            let dir = dir_name(&self.orig_name);
            let base = base_name(&self.orig_name);
            writeln!(w, "{ONLY_IN_PREFIX}{dir}: {base}")?;
            return Ok(());
        }

        let Some(hunks) = &self.hunks else {
            return Ok(());
        };

        let orig = FileHeader {
            prefix: "--- ",
            name: &self.orig_name,
            time: self.orig_time.as_ref(),
            tab: self.orig_tab,
        };
        let new = FileHeader {
            prefix: "+++ ",
            name: &self.new_name,
            time: self.new_time.as_ref(),
            tab: self.new_tab,
        };
        orig.write_to(w, options)?;
        new.write_to(w, options)?;

        for hunk in hunks {
            hunk.write_to(w)?;
        }

        Ok(())
    }

    /// Write an extended header with its file names re-quoted
    fn write_quoted_extended<W: Write + ?Sized>(&self, w: &mut W, line: &str) -> io::Result<()> {
        match ExtendedHeaderKind::classify(line) {
            ExtendedHeaderKind::DiffGit => writeln!(
                w,
                "diff --git {} {}",
                quote_filename(&self.orig_name),
                quote_filename(&self.new_name)
            ),
            kind @ (ExtendedHeaderKind::RenameFrom | ExtendedHeaderKind::RenameTo) => {
                let prefix = kind.prefix().unwrap_or_default();
                let name = &line[prefix.len()..];
                writeln!(w, "{prefix}{}", quote_filename(name))
            }
            _ => writeln!(w, "{line}"),
        }
    }
}

/// One `---` or `+++` line
struct FileHeader<'a> {
    prefix: &'static str,
    name: &'a str,
    time: Option<&'a DateTime<FixedOffset>>,
    tab: bool,
}

impl FileHeader<'_> {
    fn write_to<W: Write + ?Sized>(&self, w: &mut W, options: &PrintOptions) -> io::Result<()> {
        if options.quote_names {
            write!(w, "{}{}", self.prefix, quote_filename(self.name))?;
        } else {
            write!(w, "{}{}", self.prefix, self.name)?;
        }
        match self.time {
            Some(time) => write!(w, "\t{}", time.format(TIMESTAMP_FORMAT))?,
            None if self.tab => write!(w, "\t")?,
            None => {}
        }
        writeln!(w)
    }
}

/// Directory part of `path`, cleaned; `.` if there is none
fn dir_name(path: &str) -> String {
    let dir = path.rfind('/').map_or("", |i| &path[..=i]);
    clean_path(dir)
}

/// Last element of `path` after trailing slashes are removed
fn base_name(path: &str) -> &str {
    if path.is_empty() {
        return ".";
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Lexically simplify a slash-separated path: drop empty and `.`
/// elements and resolve `..` against the element before it.
fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            part => parts.push(part),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Render one file diff in unified diff format.
///
/// # Errors
///
/// Returns any error from writing the output buffer.
pub fn print_file_diff(diff: &FileDiff, options: &PrintOptions) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    diff.write_to(&mut buf, options)?;
    Ok(buf)
}
