//! Parse and print git-style unified diffs.
//!
//! Reads the unified diff format as extended by git (extended headers,
//! renames, mode changes, quoted file names, `\ No newline at end of file`
//! markers) and writes it back byte for byte.
//!
//! ```
//! use git_unidiff::{PrintOptions, parse_multi_file_diff, print_multi_file_diff};
//!
//! let text = "diff --git a/x b/x\nold mode 100644\nnew mode 100755\n";
//! let diffs = parse_multi_file_diff(text).unwrap();
//! let printed = print_multi_file_diff(&diffs, &PrintOptions::default()).unwrap();
//! assert_eq!(printed, text.as_bytes());
//! ```

use error_set::error_set;

pub mod diff;
pub mod header;
pub mod parse;
pub mod quote;

pub use diff::{
    Diff, FileDiff, Hunk, NO_NEWLINE_MARKER, PrintOptions, print_file_diff, print_hunks,
    print_multi_file_diff,
};
pub use header::{
    ExtendedHeaderKind, compare_extended_headers, extended_header_less, sort_extended_headers,
};
pub use parse::{ParseError, parse_file_diff, parse_hunks, parse_multi_file_diff};
pub use quote::{FilenameError, parse_diff_git_args, quote_filename, read_quoted_filename};

error_set! {
    /// Top-level error for git-unidiff operations
    UnidiffError := {
        ParseError(ParseError),
        #[display("Failed to write diff: {message}")]
        WriteFailed { message: String },
    }
}

/// Options for [`normalize`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub print: PrintOptions,
    /// Put extended headers into canonical order before printing
    pub sort_headers: bool,
}

/// Parse a multi-file diff and print it back in canonical form.
///
/// # Examples
/// ```
/// # use git_unidiff::{NormalizeOptions, normalize};
/// let text = "diff --git a/x b/x\nnew mode 100755\nold mode 100644\n";
/// let options = NormalizeOptions { sort_headers: true, ..Default::default() };
/// let out = normalize(text, &options).unwrap();
/// assert_eq!(out, b"diff --git a/x b/x\nold mode 100644\nnew mode 100755\n");
/// ```
///
/// # Errors
///
/// Returns [`UnidiffError::ParseError`] if `input` is not a valid diff.
pub fn normalize(input: &str, options: &NormalizeOptions) -> Result<Vec<u8>, UnidiffError> {
    let mut diff = Diff::parse(input)?;
    if options.sort_headers {
        diff.sort_extended();
    }

    let mut out = Vec::with_capacity(input.len());
    diff.write_to(&mut out, &options.print)
        .map_err(|e| UnidiffError::WriteFailed {
            message: e.to_string(),
        })?;
    Ok(out)
}
