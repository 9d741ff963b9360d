//! Quoted filenames in git diff headers.
//!
//! git wraps a path in double quotes whenever it contains a quote, a
//! backslash, a control character or (with `core.quotePath`) a non-ASCII
//! byte, and escapes those characters C-style:
//!
//! ```text
//! diff --git "a/say \"hi\".txt" "b/say \"hi\".txt"
//! --- "a/tab\there"
//! ```
//!
//! This module decodes such tokens, produces them, and splits the two
//! arguments of a `diff --git` line.
//!
//! # Examples
//!
//! ```
//! use git_unidiff::quote::{parse_diff_git_args, quote_filename, read_quoted_filename};
//!
//! let (name, rest) = read_quoted_filename(r#""a/say \"hi\"" b/x"#).unwrap();
//! assert_eq!(name, r#"a/say "hi""#);
//! assert_eq!(rest, " b/x");
//!
//! assert_eq!(quote_filename("a/tab\there"), r#""a/tab\there""#);
//!
//! let (from, to) = parse_diff_git_args("a/hello world b/hello world").unwrap();
//! assert_eq!(from, "a/hello world");
//! assert_eq!(to, "b/hello world");
//! ```

use error_set::error_set;
use std::borrow::Cow;

error_set! {
    /// Errors from decoding a quoted filename
    FilenameError := {
        /// Token is not a complete, well-formed quoted string
        #[display("Malformed quoted filename '{input}'")]
        MalformedToken { input: String },
    }
}

/// Path git uses for the missing side of a created or deleted file
pub const DEV_NULL: &str = "/dev/null";

/// Decode one quoted filename from the start of `text`.
///
/// Returns the decoded name and everything after the closing quote,
/// unmodified. The first quote not consumed by an escape closes the token,
/// so `"uh \\"oh\\""` decodes to `uh \` and leaves `oh\\""` behind.
///
/// Supported escapes are `\"`, `\\`, `\a`, `\b`, `\f`, `\n`, `\r`, `\t`,
/// `\v` and three-digit octal bytes (`\303\270`).
///
/// # Errors
///
/// Returns [`FilenameError::MalformedToken`] if:
/// - `text` does not start with `"`
/// - the closing quote is missing
/// - an escape is unsupported, truncated, or decodes to invalid UTF-8
pub fn read_quoted_filename(text: &str) -> Result<(String, &str), FilenameError> {
    let malformed = || FilenameError::MalformedToken {
        input: text.to_string(),
    };

    let body = text.strip_prefix('"').ok_or_else(malformed)?;
    let end = closing_quote(body).ok_or_else(malformed)?;

    let value = smashquote::unescape_bytes(&body.as_bytes()[..end]).map_err(|_| malformed())?;
    let value = String::from_utf8(value).map_err(|_| malformed())?;
    Ok((value, &body[end + 1..]))
}

/// Find the quote that closes `body`, checking every escape on the way
fn closing_quote(body: &str) -> Option<usize> {
    let mut bytes = body.bytes().enumerate();

    while let Some((i, byte)) = bytes.next() {
        match byte {
            b'"' => return Some(i),
            b'\\' => match bytes.next()? {
                (_, b'"' | b'\\' | b'a' | b'b' | b'f' | b'n' | b'r' | b't' | b'v') => {}
                (_, b'0'..=b'3') => {
                    for _ in 0..2 {
                        let (_, digit) = bytes.next()?;
                        if !matches!(digit, b'0'..=b'7') {
                            return None;
                        }
                    }
                }
                _ => return None,
            },
            _ => {}
        }
    }

    None
}

/// Quote a filename the way it appears in a quoted diff header.
///
/// `/dev/null` and names that already start with a quote are returned as
/// they are. Everything else is wrapped in double quotes with `"`, `\` and
/// control characters escaped; other characters, including non-ASCII, are
/// kept verbatim.
#[must_use]
pub fn quote_filename(name: &str) -> Cow<'_, str> {
    if name == DEV_NULL || name.starts_with('"') {
        return Cow::Borrowed(name);
    }

    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\x07' => quoted.push_str("\\a"),
            '\x08' => quoted.push_str("\\b"),
            '\x0c' => quoted.push_str("\\f"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\x0b' => quoted.push_str("\\v"),
            c if c.is_control() => {
                let mut utf8 = [0; 4];
                for byte in c.encode_utf8(&mut utf8).bytes() {
                    quoted.push_str(&format!("\\{byte:03o}"));
                }
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');

    Cow::Owned(quoted)
}

/// Split the arguments of a `diff --git` line into the two filenames.
///
/// `args` is the text after `diff --git `. Either argument may be quoted.
/// Unquoted names may contain spaces, which makes the line ambiguous; the
/// split points are tried left to right and the first one is taken where
/// the second half is a complete argument and either
/// - the second argument is quoted,
/// - the line holds exactly one space, or
/// - both names are the same path below their first component
///   (`a/hello world b/hello world`).
///
/// Returns `None` if no such split exists or either name would be empty.
#[must_use]
pub fn parse_diff_git_args(args: &str) -> Option<(String, String)> {
    if args.starts_with('"') {
        let (first, rest) = read_quoted_filename(args).ok()?;
        let second = rest.strip_prefix(' ').and_then(read_final_arg)?;
        return both_named(first, second);
    }

    for (split, _) in args.match_indices(' ') {
        let first = &args[..split];
        if first.contains('"') {
            // Every later candidate contains the same stray quote
            break;
        }
        if first.is_empty() {
            continue;
        }

        let rest = &args[split + 1..];
        let Some(second) = read_final_arg(rest) else {
            continue;
        };

        let single_space = !first.contains(' ') && !rest.contains(' ');
        if rest.starts_with('"') || single_space || same_path(first, &second) {
            return both_named(first.to_string(), second);
        }
    }

    None
}

/// Read an argument that must consume all of `text`
fn read_final_arg(text: &str) -> Option<String> {
    if text.starts_with('"') {
        match read_quoted_filename(text) {
            Ok((value, "")) => Some(value),
            _ => None,
        }
    } else if !text.is_empty() && !text.contains('"') {
        Some(text.to_string())
    } else {
        None
    }
}

/// Whether two names differ at most in their first path component
fn same_path(first: &str, second: &str) -> bool {
    if first == second {
        return true;
    }
    match (first.split_once('/'), second.split_once('/')) {
        (Some((_, first)), Some((_, second))) => first == second,
        _ => false,
    }
}

fn both_named(first: String, second: String) -> Option<(String, String)> {
    (!first.is_empty() && !second.is_empty()).then_some((first, second))
}
