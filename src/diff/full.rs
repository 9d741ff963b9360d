use super::PrintOptions;
use super::file::FileDiff;
use crate::parse::{ParseError, parse_multi_file_diff};
use std::io::{self, Write};

/// A complete diff containing changes for multiple files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub files: Vec<FileDiff>,
}

impl Diff {
    /// Parse a complete multi-file diff
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if any file diff is malformed.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Ok(Diff {
            files: parse_multi_file_diff(text)?,
        })
    }

    /// Put the extended headers of every file into canonical order
    pub fn sort_extended(&mut self) {
        self.files.iter_mut().for_each(FileDiff::sort_extended);
    }

    /// Write every file diff in order, with nothing in between
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W, options: &PrintOptions) -> io::Result<()> {
        write_multi_file_diff(w, &self.files, options)
    }
}

impl From<Vec<FileDiff>> for Diff {
    fn from(files: Vec<FileDiff>) -> Self {
        Diff { files }
    }
}

/// Write file diffs back to back in unified diff format.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_multi_file_diff<W: Write + ?Sized>(
    w: &mut W,
    diffs: &[FileDiff],
    options: &PrintOptions,
) -> io::Result<()> {
    for diff in diffs {
        diff.write_to(w, options)?;
    }
    Ok(())
}

/// Render file diffs back to back in unified diff format.
///
/// # Errors
///
/// Returns any error from writing the output buffer.
pub fn print_multi_file_diff(diffs: &[FileDiff], options: &PrintOptions) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_multi_file_diff(&mut buf, diffs, options)?;
    Ok(buf)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diff::Hunk;
    use crate::diff::file::print_file_diff;
    use similar_asserts::assert_eq;

    fn file(name: &str, body: &[u8]) -> FileDiff {
        FileDiff {
            orig_name: format!("a/{name}"),
            new_name: format!("b/{name}"),
            extended: vec![format!("diff --git a/{name} b/{name}")],
            hunks: Some(vec![Hunk {
                orig_start_line: 1,
                orig_lines: 1,
                new_start_line: 1,
                new_lines: 1,
                body: body.to_vec(),
                ..Hunk::default()
            }]),
            ..FileDiff::default()
        }
    }

    #[test]
    fn parse_empty_diff() {
        let diff = Diff::parse("").unwrap();
        assert_eq!(diff.files.len(), 0);
    }

    #[test]
    fn print_is_concatenation() {
        let files = vec![file("one", b"-1\n+one\n"), file("two", b"-2\n+two")];
        let options = PrintOptions::default();

        let mut expected = Vec::new();
        for f in &files {
            expected.extend(print_file_diff(f, &options).unwrap());
        }

        assert_eq!(print_multi_file_diff(&files, &options).unwrap(), expected);
    }

    #[test]
    fn write_to_matches_print() {
        let diff = Diff::from(vec![file("one", b"-1\n+one\n"), file("two", b"-2\n+two\n")]);
        let mut out = Vec::new();
        diff.write_to(&mut out, &PrintOptions::default()).unwrap();

        insta::assert_snapshot!(String::from_utf8(out).unwrap(), @r"
diff --git a/one b/one
--- a/one
+++ b/one
@@ -1,1 +1,1 @@
-1
+one
diff --git a/two b/two
--- a/two
+++ b/two
@@ -1,1 +1,1 @@
-2
+two
");
    }

    #[test]
    fn parse_then_print_roundtrips() {
        let text = "diff --git a/one b/one\nindex 1..2 100644\n--- a/one\n+++ b/one\n@@ -1,2 +1,2 @@\n-1\n+one\n keep\ndiff --git a/two b/two\nold mode 100644\nnew mode 100755\n";
        let diff = Diff::parse(text).unwrap();
        assert_eq!(diff.files.len(), 2);

        let mut out = Vec::new();
        diff.write_to(&mut out, &PrintOptions::default()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), text);
    }

    #[test]
    fn sort_extended_applies_to_every_file() {
        let mut diff = Diff::from(vec![
            FileDiff {
                extended: vec!["new mode 1".to_string(), "diff --git a/x b/x".to_string()],
                ..FileDiff::default()
            },
            FileDiff {
                extended: vec!["old mode 1".to_string(), "diff --git a/y b/y".to_string()],
                ..FileDiff::default()
            },
        ]);
        diff.sort_extended();
        assert_eq!(diff.files[0].extended[0], "diff --git a/x b/x");
        assert_eq!(diff.files[1].extended[0], "diff --git a/y b/y");
    }
}
