use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{map_res, opt},
    sequence::preceded,
};
use std::io::{self, Write};

/// Line printed after a line that lacks its trailing newline
pub const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// A single hunk from a unified diff
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hunk {
    pub orig_start_line: u32,
    pub orig_lines: u32,
    pub new_start_line: u32,
    pub new_lines: u32,
    /// Text after the closing `@@`, usually the enclosing function
    pub section: String,
    /// Raw context, added and removed lines, each with its `\n` except
    /// possibly the last
    pub body: Vec<u8>,
    /// Offset into `body` where the original file ended without a newline
    /// while lines of the new file follow. 0 when there is no such point.
    pub orig_no_newline_at: usize,
}

impl Hunk {
    /// Write the range header and body in unified diff format.
    ///
    /// The no-newline marker is inserted at `orig_no_newline_at` and again
    /// after the body when it does not end in a newline. At most one marker
    /// is printed at the end of the body.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        write!(
            w,
            "@@ -{},{} +{},{} @@",
            self.orig_start_line, self.orig_lines, self.new_start_line, self.new_lines
        )?;
        if !self.section.is_empty() {
            write!(w, " {}", self.section)?;
        }
        writeln!(w)?;

        // The marker follows a complete line; a split that is not on a line
        // boundary is left to the end-of-body marker.
        let (head, tail) = self
            .body
            .split_at(self.orig_no_newline_at.min(self.body.len()));
        w.write_all(head)?;
        if head.ends_with(b"\n") {
            writeln!(w, "{NO_NEWLINE_MARKER}")?;
        }
        w.write_all(tail)?;

        if !self.body.ends_with(b"\n") {
            writeln!(w)?;
            writeln!(w, "{NO_NEWLINE_MARKER}")?;
        }

        Ok(())
    }
}

/// Render hunks back to back in unified diff format.
///
/// # Errors
///
/// Returns any error from writing the output buffer.
pub fn print_hunks(hunks: &[Hunk]) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    for hunk in hunks {
        hunk.write_to(&mut buf)?;
    }
    Ok(buf)
}

/// Parsed `@@ -a,b +c,d @@ section` line
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RangeHeader<'a> {
    pub orig_start_line: u32,
    pub orig_lines: u32,
    pub new_start_line: u32,
    pub new_lines: u32,
    pub section: &'a str,
}

impl<'a> RangeHeader<'a> {
    /// Parse a hunk range line (without its newline).
    ///
    /// A missing count means one line, as in `@@ -3 +3 @@`.
    pub fn parse(header: &'a str) -> Option<Self> {
        let (section, ((orig_start_line, orig_lines), (new_start_line, new_lines))) =
            range_header(header).ok()?;

        let section = match section {
            "" => "",
            s => s.strip_prefix(' ')?,
        };

        Some(RangeHeader {
            orig_start_line,
            orig_lines,
            new_start_line,
            new_lines,
            section,
        })
    }
}

fn range_header(input: &str) -> IResult<&str, ((u32, u32), (u32, u32))> {
    (tag("@@ -"), range, tag(" +"), range, tag(" @@"))
        .map(|(_, orig, _, new, _)| (orig, new))
        .parse(input)
}

/// `start[,count]`
fn range(input: &str) -> IResult<&str, (u32, u32)> {
    (number, opt(preceded(char(','), number)))
        .map(|(start, count)| (start, count.unwrap_or(1)))
        .parse(input)
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |digits: &str| digits.parse::<u32>()).parse(input)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn render(hunk: &Hunk) -> String {
        let mut out = Vec::new();
        hunk.write_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn render_plain_hunk() {
        let hunk = Hunk {
            orig_start_line: 1,
            orig_lines: 3,
            new_start_line: 1,
            new_lines: 4,
            section: String::new(),
            body: b" a\n-b\n+B\n+C\n c\n".to_vec(),
            orig_no_newline_at: 0,
        };
        assert_eq!(render(&hunk), "@@ -1,3 +1,4 @@\n a\n-b\n+B\n+C\n c\n");
    }

    #[test]
    fn render_section() {
        let hunk = Hunk {
            orig_start_line: 10,
            orig_lines: 1,
            new_start_line: 10,
            new_lines: 1,
            section: "fn main() {".to_string(),
            body: b"-old\n+new\n".to_vec(),
            orig_no_newline_at: 0,
        };
        assert_eq!(
            render(&hunk),
            "@@ -10,1 +10,1 @@ fn main() {\n-old\n+new\n"
        );
    }

    #[test]
    fn render_missing_final_newline() {
        let hunk = Hunk {
            orig_start_line: 1,
            orig_lines: 1,
            new_start_line: 1,
            new_lines: 1,
            body: b"-old\n+new".to_vec(),
            ..Hunk::default()
        };
        let rendered = render(&hunk);
        assert_eq!(
            rendered,
            "@@ -1,1 +1,1 @@\n-old\n+new\n\\ No newline at end of file\n"
        );
        assert!(rendered.ends_with(&format!("\n{NO_NEWLINE_MARKER}\n")));
    }

    #[test]
    fn render_orig_no_newline_mid_body() {
        let hunk = Hunk {
            orig_start_line: 3,
            orig_lines: 1,
            new_start_line: 3,
            new_lines: 2,
            body: b"-no newline\n+no newline\n+new line\n".to_vec(),
            orig_no_newline_at: 12,
            ..Hunk::default()
        };
        assert_eq!(
            render(&hunk),
            "@@ -3,1 +3,2 @@\n-no newline\n\\ No newline at end of file\n+no newline\n+new line\n"
        );
    }

    #[test]
    fn render_both_sides_without_newline() {
        let hunk = Hunk {
            orig_start_line: 1,
            orig_lines: 1,
            new_start_line: 1,
            new_lines: 1,
            body: b"-a\n+b".to_vec(),
            orig_no_newline_at: 3,
            ..Hunk::default()
        };
        let rendered = render(&hunk);
        assert_eq!(
            rendered,
            "@@ -1,1 +1,1 @@\n-a\n\\ No newline at end of file\n+b\n\\ No newline at end of file\n"
        );
        assert_eq!(rendered.matches(NO_NEWLINE_MARKER).count(), 2);
    }

    #[test]
    fn render_split_at_end_without_newline_prints_one_marker() {
        let hunk = Hunk {
            orig_start_line: 1,
            orig_lines: 1,
            new_start_line: 1,
            new_lines: 0,
            body: b"-a".to_vec(),
            orig_no_newline_at: 2,
            ..Hunk::default()
        };
        assert_eq!(
            render(&hunk),
            "@@ -1,1 +1,0 @@\n-a\n\\ No newline at end of file\n"
        );
    }

    #[test]
    fn render_split_past_end_with_newline() {
        let hunk = Hunk {
            orig_start_line: 1,
            orig_lines: 1,
            new_start_line: 1,
            new_lines: 0,
            body: b"-a\n".to_vec(),
            orig_no_newline_at: 40,
            ..Hunk::default()
        };
        assert_eq!(
            render(&hunk),
            "@@ -1,1 +1,0 @@\n-a\n\\ No newline at end of file\n"
        );
    }

    #[test]
    fn render_split_inside_line_is_not_marked() {
        let hunk = Hunk {
            orig_start_line: 1,
            orig_lines: 1,
            new_start_line: 1,
            new_lines: 1,
            body: b"-a\n+b\n".to_vec(),
            orig_no_newline_at: 1,
            ..Hunk::default()
        };
        let rendered = render(&hunk);
        assert_eq!(rendered, "@@ -1,1 +1,1 @@\n-a\n+b\n");
    }

    #[test]
    fn print_hunks_concatenates() {
        let first = Hunk {
            orig_start_line: 1,
            orig_lines: 1,
            new_start_line: 1,
            new_lines: 1,
            body: b"-a\n+b\n".to_vec(),
            ..Hunk::default()
        };
        let second = Hunk {
            orig_start_line: 9,
            orig_lines: 1,
            new_start_line: 9,
            new_lines: 0,
            body: b"-z\n".to_vec(),
            ..Hunk::default()
        };
        let out = print_hunks(&[first, second]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "@@ -1,1 +1,1 @@\n-a\n+b\n@@ -9,1 +9,0 @@\n-z\n"
        );
    }

    #[test]
    fn print_no_hunks() {
        assert!(print_hunks(&[]).unwrap().is_empty());
    }

    #[test]
    fn parse_full_range_header() {
        assert_eq!(
            RangeHeader::parse("@@ -38,0 +39,5 @@ line 38"),
            Some(RangeHeader {
                orig_start_line: 38,
                orig_lines: 0,
                new_start_line: 39,
                new_lines: 5,
                section: "line 38",
            })
        );
    }

    #[test]
    fn parse_range_header_default_counts() {
        assert_eq!(
            RangeHeader::parse("@@ -15 +14,0 @@"),
            Some(RangeHeader {
                orig_start_line: 15,
                orig_lines: 1,
                new_start_line: 14,
                new_lines: 0,
                section: "",
            })
        );
    }

    #[test]
    fn parse_invalid_range_headers() {
        for header in [
            "@@ -1,2 +3,4",
            "@@ -a,2 +3,4 @@",
            "@@ 1,2 3,4 @@",
            "@@ -1,2 +3,4 @@x",
            "@@@ -1,2 -1,2 +1,3 @@@",
            "@@ -99999999999,1 +1,1 @@",
        ] {
            assert_eq!(RangeHeader::parse(header), None, "{header}");
        }
    }
}
