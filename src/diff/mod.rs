//! The diff data model and its unified diff printer.

pub mod file;
pub mod full;
pub mod hunk;

pub use file::{FileDiff, ONLY_IN_PREFIX, TIMESTAMP_FORMAT, print_file_diff};
pub use full::{Diff, print_multi_file_diff, write_multi_file_diff};
pub use hunk::{Hunk, NO_NEWLINE_MARKER, print_hunks};

/// Options for printing file diffs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrintOptions {
    /// Re-quote file names in `diff --git`, `rename from`/`rename to` and
    /// `---`/`+++` lines instead of printing headers verbatim
    pub quote_names: bool,
}

impl PrintOptions {
    /// Set whether file names are re-quoted
    #[must_use]
    pub fn quote_names(mut self, quote_names: bool) -> Self {
        self.quote_names = quote_names;
        self
    }
}
