//! Extended header lines and their canonical order.
//!
//! git prints the headers of a file diff in a fixed order: the `diff --git`
//! line, then `old mode`/`new mode`, then everything else. Sorting with
//! [`compare_extended_headers`] restores that order for any permutation.

use std::cmp::Ordering;

/// Kind of an extended header line, classified by prefix.
///
/// Declaration order is the canonical emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExtendedHeaderKind {
    DiffGit,
    OldMode,
    NewMode,
    DeletedFileMode,
    NewFileMode,
    SimilarityIndex,
    DissimilarityIndex,
    RenameFrom,
    RenameTo,
    CopyFrom,
    CopyTo,
    Index,
    /// Any line not produced by git as an extended header
    Unrecognized,
}

const PREFIXES: &[(&str, ExtendedHeaderKind)] = &[
    ("diff --git", ExtendedHeaderKind::DiffGit),
    ("old mode", ExtendedHeaderKind::OldMode),
    ("new mode", ExtendedHeaderKind::NewMode),
    ("deleted file mode", ExtendedHeaderKind::DeletedFileMode),
    ("new file mode", ExtendedHeaderKind::NewFileMode),
    ("similarity index", ExtendedHeaderKind::SimilarityIndex),
    ("dissimilarity index", ExtendedHeaderKind::DissimilarityIndex),
    ("rename from ", ExtendedHeaderKind::RenameFrom),
    ("rename to ", ExtendedHeaderKind::RenameTo),
    ("copy from ", ExtendedHeaderKind::CopyFrom),
    ("copy to ", ExtendedHeaderKind::CopyTo),
    ("index ", ExtendedHeaderKind::Index),
];

impl ExtendedHeaderKind {
    /// Classify a raw header line
    #[must_use]
    pub fn classify(line: &str) -> Self {
        PREFIXES
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix))
            .map_or(Self::Unrecognized, |&(_, kind)| kind)
    }

    /// The prefix lines of this kind start with, if recognized
    #[must_use]
    pub fn prefix(self) -> Option<&'static str> {
        PREFIXES
            .iter()
            .find(|&&(_, kind)| kind == self)
            .map(|&(prefix, _)| prefix)
    }
}

/// Total order over extended header lines.
///
/// Lines order by kind; two unrecognized lines compare lexically, two
/// recognized lines of the same kind compare equal.
///
/// Both lines are classified on every call. To order a whole slice use
/// [`sort_extended_headers`], which classifies each line once.
#[must_use]
pub fn compare_extended_headers(a: &str, b: &str) -> Ordering {
    let (kind_a, kind_b) = (
        ExtendedHeaderKind::classify(a),
        ExtendedHeaderKind::classify(b),
    );
    kind_a.cmp(&kind_b).then_with(|| match kind_a {
        ExtendedHeaderKind::Unrecognized => a.cmp(b),
        _ => Ordering::Equal,
    })
}

/// Strict "sorts before" predicate for [`compare_extended_headers`]
#[must_use]
pub fn extended_header_less(a: &str, b: &str) -> bool {
    compare_extended_headers(a, b) == Ordering::Less
}

/// Sort header lines into canonical order.
///
/// The sort is stable and classifies each line once.
pub fn sort_extended_headers(headers: &mut [String]) {
    headers.sort_by_cached_key(|line| match ExtendedHeaderKind::classify(line) {
        ExtendedHeaderKind::Unrecognized => (ExtendedHeaderKind::Unrecognized, Some(line.clone())),
        kind => (kind, None),
    });
}
