//! Reconciliation outcome statuses

use dirbatch_status::StatusKind;

/// Outcome of matching one key tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    /// Present in the directory tree and in the table
    Matched,
    /// Present in the directory tree only
    DirectoryOnly,
    /// Present in the table only
    TableOnly,
}

impl StatusKind for MatchStatus {
    const KIND: &'static str = "table_match";

    fn values() -> &'static [Self] {
        &[Self::Matched, Self::DirectoryOnly, Self::TableOnly]
    }

    fn rank(self) -> u32 {
        match self {
            Self::Matched => 0,
            Self::DirectoryOnly => 1,
            Self::TableOnly => 2,
        }
    }

    fn display(self) -> &'static str {
        match self {
            Self::Matched => "Matched directory and table row",
            Self::DirectoryOnly => "Not matched to table row",
            Self::TableOnly => "Not matched to directory",
        }
    }
}
