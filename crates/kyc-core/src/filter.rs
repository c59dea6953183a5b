//! Row filtering: free-text search, derived status, and role category.
//!
//! Each criterion accepts the sentinel `all`. The criteria are combined with
//! logical AND.

use std::str::FromStr;

use crate::{
  Error,
  row::{DerivedStatus, RoleCategory, VerificationRow},
};

// ─── Criteria ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
  #[default]
  All,
  Only(DerivedStatus),
}

impl StatusFilter {
  pub fn matches(&self, status: DerivedStatus) -> bool {
    match self {
      Self::All => true,
      Self::Only(wanted) => *wanted == status,
    }
  }
}

impl FromStr for StatusFilter {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.eq_ignore_ascii_case("all") {
      return Ok(Self::All);
    }
    DerivedStatus::from_str(&s.to_ascii_lowercase())
      .map(Self::Only)
      .map_err(|_| Error::UnknownStatus(s.to_owned()))
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
  #[default]
  All,
  Only(RoleCategory),
}

impl CategoryFilter {
  pub fn matches(&self, category: RoleCategory) -> bool {
    match self {
      Self::All => true,
      Self::Only(wanted) => *wanted == category,
    }
  }
}

impl FromStr for CategoryFilter {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.eq_ignore_ascii_case("all") {
      return Ok(Self::All);
    }
    RoleCategory::from_str(&s.to_ascii_lowercase())
      .map(Self::Only)
      .map_err(|_| Error::UnknownCategory(s.to_owned()))
  }
}

/// Parameters for [`filter_rows`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
  /// Case-insensitive substring of the user's name or email. Empty or absent
  /// matches every row.
  pub search:   Option<String>,
  pub status:   StatusFilter,
  pub category: CategoryFilter,
}

impl RowFilter {
  pub fn matches(&self, row: &VerificationRow) -> bool {
    self.matches_search(row)
      && self.status.matches(row.status)
      && self.category.matches(row.category())
  }

  fn matches_search(&self, row: &VerificationRow) -> bool {
    let Some(needle) = self.search.as_deref().filter(|s| !s.is_empty()) else {
      return true;
    };
    let needle = needle.to_lowercase();
    row.user.name.to_lowercase().contains(&needle)
      || row.user.email.to_lowercase().contains(&needle)
  }
}

/// The rows that satisfy every criterion in `filter`, in their original order.
pub fn filter_rows(
  rows: &[VerificationRow],
  filter: &RowFilter,
) -> Vec<VerificationRow> {
  rows.iter().filter(|row| filter.matches(row)).cloned().collect()
}
