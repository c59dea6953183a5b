//! Verification rows: one per user, derived from that user's documents.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::record::{DocumentStatus, KycDocumentRecord, UserSummary};

// ─── Derived status ──────────────────────────────────────────────────────────

/// The status shown for a user, read off their most recent document.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DerivedStatus {
  #[default]
  Pending,
  Verified,
  Rejected,
}

impl From<DocumentStatus> for DerivedStatus {
  fn from(status: DocumentStatus) -> Self {
    match status {
      DocumentStatus::Uploaded => Self::Pending,
      DocumentStatus::Verified => Self::Verified,
      DocumentStatus::Rejected => Self::Rejected,
    }
  }
}

// ─── Role category ───────────────────────────────────────────────────────────

/// Coarse grouping of marketplace roles used by the type filter.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoleCategory {
  Provider,
  Customer,
}

impl UserSummary {
  /// `provider` users are providers; every other role counts as a customer.
  pub fn category(&self) -> RoleCategory {
    if self.role.trim().eq_ignore_ascii_case("provider") {
      RoleCategory::Provider
    } else {
      RoleCategory::Customer
    }
  }
}

// ─── Row ─────────────────────────────────────────────────────────────────────

/// The per-user read model. Never stored; rebuilt on every fetch and replaced
/// wholesale when a decision comes back from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRow {
  /// The user id; rows are keyed and spliced by it.
  pub id:                       String,
  pub user:                     UserSummary,
  /// All of the user's documents in arrival order.
  #[serde(default)]
  pub documents:                Vec<KycDocumentRecord>,
  #[serde(default)]
  pub latest_document:          Option<KycDocumentRecord>,
  #[serde(default)]
  pub latest_reviewed_document: Option<KycDocumentRecord>,
  #[serde(default)]
  pub status:                   DerivedStatus,
}

impl VerificationRow {
  pub fn category(&self) -> RoleCategory { self.user.category() }
}
