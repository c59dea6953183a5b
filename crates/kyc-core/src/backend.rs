//! The `KycBackend` and `AuthProvider` seams.
//!
//! The review desk talks to the marketplace backend only through
//! [`KycBackend`] and reads credentials only through [`AuthProvider`], so both
//! can be swapped out in tests.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{record::RawDocumentRecord, row::VerificationRow};

// ─── Auth ────────────────────────────────────────────────────────────────────

/// Source of the bearer token attached to every backend request.
///
/// Consulted on each request; `None` means the caller is signed out and no
/// request should be made.
pub trait AuthProvider: Send + Sync {
  fn bearer_token(&self) -> Option<String>;
}

/// A fixed token (or the absence of one).
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl StaticToken {
  pub fn new(token: impl Into<String>) -> Self { Self(Some(token.into())) }

  pub fn none() -> Self { Self(None) }
}

impl AuthProvider for StaticToken {
  fn bearer_token(&self) -> Option<String> {
    self.0.clone().filter(|t| !t.trim().is_empty())
  }
}

// ─── Backend ─────────────────────────────────────────────────────────────────

/// JSON body of a verification decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
  pub approve: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes:   Option<String>,
}

/// Abstraction over the marketplace's KYC endpoints.
///
/// All methods return `Send` futures so implementations can be driven from a
/// multi-threaded tokio runtime.
pub trait KycBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// `GET /kyc/`: every document record visible to the reviewer.
  fn list_documents<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Vec<RawDocumentRecord>, Self::Error>> + Send + 'a;

  /// `PUT /kyc/{user_id}`: record a decision and return the backend's
  /// updated row for that user.
  fn submit_decision<'a>(
    &'a self,
    token: &'a str,
    user_id: &'a str,
    decision: &'a Decision,
  ) -> impl Future<Output = Result<VerificationRow, Self::Error>> + Send + 'a;
}
