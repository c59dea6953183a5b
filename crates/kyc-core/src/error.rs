//! Error types for `kyc-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("document {0} has no user attached")]
  MissingUser(String),

  #[error("unknown status filter: {0:?}")]
  UnknownStatus(String),

  #[error("unknown type filter: {0:?}")]
  UnknownCategory(String),

  #[error("no bearer token available")]
  Unauthenticated,

  #[error("backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
