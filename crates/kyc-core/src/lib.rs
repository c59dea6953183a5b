//! Core types and review logic for the KYC review desk.
//!
//! This crate is free of HTTP dependencies. It turns the flat document
//! listing the marketplace backend serves into one [`VerificationRow`] per
//! user, filters those rows, and drives approve/reject decisions through the
//! [`KycBackend`] seam. Transport lives in `kyc-cli`.

pub mod aggregate;
pub mod backend;
pub mod desk;
pub mod error;
pub mod filter;
pub mod record;
pub mod row;

pub use aggregate::{StatusCounts, aggregate, splice_row, tally};
pub use backend::{AuthProvider, Decision, KycBackend, StaticToken};
pub use desk::{DecisionState, FetchOutcome, ReviewDesk};
pub use error::{Error, Result};
pub use filter::{CategoryFilter, RowFilter, StatusFilter, filter_rows};
pub use record::{DocumentStatus, KycDocumentRecord, RawDocumentRecord, UserSummary};
pub use row::{DerivedStatus, RoleCategory, VerificationRow};
