//! Review desk state: the single row list owned by one review session.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  aggregate::{StatusCounts, aggregate, splice_row, tally},
  backend::{AuthProvider, Decision, KycBackend},
  filter::{RowFilter, filter_rows},
  record::validate_records,
  row::VerificationRow,
};

/// Progress of the most recent decision for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DecisionState {
  #[default]
  Idle,
  Pending,
  Committed,
  Failed(String),
}

/// What a call to [`ReviewDesk::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
  /// No token was available, so nothing was requested.
  Skipped,
  Loaded {
    rows:     usize,
    /// Records dropped because they carried no user.
    rejected: usize,
  },
}

/// Owns the aggregated rows for a session and is their only writer.
pub struct ReviewDesk<B, A> {
  backend:   B,
  auth:      A,
  rows:      Vec<VerificationRow>,
  loading:   bool,
  error:     Option<String>,
  decisions: HashMap<String, DecisionState>,
}

impl<B, A> ReviewDesk<B, A>
where
  B: KycBackend,
  A: AuthProvider,
{
  pub fn new(backend: B, auth: A) -> Self {
    Self {
      backend,
      auth,
      rows: Vec::new(),
      loading: false,
      error: None,
      decisions: HashMap::new(),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn rows(&self) -> &[VerificationRow] { &self.rows }

  pub fn is_loading(&self) -> bool { self.loading }

  /// Display string of the last failed fetch, cleared by the next success.
  pub fn error(&self) -> Option<&str> { self.error.as_deref() }

  pub fn row(&self, user_id: &str) -> Option<&VerificationRow> {
    self.rows.iter().find(|r| r.id == user_id)
  }

  pub fn visible(&self, filter: &RowFilter) -> Vec<VerificationRow> {
    filter_rows(&self.rows, filter)
  }

  pub fn counts(&self) -> StatusCounts { tally(&self.rows) }

  pub fn decision_state(&self, user_id: &str) -> DecisionState {
    self.decisions.get(user_id).cloned().unwrap_or_default()
  }

  // ── Fetch ─────────────────────────────────────────────────────────────────

  /// Re-fetch the document listing and rebuild every row from scratch.
  ///
  /// Without a token nothing is requested and the rows are left as they are.
  /// On failure the error string is kept for display and the previous rows
  /// stay in place.
  ///
  /// [`is_loading`](Self::is_loading) reads true while the request is in
  /// flight. Dropping the returned future mid-request (a caller-side timeout,
  /// say) leaves it set, the same as a request that never answers; the next
  /// refresh that completes clears it.
  pub async fn refresh(&mut self) -> Result<FetchOutcome> {
    let Some(token) = self.auth.bearer_token() else {
      debug!("no bearer token; skipping kyc fetch");
      return Ok(FetchOutcome::Skipped);
    };

    self.loading = true;
    let result = self.backend.list_documents(&token).await;
    self.loading = false;

    match result {
      Ok(raw) => {
        let (records, rejected) = validate_records(raw);
        self.rows = aggregate(records);
        self.error = None;
        info!(
          rows = self.rows.len(),
          rejected = rejected.len(),
          "loaded kyc documents"
        );
        Ok(FetchOutcome::Loaded {
          rows:     self.rows.len(),
          rejected: rejected.len(),
        })
      }
      Err(e) => {
        let err = Error::Backend(Box::new(e));
        warn!(error = %err, "kyc fetch failed");
        self.error = Some(err.to_string());
        Err(err)
      }
    }
  }

  // ── Decisions ─────────────────────────────────────────────────────────────

  /// Approve or reject `user_id` and splice the backend's updated row into
  /// the list in place.
  ///
  /// On failure the rows are untouched and the error is returned for the
  /// caller to show. Nothing is retried.
  pub async fn decide(
    &mut self,
    user_id: &str,
    approve: bool,
    notes: Option<String>,
  ) -> Result<VerificationRow> {
    let token = self.auth.bearer_token().ok_or(Error::Unauthenticated)?;
    let decision = Decision { approve, notes };

    self
      .decisions
      .insert(user_id.to_owned(), DecisionState::Pending);

    match self
      .backend
      .submit_decision(&token, user_id, &decision)
      .await
    {
      Ok(row) => {
        splice_row(&mut self.rows, row.clone());
        info!(user_id, approve, status = %row.status, "kyc decision recorded");
        self
          .decisions
          .insert(user_id.to_owned(), DecisionState::Committed);
        Ok(row)
      }
      Err(e) => {
        let err = Error::Backend(Box::new(e));
        warn!(user_id, error = %err, "kyc decision failed");
        self
          .decisions
          .insert(user_id.to_owned(), DecisionState::Failed(err.to_string()));
        Err(err)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{
      Mutex,
      atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
  };

  use super::*;
  use crate::{
    StaticToken,
    record::{DocumentStatus, KycDocumentRecord, RawDocumentRecord, UserSummary},
    row::DerivedStatus,
  };

  #[derive(Debug, thiserror::Error)]
  #[error("backend unavailable")]
  struct Unavailable;

  /// In-memory backend that serves a fixed listing and echoes decisions.
  #[derive(Default)]
  struct MockBackend {
    listing:       Mutex<Vec<RawDocumentRecord>>,
    fail_list:     bool,
    hang_list:     bool,
    fail_decision: bool,
    list_calls:    AtomicUsize,
    decisions:     Mutex<Vec<(String, String, Decision)>>,
  }

  impl KycBackend for MockBackend {
    type Error = Unavailable;

    async fn list_documents(
      &self,
      _token: &str,
    ) -> Result<Vec<RawDocumentRecord>, Unavailable> {
      self.list_calls.fetch_add(1, Ordering::SeqCst);
      if self.hang_list {
        std::future::pending::<()>().await;
      }
      if self.fail_list {
        return Err(Unavailable);
      }
      Ok(self.listing.lock().unwrap().clone())
    }

    async fn submit_decision(
      &self,
      token: &str,
      user_id: &str,
      decision: &Decision,
    ) -> Result<VerificationRow, Unavailable> {
      self.decisions.lock().unwrap().push((
        token.to_owned(),
        user_id.to_owned(),
        decision.clone(),
      ));
      if self.fail_decision {
        return Err(Unavailable);
      }
      let status = if decision.approve {
        DocumentStatus::Verified
      } else {
        DocumentStatus::Rejected
      };
      let document = KycDocumentRecord {
        id:           format!("{user_id}-doc"),
        user_id:      user_id.to_owned(),
        kind:         "identity".into(),
        status,
        uploaded_at:  Some("2024-03-01".into()),
        reviewed_by:  Some("admin1".into()),
        reviewed_at:  Some("2024-03-02".into()),
        review_notes: decision.notes.clone(),
        user:         user("Echoed", "echo@example.com", "provider"),
      };
      Ok(VerificationRow {
        id:                       user_id.to_owned(),
        user:                     document.user.clone(),
        documents:                vec![document.clone()],
        latest_document:          Some(document.clone()),
        latest_reviewed_document: Some(document),
        status:                   DerivedStatus::from(status),
      })
    }
  }

  fn user(name: &str, email: &str, role: &str) -> UserSummary {
    UserSummary {
      id:         None,
      name:       name.into(),
      email:      email.into(),
      role:       role.into(),
      kyc_status: None,
      created_at: None,
    }
  }

  fn raw(id: &str, user_id: &str, uploaded_at: &str) -> RawDocumentRecord {
    RawDocumentRecord {
      id:           id.into(),
      user_id:      user_id.into(),
      kind:         "identity".into(),
      status:       DocumentStatus::Uploaded,
      uploaded_at:  Some(uploaded_at.into()),
      reviewed_by:  None,
      reviewed_at:  None,
      review_notes: None,
      user:         Some(user(user_id, &format!("{user_id}@example.com"), "customer")),
    }
  }

  fn listing() -> Vec<RawDocumentRecord> {
    vec![
      raw("d1", "u1", "2024-01-01"),
      raw("d2", "u2", "2024-01-02"),
      raw("d3", "u3", "2024-01-03"),
      raw("d4", "u1", "2024-01-04"),
    ]
  }

  fn backend_with(listing: Vec<RawDocumentRecord>) -> MockBackend {
    MockBackend {
      listing: Mutex::new(listing),
      ..Default::default()
    }
  }

  #[tokio::test]
  async fn refresh_aggregates_listing() {
    let mut desk = ReviewDesk::new(backend_with(listing()), StaticToken::new("t"));
    let outcome = desk.refresh().await.unwrap();

    assert_eq!(outcome, FetchOutcome::Loaded { rows: 3, rejected: 0 });
    let ids: Vec<_> = desk.rows().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["u1", "u2", "u3"]);
    assert_eq!(desk.row("u1").unwrap().documents.len(), 2);
    assert!(!desk.is_loading());
    assert_eq!(desk.counts().pending, 3);
  }

  #[tokio::test]
  async fn refresh_without_token_sends_nothing() {
    let mut desk = ReviewDesk::new(backend_with(listing()), StaticToken::none());
    let outcome = desk.refresh().await.unwrap();

    assert_eq!(outcome, FetchOutcome::Skipped);
    assert!(desk.rows().is_empty());
    assert_eq!(desk.backend.list_calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn blank_token_counts_as_signed_out() {
    let mut desk =
      ReviewDesk::new(backend_with(listing()), StaticToken(Some("  ".into())));
    assert_eq!(desk.refresh().await.unwrap(), FetchOutcome::Skipped);
    assert_eq!(desk.backend.list_calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn failed_refresh_keeps_previous_rows() {
    let mut desk = ReviewDesk::new(backend_with(listing()), StaticToken::new("t"));
    desk.refresh().await.unwrap();
    let before = desk.rows().to_vec();

    desk.backend.fail_list = true;
    let err = desk.refresh().await.unwrap_err();

    assert!(matches!(err, Error::Backend(_)));
    assert_eq!(desk.rows(), before.as_slice());
    assert_eq!(desk.error(), Some("backend error: backend unavailable"));
    assert!(!desk.is_loading());

    desk.backend.fail_list = false;
    desk.refresh().await.unwrap();
    assert_eq!(desk.error(), None);
  }

  #[tokio::test]
  async fn abandoned_refresh_stays_loading_until_next_fetch() {
    let mut desk = ReviewDesk::new(backend_with(listing()), StaticToken::new("t"));
    desk.backend.hang_list = true;

    let timed_out =
      tokio::time::timeout(Duration::from_millis(20), desk.refresh()).await;
    assert!(timed_out.is_err());
    assert!(desk.is_loading());
    assert!(desk.rows().is_empty());
    assert_eq!(desk.error(), None);

    desk.backend.hang_list = false;
    desk.refresh().await.unwrap();
    assert!(!desk.is_loading());
    assert_eq!(desk.rows().len(), 3);
  }

  #[tokio::test]
  async fn refresh_rejects_records_without_user() {
    let mut records = listing();
    records[1].user = None;
    let mut desk = ReviewDesk::new(backend_with(records), StaticToken::new("t"));

    let outcome = desk.refresh().await.unwrap();
    assert_eq!(outcome, FetchOutcome::Loaded { rows: 2, rejected: 1 });
    assert!(desk.row("u2").is_none());
  }

  #[tokio::test]
  async fn decision_replaces_only_the_target_row() {
    let mut desk = ReviewDesk::new(backend_with(listing()), StaticToken::new("t"));
    desk.refresh().await.unwrap();
    let before = desk.rows().to_vec();

    let returned = desk
      .decide("u2", true, Some("looks good".into()))
      .await
      .unwrap();

    assert_eq!(returned.id, "u2");
    assert_eq!(desk.rows().len(), before.len());
    assert_eq!(desk.rows()[0], before[0]);
    assert_eq!(desk.rows()[1], returned);
    assert_eq!(desk.rows()[2], before[2]);
    assert_eq!(desk.rows().iter().filter(|r| r.id == "u2").count(), 1);
    assert_eq!(desk.rows()[1].status, DerivedStatus::Verified);
    assert_eq!(desk.decision_state("u2"), DecisionState::Committed);
    assert_eq!(desk.decision_state("u1"), DecisionState::Idle);

    let sent = desk.backend.decisions.lock().unwrap().clone();
    assert_eq!(sent, vec![(
      "t".to_owned(),
      "u2".to_owned(),
      Decision {
        approve: true,
        notes:   Some("looks good".into()),
      }
    )]);
  }

  #[tokio::test]
  async fn failed_decision_leaves_rows_untouched() {
    let mut desk = ReviewDesk::new(backend_with(listing()), StaticToken::new("t"));
    desk.refresh().await.unwrap();
    let before = desk.rows().to_vec();

    desk.backend.fail_decision = true;
    let err = desk.decide("u1", false, None).await.unwrap_err();

    assert!(matches!(err, Error::Backend(_)));
    assert_eq!(desk.rows(), before.as_slice());
    assert_eq!(
      desk.decision_state("u1"),
      DecisionState::Failed("backend error: backend unavailable".into())
    );
    assert_eq!(desk.backend.decisions.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn decision_without_token_is_refused() {
    let mut desk = ReviewDesk::new(backend_with(listing()), StaticToken::none());
    let err = desk.decide("u1", true, None).await.unwrap_err();

    assert!(matches!(err, Error::Unauthenticated));
    assert!(desk.backend.decisions.lock().unwrap().is_empty());
    assert_eq!(desk.decision_state("u1"), DecisionState::Idle);
  }

  #[tokio::test]
  async fn decision_for_unlisted_user_does_not_insert() {
    let mut desk = ReviewDesk::new(backend_with(listing()), StaticToken::new("t"));
    desk.refresh().await.unwrap();

    desk.decide("u9", true, None).await.unwrap();
    assert_eq!(desk.rows().len(), 3);
    assert!(desk.row("u9").is_none());
  }
}
