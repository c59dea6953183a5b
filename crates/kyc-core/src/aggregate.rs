//! Grouping of document records into verification rows.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
  record::KycDocumentRecord,
  row::{DerivedStatus, VerificationRow},
};

/// Group `records` into one row per user.
///
/// Users appear in first-seen order and each row keeps its documents in
/// arrival order. Every record lands in exactly one row.
pub fn aggregate(records: Vec<KycDocumentRecord>) -> Vec<VerificationRow> {
  let mut index: HashMap<String, usize> = HashMap::new();
  let mut groups: Vec<Vec<KycDocumentRecord>> = Vec::new();

  for record in records {
    match index.get(&record.user_id) {
      Some(&slot) => groups[slot].push(record),
      None => {
        index.insert(record.user_id.clone(), groups.len());
        groups.push(vec![record]);
      }
    }
  }

  groups.into_iter().filter_map(build_row).collect()
}

fn build_row(documents: Vec<KycDocumentRecord>) -> Option<VerificationRow> {
  let first = documents.first()?;
  let id = first.user_id.clone();
  let user = first.user.clone();

  let latest_document =
    latest_by(documents.iter(), KycDocumentRecord::uploaded_key).cloned();
  let latest_reviewed_document = latest_by(
    documents.iter().filter(|d| d.is_reviewed()),
    KycDocumentRecord::reviewed_key,
  )
  .cloned();
  let status = latest_document
    .as_ref()
    .map(|d| DerivedStatus::from(d.status))
    .unwrap_or_default();

  Some(VerificationRow {
    id,
    user,
    documents,
    latest_document,
    latest_reviewed_document,
    status,
  })
}

/// The element with the greatest key. On a tie the earliest element wins,
/// which is what a stable descending sort followed by "take first" yields.
fn latest_by<'a, I, F>(items: I, key: F) -> Option<&'a KycDocumentRecord>
where
  I: Iterator<Item = &'a KycDocumentRecord>,
  F: Fn(&KycDocumentRecord) -> Option<DateTime<Utc>>,
{
  // `min_by` keeps the first of equal elements; the comparator is reversed.
  items.min_by(|a, b| key(*b).cmp(&key(*a)))
}

// ─── Splicing ────────────────────────────────────────────────────────────────

/// Replace the row whose `id` matches `row.id` in place.
///
/// Returns `false` and leaves `rows` untouched when no row matches.
pub fn splice_row(rows: &mut [VerificationRow], row: VerificationRow) -> bool {
  match rows.iter_mut().find(|existing| existing.id == row.id) {
    Some(slot) => {
      *slot = row;
      true
    }
    None => {
      tracing::warn!(user_id = %row.id, "decision result matches no listed row");
      false
    }
  }
}

// ─── Counts ──────────────────────────────────────────────────────────────────

/// Row counts per derived status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
  pub total:    usize,
  pub pending:  usize,
  pub verified: usize,
  pub rejected: usize,
}

pub fn tally<'a>(rows: impl IntoIterator<Item = &'a VerificationRow>) -> StatusCounts {
  rows.into_iter().fold(StatusCounts::default(), |mut counts, row| {
    counts.total += 1;
    match row.status {
      DerivedStatus::Pending => counts.pending += 1,
      DerivedStatus::Verified => counts.verified += 1,
      DerivedStatus::Rejected => counts.rejected += 1,
    }
    counts
  })
}
