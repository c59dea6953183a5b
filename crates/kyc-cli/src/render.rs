//! Plain-text rendering of verification rows.

use std::fmt::Write as _;

use kyc_core::{KycDocumentRecord, StatusCounts, VerificationRow, record::parse_timestamp};

/// `2024-02-01 09:30` for parsable timestamps, the raw text otherwise, `-`
/// when absent.
pub fn format_time(raw: Option<&str>) -> String {
  match raw {
    None => "-".to_owned(),
    Some(value) => parse_timestamp(value)
      .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
      .unwrap_or_else(|| value.to_owned()),
  }
}

pub fn summary_line(counts: &StatusCounts) -> String {
  format!(
    "{} users: {} pending, {} verified, {} rejected",
    counts.total, counts.pending, counts.verified, counts.rejected
  )
}

/// One line per row: id, status, category, user, latest review.
pub fn row_line(row: &VerificationRow) -> String {
  let review = match &row.latest_reviewed_document {
    Some(doc) => format!(
      "reviewed by {} at {}",
      doc.reviewed_by.as_deref().unwrap_or("-"),
      format_time(doc.reviewed_at.as_deref())
    ),
    None => "not yet reviewed".to_owned(),
  };
  format!(
    "{:<14} {:<9} {:<9} {} <{}>  {}",
    row.id,
    row.status.to_string(),
    row.category().to_string(),
    row.user.name,
    row.user.email,
    review
  )
}

fn document_line(doc: &KycDocumentRecord) -> String {
  let mut line = format!(
    "  {:<14} {:<24} {:<9} uploaded {}",
    doc.id,
    doc.kind,
    doc.status.to_string(),
    format_time(doc.uploaded_at.as_deref())
  );
  if doc.is_reviewed() {
    let _ = write!(
      line,
      ", reviewed by {} at {}",
      doc.reviewed_by.as_deref().unwrap_or("-"),
      format_time(doc.reviewed_at.as_deref())
    );
  }
  if let Some(notes) = doc.review_notes.as_deref().filter(|n| !n.is_empty()) {
    let _ = write!(line, " ({notes})");
  }
  line
}

/// Multi-line view of a row and every document behind it.
pub fn row_detail(row: &VerificationRow) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{} <{}>", row.user.name, row.user.email);
  let _ = writeln!(out, "  user id:     {}", row.id);
  let _ = writeln!(out, "  role:        {} ({})", row.user.role, row.category());
  let _ = writeln!(out, "  status:      {}", row.status);
  if let Some(account) = row.user.kyc_status.as_deref() {
    let _ = writeln!(out, "  account kyc: {account}");
  }
  let _ = writeln!(
    out,
    "  joined:      {}",
    format_time(row.user.created_at.as_deref())
  );
  let latest = row
    .latest_document
    .as_ref()
    .map(|d| d.id.as_str())
    .unwrap_or("-");
  let _ = writeln!(out, "  latest doc:  {latest}");
  let _ = writeln!(out, "documents:");
  for doc in &row.documents {
    let _ = writeln!(out, "{}", document_line(doc));
  }
  out
}
