//! Document records as the backend serves them.
//!
//! Timestamps stay in the string form the backend sent. Ordering keys are
//! derived on demand so a malformed date never fails a whole listing.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{
  Deserialize, Deserializer, Serialize,
  de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor},
};
use strum::{Display, EnumString};

use crate::Error;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Review state of a single submitted document.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DocumentStatus {
  Uploaded,
  Verified,
  Rejected,
}

// ─── User ────────────────────────────────────────────────────────────────────

/// The user summary nested in every document record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:         Option<String>,
  #[serde(default)]
  pub name:       String,
  #[serde(default)]
  pub email:      String,
  /// Primary marketplace role: `admin`, `customer` or `provider`.
  #[serde(default)]
  pub role:       String,
  /// Account-level KYC status as the backend tracks it.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub kyc_status: Option<String>,
  #[serde(
    default,
    deserialize_with = "lenient_timestamp",
    skip_serializing_if = "Option::is_none"
  )]
  pub created_at: Option<String>,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A validated KYC document record. Every record carries its owner's summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycDocumentRecord {
  pub id:           String,
  pub user_id:      String,
  /// Document category, e.g. `identity` or `business_registration`.
  #[serde(rename = "type")]
  pub kind:         String,
  pub status:       DocumentStatus,
  #[serde(
    default,
    deserialize_with = "lenient_timestamp",
    skip_serializing_if = "Option::is_none"
  )]
  pub uploaded_at:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reviewed_by:  Option<String>,
  #[serde(
    default,
    deserialize_with = "lenient_timestamp",
    skip_serializing_if = "Option::is_none"
  )]
  pub reviewed_at:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub review_notes: Option<String>,
  pub user:         UserSummary,
}

/// A record exactly as it arrives on the wire, before the nested user has
/// been checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocumentRecord {
  pub id:           String,
  pub user_id:      String,
  #[serde(rename = "type")]
  pub kind:         String,
  pub status:       DocumentStatus,
  #[serde(default, deserialize_with = "lenient_timestamp")]
  pub uploaded_at:  Option<String>,
  #[serde(default)]
  pub reviewed_by:  Option<String>,
  #[serde(default, deserialize_with = "lenient_timestamp")]
  pub reviewed_at:  Option<String>,
  #[serde(default)]
  pub review_notes: Option<String>,
  #[serde(default)]
  pub user:         Option<UserSummary>,
}

impl TryFrom<RawDocumentRecord> for KycDocumentRecord {
  type Error = Error;

  fn try_from(raw: RawDocumentRecord) -> Result<Self, Self::Error> {
    let Some(user) = raw.user else {
      return Err(Error::MissingUser(raw.id));
    };
    Ok(Self {
      id: raw.id,
      user_id: raw.user_id,
      kind: raw.kind,
      status: raw.status,
      uploaded_at: raw.uploaded_at,
      reviewed_by: raw.reviewed_by,
      reviewed_at: raw.reviewed_at,
      review_notes: raw.review_notes,
      user,
    })
  }
}

impl KycDocumentRecord {
  /// Ordering key for "most recently uploaded".
  pub fn uploaded_key(&self) -> Option<DateTime<Utc>> {
    timestamp_key(self.uploaded_at.as_deref())
  }

  /// Ordering key for "most recently reviewed".
  pub fn reviewed_key(&self) -> Option<DateTime<Utc>> {
    timestamp_key(self.reviewed_at.as_deref())
  }

  /// Whether a reviewer has acted on this document.
  pub fn is_reviewed(&self) -> bool {
    self
      .reviewed_by
      .as_deref()
      .is_some_and(|by| !by.trim().is_empty())
  }
}

/// Split a raw listing into usable records and the records rejected for a
/// missing user. Arrival order is kept.
pub fn validate_records(
  raw: Vec<RawDocumentRecord>,
) -> (Vec<KycDocumentRecord>, Vec<Error>) {
  let mut records = Vec::with_capacity(raw.len());
  let mut rejected = Vec::new();
  for item in raw {
    match KycDocumentRecord::try_from(item) {
      Ok(record) => records.push(record),
      Err(e) => {
        tracing::warn!(error = %e, "rejecting kyc document record");
        rejected.push(e);
      }
    }
  }
  (records, rejected)
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Stand-in kept for a timestamp that arrived as neither a string nor a
/// number. It never parses, so it orders as the epoch.
pub const INVALID_TIMESTAMP: &str = "Invalid Date";

/// Parse the timestamp forms the backend is known to emit: RFC 3339, ISO 8601
/// with a colon-less offset (`+0000`), a naive `YYYY-MM-DDTHH:MM:SS[.f]` (read
/// as UTC) and a bare `YYYY-MM-DD`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
  let value = value.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
    return Some(dt.with_timezone(&Utc));
  }
  if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
    return Some(dt.with_timezone(&Utc));
  }
  for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
      return Some(naive.and_utc());
    }
  }
  NaiveDate::parse_from_str(value, "%Y-%m-%d")
    .ok()
    .and_then(|date| date.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

/// Ordering key for an optional timestamp.
///
/// `None` sorts before every present value. A present but unparsable value
/// falls back to the Unix epoch.
pub fn timestamp_key(value: Option<&str>) -> Option<DateTime<Utc>> {
  value.map(|v| parse_timestamp(v).unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
}

/// Deserialize a timestamp field without ever failing the enclosing record.
///
/// Strings are kept verbatim. Integers and floats are read as epoch
/// milliseconds. Anything else becomes [`INVALID_TIMESTAMP`].
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  deserializer.deserialize_any(TimestampVisitor)
}

fn from_epoch_millis(millis: i64) -> String {
  DateTime::<Utc>::from_timestamp_millis(millis)
    .map(|dt| dt.to_rfc3339())
    .unwrap_or_else(|| INVALID_TIMESTAMP.to_owned())
}

struct TimestampVisitor;

impl<'de> Visitor<'de> for TimestampVisitor {
  type Value = Option<String>;

  fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str("a timestamp")
  }

  fn visit_none<E>(self) -> Result<Self::Value, E>
  where
    E: de::Error,
  {
    Ok(None)
  }

  fn visit_unit<E>(self) -> Result<Self::Value, E>
  where
    E: de::Error,
  {
    Ok(None)
  }

  fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
  where
    D: Deserializer<'de>,
  {
    deserializer.deserialize_any(self)
  }

  fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
  where
    E: de::Error,
  {
    Ok(Some(v.to_owned()))
  }

  fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
  where
    E: de::Error,
  {
    Ok(Some(v))
  }

  fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
  where
    E: de::Error,
  {
    Ok(Some(from_epoch_millis(v)))
  }

  fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
  where
    E: de::Error,
  {
    Ok(Some(
      i64::try_from(v)
        .map(from_epoch_millis)
        .unwrap_or_else(|_| INVALID_TIMESTAMP.to_owned()),
    ))
  }

  fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
  where
    E: de::Error,
  {
    if v.is_finite() {
      Ok(Some(from_epoch_millis(v as i64)))
    } else {
      Ok(Some(INVALID_TIMESTAMP.to_owned()))
    }
  }

  fn visit_bool<E>(self, _: bool) -> Result<Self::Value, E>
  where
    E: de::Error,
  {
    Ok(Some(INVALID_TIMESTAMP.to_owned()))
  }

  fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
  where
    A: MapAccess<'de>,
  {
    while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
    Ok(Some(INVALID_TIMESTAMP.to_owned()))
  }

  fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
  where
    A: SeqAccess<'de>,
  {
    while seq.next_element::<IgnoredAny>()?.is_some() {}
    Ok(Some(INVALID_TIMESTAMP.to_owned()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_supported_forms() {
    let date_only = parse_timestamp("2024-01-01").unwrap();
    assert_eq!(date_only.to_rfc3339(), "2024-01-01T00:00:00+00:00");

    let naive = parse_timestamp("2024-01-01T10:30:00").unwrap();
    assert_eq!(naive.to_rfc3339(), "2024-01-01T10:30:00+00:00");

    let offset = parse_timestamp("2024-01-01T12:00:00+02:00").unwrap();
    assert_eq!(offset.to_rfc3339(), "2024-01-01T10:00:00+00:00");

    let millis = parse_timestamp("2024-01-01T10:30:00.250Z").unwrap();
    assert_eq!(millis.timestamp_millis() % 1000, 250);

    let compact = parse_timestamp("2024-02-01T10:00:00.000+0000").unwrap();
    assert_eq!(compact.to_rfc3339(), "2024-02-01T10:00:00+00:00");

    let shifted = parse_timestamp("2024-02-01T12:00:00+0200").unwrap();
    assert_eq!(shifted.to_rfc3339(), "2024-02-01T10:00:00+00:00");
  }

  #[test]
  fn non_string_timestamps_do_not_sink_the_listing() {
    let raw: Vec<RawDocumentRecord> = serde_json::from_value(serde_json::json!([
      { "id": "d1", "userId": "u1", "type": "identity", "status": "uploaded",
        "uploadedAt": "2023-06-01",
        "user": { "name": "Ada", "email": "ada@example.com", "role": "customer" } },
      { "id": "d2", "userId": "u2", "type": "identity", "status": "verified",
        "uploadedAt": 1704067200000_i64, "reviewedBy": "admin1",
        "reviewedAt": { "$date": "2024-01-02" },
        "user": { "name": "Bo", "email": "bo@example.com", "role": "provider",
                  "createdAt": true } },
      { "id": "d3", "userId": "u3", "type": "identity", "status": "uploaded",
        "uploadedAt": null, "reviewedAt": [1, 2],
        "user": { "name": "Cy", "email": "cy@example.com", "role": "customer" } }
    ]))
    .unwrap();

    let (records, rejected) = validate_records(raw);
    assert!(rejected.is_empty());
    assert_eq!(records.len(), 3);

    let millis = &records[1];
    assert_eq!(
      millis.uploaded_key().unwrap().to_rfc3339(),
      "2024-01-01T00:00:00+00:00"
    );
    assert_eq!(millis.reviewed_at.as_deref(), Some(INVALID_TIMESTAMP));
    assert_eq!(millis.reviewed_key(), Some(DateTime::<Utc>::UNIX_EPOCH));
    assert_eq!(millis.user.created_at.as_deref(), Some(INVALID_TIMESTAMP));

    assert_eq!(records[2].uploaded_at, None);
    assert_eq!(records[2].reviewed_key(), Some(DateTime::<Utc>::UNIX_EPOCH));
  }

  #[test]
  fn unparsable_falls_back_to_epoch() {
    assert_eq!(parse_timestamp("last tuesday"), None);
    assert_eq!(
      timestamp_key(Some("last tuesday")),
      Some(DateTime::<Utc>::UNIX_EPOCH)
    );
    assert_eq!(timestamp_key(None), None);
    assert!(timestamp_key(None) < timestamp_key(Some("garbage")));
  }

  #[test]
  fn blank_reviewer_is_not_a_review() {
    let raw: RawDocumentRecord = serde_json::from_value(serde_json::json!({
      "id": "d1",
      "userId": "u1",
      "type": "identity",
      "status": "uploaded",
      "reviewedBy": "  ",
      "user": { "name": "Ada", "email": "ada@example.com", "role": "customer" }
    }))
    .unwrap();
    let record = KycDocumentRecord::try_from(raw).unwrap();
    assert!(!record.is_reviewed());
  }

  #[test]
  fn null_user_is_rejected() {
    let raw: Vec<RawDocumentRecord> = serde_json::from_value(serde_json::json!([
      { "id": "d1", "userId": "u1", "type": "identity", "status": "uploaded",
        "user": null },
      { "id": "d2", "userId": "u2", "type": "identity", "status": "uploaded",
        "user": { "name": "Bo", "email": "bo@example.com", "role": "provider" } },
      { "id": "d3", "userId": "u3", "type": "identity", "status": "verified" }
    ]))
    .unwrap();

    let (records, rejected) = validate_records(raw);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "d2");
    assert_eq!(rejected.len(), 2);
    assert!(matches!(&rejected[0], Error::MissingUser(id) if id == "d1"));
    assert!(matches!(&rejected[1], Error::MissingUser(id) if id == "d3"));
  }
}
