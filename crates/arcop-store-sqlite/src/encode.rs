//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, enums their canonical
//! SCREAMING_SNAKE_CASE text, booleans the literal `TRUE`/`FALSE`, and
//! category sets a JSON array string.

use arcop_core::{
  audit::{LogAction, LogEntry},
  lifecycle::RequestStatus,
  request::{AccessScope, PreferredFormat, Request, RequestKind},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String {
  id.hyphenated().to_string()
}

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Ok(Uuid::parse_str(s)?)
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

pub fn encode_bool(b: bool) -> &'static str {
  if b { "TRUE" } else { "FALSE" }
}

pub fn decode_bool(s: &str) -> Result<bool> {
  match s {
    "TRUE" => Ok(true),
    "FALSE" => Ok(false),
    other => Err(Error::Decode(format!("unknown bool: {other:?}"))),
  }
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<RequestStatus> {
  match s {
    "PENDING" => Ok(RequestStatus::Pending),
    "VALIDATING_IDENTITY" => Ok(RequestStatus::ValidatingIdentity),
    "VALIDATED" => Ok(RequestStatus::Validated),
    "ASSIGNED" => Ok(RequestStatus::Assigned),
    "IN_PROGRESS" => Ok(RequestStatus::InProgress),
    "RESOLVED" => Ok(RequestStatus::Resolved),
    "CLOSED" => Ok(RequestStatus::Closed),
    "REJECTED" => Ok(RequestStatus::Rejected),
    "EXPIRED" => Ok(RequestStatus::Expired),
    other => Err(Error::Decode(format!("unknown status: {other:?}"))),
  }
}

pub fn decode_kind(s: &str) -> Result<RequestKind> {
  match s {
    "ACCESS" => Ok(RequestKind::Access),
    "RECTIFICATION" => Ok(RequestKind::Rectification),
    "CANCELLATION" => Ok(RequestKind::Cancellation),
    "OBJECTION" => Ok(RequestKind::Objection),
    "PORTABILITY" => Ok(RequestKind::Portability),
    "BLOCK" => Ok(RequestKind::Block),
    other => Err(Error::Decode(format!("unknown kind: {other:?}"))),
  }
}

pub fn decode_scope(s: &str) -> Result<AccessScope> {
  match s {
    "ALL" => Ok(AccessScope::All),
    "SPECIFIC" => Ok(AccessScope::Specific),
    other => Err(Error::Decode(format!("unknown scope: {other:?}"))),
  }
}

pub fn decode_format(s: &str) -> Result<PreferredFormat> {
  match s {
    "PDF" => Ok(PreferredFormat::Pdf),
    "CSV" => Ok(PreferredFormat::Csv),
    "JSON" => Ok(PreferredFormat::Json),
    other => Err(Error::Decode(format!("unknown format: {other:?}"))),
  }
}

pub fn decode_action(s: &str) -> Result<LogAction> {
  match s {
    "REQUEST_CREATED" => Ok(LogAction::RequestCreated),
    "IDENTITY_VALIDATED" => Ok(LogAction::IdentityValidated),
    "ASSIGNED" => Ok(LogAction::Assigned),
    "PROCESSING_STARTED" => Ok(LogAction::ProcessingStarted),
    "RESOLVED" => Ok(LogAction::Resolved),
    "CLOSED" => Ok(LogAction::Closed),
    "REJECTED" => Ok(LogAction::Rejected),
    "EXPIRED" => Ok(LogAction::Expired),
    "CONFIRMATION_SENT" => Ok(LogAction::ConfirmationSent),
    "DATA_READY_SENT" => Ok(LogAction::DataReadySent),
    other => Err(Error::Decode(format!("unknown action: {other:?}"))),
  }
}

// ─── Categories ──────────────────────────────────────────────────────────────

pub fn encode_categories(categories: &[String]) -> Result<String> {
  Ok(serde_json::to_string(categories)?)
}

pub fn decode_categories(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `requests` row.
pub struct RawRequest {
  pub id:                  String,
  pub number:              String,
  pub submitted_at:        String,
  pub kind:                String,
  pub status:              String,
  pub full_name:           String,
  pub rut:                 String,
  pub email:               String,
  pub phone:               Option<String>,
  pub scope:               String,
  pub categories:          String,
  pub preferred_format:    String,
  pub identity_validated:  String,
  pub validation_token:    String,
  pub token_expiry:        String,
  pub response_deadline:   String,
  pub days_remaining:      i64,
  pub assigned_to:         Option<String>,
  pub resolved_at:         Option<String>,
  pub download_url:        Option<String>,
  pub download_url_expiry: Option<String>,
  pub origin_ip:           Option<String>,
  pub user_agent:          Option<String>,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawRequest {
  pub fn into_request(self) -> Result<Request> {
    Ok(Request {
      id:                      decode_uuid(&self.id)?,
      number:                  self.number,
      submitted_at:            decode_dt(&self.submitted_at)?,
      kind:                    decode_kind(&self.kind)?,
      status:                  decode_status(&self.status)?,
      full_name:               self.full_name,
      rut:                     self.rut,
      email:                   self.email,
      phone:                   self.phone,
      scope:                   decode_scope(&self.scope)?,
      categories:              decode_categories(&self.categories)?,
      preferred_format:        decode_format(&self.preferred_format)?,
      identity_validated:      decode_bool(&self.identity_validated)?,
      validation_token:        self.validation_token,
      validation_token_expiry: decode_dt(&self.token_expiry)?,
      response_deadline:       decode_dt(&self.response_deadline)?,
      days_remaining:          self.days_remaining,
      assigned_to:             self.assigned_to,
      resolved_at:             decode_opt_dt(self.resolved_at.as_deref())?,
      download_url:            self.download_url,
      download_url_expiry:     decode_opt_dt(
        self.download_url_expiry.as_deref(),
      )?,
      origin_ip:               self.origin_ip,
      user_agent:              self.user_agent,
      created_at:              decode_dt(&self.created_at)?,
      updated_at:              decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `logs` row.
pub struct RawLogEntry {
  pub log_id:    String,
  pub timestamp: String,
  pub action:    String,
  pub reference: String,
  pub detail:    String,
  pub actor:     String,
}

impl RawLogEntry {
  pub fn into_entry(self) -> Result<LogEntry> {
    Ok(LogEntry {
      log_id:    decode_uuid(&self.log_id)?,
      timestamp: decode_dt(&self.timestamp)?,
      action:    decode_action(&self.action)?,
      reference: self.reference,
      detail:    self.detail,
      actor:     self.actor,
    })
  }
}
