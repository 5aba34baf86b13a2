//! The `Request` entity and its intake/projection companions.
//!
//! A request is created once, then mutated only through the lifecycle
//! engine. Field order mirrors the persisted column layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::RequestStatus;

// ─── Intent enums ────────────────────────────────────────────────────────────

/// The data-subject right being exercised. The public portal only files
/// ACCESS requests; the remaining kinds are reserved for the back office.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
  #[default]
  Access,
  Rectification,
  Cancellation,
  Objection,
  Portability,
  Block,
}

impl RequestKind {
  pub fn as_str(self) -> &'static str {
    match self {
      RequestKind::Access => "ACCESS",
      RequestKind::Rectification => "RECTIFICATION",
      RequestKind::Cancellation => "CANCELLATION",
      RequestKind::Objection => "OBJECTION",
      RequestKind::Portability => "PORTABILITY",
      RequestKind::Block => "BLOCK",
    }
  }
}

/// Whether the requester wants everything held about them or only specific
/// data categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessScope {
  All,
  Specific,
}

impl AccessScope {
  pub fn as_str(self) -> &'static str {
    match self {
      AccessScope::All => "ALL",
      AccessScope::Specific => "SPECIFIC",
    }
  }
}

/// Delivery format for the eventual data export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PreferredFormat {
  Pdf,
  Csv,
  Json,
}

impl PreferredFormat {
  pub fn as_str(self) -> &'static str {
    match self {
      PreferredFormat::Pdf => "PDF",
      PreferredFormat::Csv => "CSV",
      PreferredFormat::Json => "JSON",
    }
  }
}

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A persisted data-subject-access request.
///
/// `id`, `number`, `validation_token` and `response_deadline` are assigned
/// at creation and immutable thereafter. `status`, `identity_validated`,
/// `assigned_to` and the resolution fields are written only by the
/// lifecycle engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
  pub id:                      Uuid,
  /// Human-readable sequence, `SOL-<year>-<5 digits>`.
  pub number:                  String,
  pub submitted_at:            DateTime<Utc>,
  pub kind:                    RequestKind,
  pub status:                  RequestStatus,
  pub full_name:               String,
  /// Stored formatted (`12.345.678-5`).
  pub rut:                     String,
  /// Stored lowercased.
  pub email:                   String,
  pub phone:                   Option<String>,
  pub scope:                   AccessScope,
  pub categories:              Vec<String>,
  pub preferred_format:        PreferredFormat,
  pub identity_validated:      bool,
  pub validation_token:        String,
  pub validation_token_expiry: DateTime<Utc>,
  pub response_deadline:       DateTime<Utc>,
  pub days_remaining:          i64,
  pub assigned_to:             Option<String>,
  pub resolved_at:             Option<DateTime<Utc>>,
  pub download_url:            Option<String>,
  pub download_url_expiry:     Option<DateTime<Utc>>,
  pub origin_ip:               Option<String>,
  pub user_agent:              Option<String>,
  pub created_at:              DateTime<Utc>,
  pub updated_at:              DateTime<Utc>,
}

impl Request {
  /// A request is overdue once its response deadline has passed while it is
  /// still in a non-terminal state.
  pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
    !self.status.is_terminal() && now > self.response_deadline
  }
}

// ─── Intake ──────────────────────────────────────────────────────────────────

/// The submitted form payload, before validation.
///
/// `scope` and `preferred_format` are optional here so that their absence
/// surfaces as a field failure rather than a deserialisation error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRequest {
  #[serde(default)]
  pub full_name:        String,
  #[serde(default)]
  pub rut:              String,
  #[serde(default)]
  pub email:            String,
  #[serde(default)]
  pub phone:            Option<String>,
  #[serde(default)]
  pub kind:             RequestKind,
  pub scope:            Option<AccessScope>,
  #[serde(default)]
  pub categories:       Vec<String>,
  pub preferred_format: Option<PreferredFormat>,
  #[serde(default)]
  pub terms_accepted:   bool,
}

/// Audit data captured at the transport edge.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
  pub origin_ip:  Option<String>,
  pub user_agent: Option<String>,
}

// ─── Projections ─────────────────────────────────────────────────────────────

/// What `create_request` hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct CreateReceipt {
  pub id:                Uuid,
  pub number:            String,
  pub created_at:        DateTime<Utc>,
  pub response_deadline: DateTime<Utc>,
  pub email:             String,
  pub status:            RequestStatus,
}

impl CreateReceipt {
  pub fn of(request: &Request) -> Self {
    CreateReceipt {
      id:                request.id,
      number:            request.number.clone(),
      created_at:        request.created_at,
      response_deadline: request.response_deadline,
      email:             request.email.clone(),
      status:            request.status,
    }
  }
}

/// The non-sensitive projection returned by token and email queries.
/// Never includes the validation token.
#[derive(Debug, Clone, Serialize)]
pub struct RequestSummary {
  pub number:             String,
  pub kind:               RequestKind,
  pub status:             RequestStatus,
  pub full_name:          String,
  pub rut:                String,
  pub scope:              AccessScope,
  pub preferred_format:   PreferredFormat,
  pub identity_validated: bool,
  pub submitted_at:       DateTime<Utc>,
  pub response_deadline:  DateTime<Utc>,
}

impl RequestSummary {
  pub fn of(request: &Request) -> Self {
    RequestSummary {
      number:             request.number.clone(),
      kind:               request.kind,
      status:             request.status,
      full_name:          request.full_name.clone(),
      rut:                request.rut.clone(),
      scope:              request.scope,
      preferred_format:   request.preferred_format,
      identity_validated: request.identity_validated,
      submitted_at:       request.submitted_at,
      response_deadline:  request.response_deadline,
    }
  }
}
