//! Append-only audit log records.
//!
//! Every state-changing operation appends exactly one entry; entries are
//! never mutated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogAction {
  RequestCreated,
  IdentityValidated,
  Assigned,
  ProcessingStarted,
  Resolved,
  Closed,
  Rejected,
  Expired,
  ConfirmationSent,
  DataReadySent,
}

impl LogAction {
  pub fn as_str(self) -> &'static str {
    match self {
      LogAction::RequestCreated => "REQUEST_CREATED",
      LogAction::IdentityValidated => "IDENTITY_VALIDATED",
      LogAction::Assigned => "ASSIGNED",
      LogAction::ProcessingStarted => "PROCESSING_STARTED",
      LogAction::Resolved => "RESOLVED",
      LogAction::Closed => "CLOSED",
      LogAction::Rejected => "REJECTED",
      LogAction::Expired => "EXPIRED",
      LogAction::ConfirmationSent => "CONFIRMATION_SENT",
      LogAction::DataReadySent => "DATA_READY_SENT",
    }
  }
}

/// One audit record: who did what to which request, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
  pub log_id:    Uuid,
  pub timestamp: DateTime<Utc>,
  pub action:    LogAction,
  /// The request number the entry refers to.
  pub reference: String,
  pub detail:    String,
  pub actor:     String,
}

impl LogEntry {
  pub fn new(
    action: LogAction,
    reference: impl Into<String>,
    detail: impl Into<String>,
    actor: impl Into<String>,
    at: DateTime<Utc>,
  ) -> Self {
    LogEntry {
      log_id:    Uuid::new_v4(),
      timestamp: at,
      action,
      reference: reference.into(),
      detail:    detail.into(),
      actor:     actor.into(),
    }
  }
}
