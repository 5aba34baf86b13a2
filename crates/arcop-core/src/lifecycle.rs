//! The request lifecycle state machine.
//!
//! A request moves forward through
//! `PENDING → VALIDATING_IDENTITY → VALIDATED → ASSIGNED → IN_PROGRESS →
//! RESOLVED → CLOSED`, with the terminal side-branches `REJECTED` and
//! `EXPIRED` reachable from any non-terminal state. The implemented
//! validate-identity transition collapses the intermediate
//! `VALIDATING_IDENTITY` step into a single atomic `PENDING → VALIDATED`
//! edge; the explicit state remains a legal stop for deployments that want
//! the stricter audit trail.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a request.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
  Pending,
  ValidatingIdentity,
  Validated,
  Assigned,
  InProgress,
  Resolved,
  Closed,
  Rejected,
  Expired,
}

impl RequestStatus {
  /// Canonical text form, as persisted by store adapters.
  pub fn as_str(self) -> &'static str {
    match self {
      RequestStatus::Pending => "PENDING",
      RequestStatus::ValidatingIdentity => "VALIDATING_IDENTITY",
      RequestStatus::Validated => "VALIDATED",
      RequestStatus::Assigned => "ASSIGNED",
      RequestStatus::InProgress => "IN_PROGRESS",
      RequestStatus::Resolved => "RESOLVED",
      RequestStatus::Closed => "CLOSED",
      RequestStatus::Rejected => "REJECTED",
      RequestStatus::Expired => "EXPIRED",
    }
  }

  /// Terminal states admit no further transitions.
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      RequestStatus::Closed | RequestStatus::Rejected | RequestStatus::Expired
    )
  }

  /// Whether the state machine has an edge from `self` to `next`.
  ///
  /// Forward transitions may not skip a required precursor and may never go
  /// backward; rejection and expiry are reachable from every non-terminal
  /// state.
  pub fn permits(self, next: RequestStatus) -> bool {
    use RequestStatus::*;

    if self.is_terminal() {
      return false;
    }
    if matches!(next, Rejected | Expired) {
      return true;
    }

    matches!(
      (self, next),
      (Pending, ValidatingIdentity)
        | (Pending, Validated)
        | (ValidatingIdentity, Validated)
        | (Validated, Assigned)
        | (Assigned, InProgress)
        | (InProgress, Resolved)
        | (Resolved, Closed)
    )
  }
}

impl fmt::Display for RequestStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
