//! Error types for `arcop-core`.
//!
//! Expected conditions (a stale email link, a double-clicked validation
//! button, an out-of-order administrative action) are dedicated variants so
//! callers can branch on them; infrastructure failures from the store and
//! notifier seams carry their boxed source error.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{lifecycle::RequestStatus, validate::ValidationFailures};

#[derive(Debug, Error)]
pub enum Error {
  /// The submitted form data violated one or more field rules.
  #[error("validation failed: {0}")]
  Validation(ValidationFailures),

  /// No request matches the supplied token.
  #[error("no request matches the supplied token")]
  NotFound,

  /// The token matched a request but its validity window has closed.
  #[error("validation token expired at {expired_at}")]
  TokenExpired { expired_at: DateTime<Utc> },

  /// The request's identity was already validated by an earlier call.
  #[error("identity already validated for request {number}")]
  AlreadyValidated { number: String },

  /// The requested status change is not an edge of the state machine.
  #[error("invalid transition: {from} -> {to}")]
  InvalidTransition {
    from: RequestStatus,
    to:   RequestStatus,
  },

  /// The store adapter failed at the I/O level.
  #[error("request store unavailable: {0}")]
  StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The notifier failed to hand the message to its transport.
  #[error("notification delivery failed: {0}")]
  DeliveryFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
