//! The `RequestStore` trait and supporting types.
//!
//! Implemented by storage backends (e.g. `arcop-store-sqlite`); the engine
//! and the HTTP layer depend on this abstraction, never on a concrete
//! backend. All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes.

use std::{collections::BTreeMap, future::Future};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
  audit::LogEntry,
  lifecycle::RequestStatus,
  request::Request,
};

// ─── Partial updates ─────────────────────────────────────────────────────────

/// A typed partial update: the closed set of fields the lifecycle engine is
/// allowed to change after creation. There is no way to express an unknown
/// field.
#[derive(Debug, Clone, Default)]
pub struct RequestPatch {
  pub status:              Option<RequestStatus>,
  pub identity_validated:  Option<bool>,
  pub assigned_to:         Option<String>,
  pub resolved_at:         Option<DateTime<Utc>>,
  pub download_url:        Option<String>,
  pub download_url_expiry: Option<DateTime<Utc>>,
}

impl RequestPatch {
  /// Apply the patch to an in-memory request, stamping `updated_at`.
  pub fn apply(&self, request: &mut Request, now: DateTime<Utc>) {
    if let Some(status) = self.status {
      request.status = status;
    }
    if let Some(validated) = self.identity_validated {
      request.identity_validated = validated;
    }
    if let Some(assignee) = &self.assigned_to {
      request.assigned_to = Some(assignee.clone());
    }
    if let Some(at) = self.resolved_at {
      request.resolved_at = Some(at);
    }
    if let Some(url) = &self.download_url {
      request.download_url = Some(url.clone());
    }
    if let Some(at) = self.download_url_expiry {
      request.download_url_expiry = Some(at);
    }
    request.updated_at = now;
  }
}

/// Aggregate counters over all requests.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestStats {
  pub total:     usize,
  pub by_status: BTreeMap<String, usize>,
  pub by_kind:   BTreeMap<String, usize>,
  pub by_format: BTreeMap<String, usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a request store backend.
///
/// Requests are appended once; later changes go through the patch methods,
/// which stamp `updated_at` with the caller-supplied instant. Log entries
/// are strictly append-only.
pub trait RequestStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a freshly created request.
  fn append<'a>(
    &'a self,
    request: &'a Request,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Exact-match lookup by validation token.
  fn find_by_token<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Option<Request>, Self::Error>> + Send + 'a;

  /// Case-insensitive lookup of every request filed under an email address.
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Vec<Request>, Self::Error>> + Send + 'a;

  /// Apply `patch` to the request with the given token, stamping
  /// `updated_at = now`. Returns `false` if no request matches.
  fn update_fields<'a>(
    &'a self,
    token: &'a str,
    patch: RequestPatch,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Compare-and-swap variant of [`update_fields`](Self::update_fields):
  /// the patch is applied only while the stored status still equals
  /// `expected`, as one atomic operation. Returns `false` when the token
  /// does not match or the status moved — concurrent transitions against
  /// the same request cannot both win.
  fn update_fields_if_status<'a>(
    &'a self,
    token: &'a str,
    expected: RequestStatus,
    patch: RequestPatch,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Every request, in insertion order.
  fn list_all(
    &self,
  ) -> impl Future<Output = Result<Vec<Request>, Self::Error>> + Send + '_;

  /// Counters by status, kind and preferred format.
  fn aggregate_counts(
    &self,
  ) -> impl Future<Output = Result<RequestStats, Self::Error>> + Send + '_;

  /// Append one audit record.
  fn append_log<'a>(
    &'a self,
    entry: &'a LogEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Every audit record, in insertion order.
  fn list_logs(
    &self,
  ) -> impl Future<Output = Result<Vec<LogEntry>, Self::Error>> + Send + '_;
}
