//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::atomic::{AtomicU32, Ordering};

use arcop_core::{
  audit::{LogAction, LogEntry},
  lifecycle::RequestStatus,
  request::{AccessScope, PreferredFormat, Request, RequestKind},
  store::{RequestPatch, RequestStore},
};
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::SqliteStore;

/// Monotonic suffix so fixtures never collide on the UNIQUE `number`.
static NUMBER_SEQ: AtomicU32 = AtomicU32::new(1);

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

fn sample_request(token: &str, email: &str) -> Request {
  let created = Utc.with_ymd_and_hms(2025, 1, 6, 10, 0, 0).unwrap();
  Request {
    id: Uuid::new_v4(),
    number: format!(
      "SOL-2025-{:05}",
      NUMBER_SEQ.fetch_add(1, Ordering::Relaxed)
    ),
    submitted_at: created,
    kind: RequestKind::Access,
    status: RequestStatus::Pending,
    full_name: "Carlos Jerez".to_owned(),
    rut: "12.345.678-5".to_owned(),
    email: email.to_lowercase(),
    phone: Some("+56 9 8765 4321".to_owned()),
    scope: AccessScope::Specific,
    categories: vec!["contact".to_owned(), "purchases".to_owned()],
    preferred_format: PreferredFormat::Pdf,
    identity_validated: false,
    validation_token: token.to_owned(),
    validation_token_expiry: created + chrono::Duration::minutes(30),
    response_deadline: Utc.with_ymd_and_hms(2025, 1, 27, 10, 0, 0).unwrap(),
    days_remaining: 15,
    assigned_to: None,
    resolved_at: None,
    download_url: None,
    download_url_expiry: None,
    origin_ip: Some("203.0.113.7".to_owned()),
    user_agent: Some("Mozilla/5.0".to_owned()),
    created_at: created,
    updated_at: created,
  }
}

// ─── Round trips ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn append_and_find_by_token() {
  let s = store().await;
  let request = sample_request("tok-1", "carlos@example.cl");
  s.append(&request).await.unwrap();

  let found = s.find_by_token("tok-1").await.unwrap().unwrap();
  assert_eq!(found.id, request.id);
  assert_eq!(found.number, request.number);
  assert_eq!(found.status, RequestStatus::Pending);
  assert_eq!(found.categories, request.categories);
  assert_eq!(found.validation_token_expiry, request.validation_token_expiry);
  assert_eq!(found.phone.as_deref(), Some("+56 9 8765 4321"));
  assert!(!found.identity_validated);
}

#[tokio::test]
async fn find_by_token_missing_returns_none() {
  let s = store().await;
  assert!(s.find_by_token("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_token_is_rejected() {
  let s = store().await;
  s.append(&sample_request("tok-1", "a@example.cl")).await.unwrap();

  let err = s.append(&sample_request("tok-1", "b@example.cl")).await;
  assert!(err.is_err(), "UNIQUE constraint on validation_token");
}

#[tokio::test]
async fn find_by_email_is_case_insensitive() {
  let s = store().await;
  s.append(&sample_request("tok-1", "carlos@example.cl")).await.unwrap();
  s.append(&sample_request("tok-2", "carlos@example.cl")).await.unwrap();
  s.append(&sample_request("tok-3", "otra@example.cl")).await.unwrap();

  let found = s.find_by_email("Carlos@Example.CL").await.unwrap();
  assert_eq!(found.len(), 2);
  assert!(found.iter().all(|r| r.email == "carlos@example.cl"));
}

#[tokio::test]
async fn list_all_preserves_insertion_order() {
  let s = store().await;
  s.append(&sample_request("tok-1", "a@example.cl")).await.unwrap();
  s.append(&sample_request("tok-2", "b@example.cl")).await.unwrap();

  let all = s.list_all().await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].validation_token, "tok-1");
  assert_eq!(all[1].validation_token, "tok-2");
}

// ─── Partial updates ─────────────────────────────────────────────────────────

#[tokio::test]
async fn update_fields_stamps_updated_at() {
  let s = store().await;
  let request = sample_request("tok-1", "a@example.cl");
  s.append(&request).await.unwrap();

  let later = Utc.with_ymd_and_hms(2025, 1, 6, 10, 15, 0).unwrap();
  let patch = RequestPatch {
    assigned_to: Some("ana@example.cl".to_owned()),
    ..Default::default()
  };
  assert!(s.update_fields("tok-1", patch, later).await.unwrap());

  let found = s.find_by_token("tok-1").await.unwrap().unwrap();
  assert_eq!(found.assigned_to.as_deref(), Some("ana@example.cl"));
  assert_eq!(found.updated_at, later);
  // Untouched fields survive.
  assert_eq!(found.status, RequestStatus::Pending);
}

#[tokio::test]
async fn update_fields_unknown_token_returns_false() {
  let s = store().await;
  let patch = RequestPatch::default();
  assert!(!s.update_fields("nope", patch, Utc::now()).await.unwrap());
}

#[tokio::test]
async fn conditional_update_swaps_only_from_expected_status() {
  let s = store().await;
  s.append(&sample_request("tok-1", "a@example.cl")).await.unwrap();
  let now = Utc.with_ymd_and_hms(2025, 1, 6, 10, 5, 0).unwrap();

  let patch = RequestPatch {
    status:             Some(RequestStatus::Validated),
    identity_validated: Some(true),
    ..Default::default()
  };

  // First swap from PENDING wins.
  assert!(
    s.update_fields_if_status("tok-1", RequestStatus::Pending, patch.clone(), now)
      .await
      .unwrap()
  );

  // Second swap expects PENDING but the row moved on.
  assert!(
    !s.update_fields_if_status("tok-1", RequestStatus::Pending, patch, now)
      .await
      .unwrap()
  );

  let found = s.find_by_token("tok-1").await.unwrap().unwrap();
  assert_eq!(found.status, RequestStatus::Validated);
  assert!(found.identity_validated);
}

#[tokio::test]
async fn resolution_fields_round_trip() {
  let s = store().await;
  s.append(&sample_request("tok-1", "a@example.cl")).await.unwrap();

  let now = Utc.with_ymd_and_hms(2025, 1, 20, 9, 0, 0).unwrap();
  let patch = RequestPatch {
    status:              Some(RequestStatus::Resolved),
    resolved_at:         Some(now),
    download_url:        Some("https://files.example.cl/x.pdf".to_owned()),
    download_url_expiry: Some(now + chrono::Duration::hours(48)),
    ..Default::default()
  };
  assert!(s.update_fields("tok-1", patch, now).await.unwrap());

  let found = s.find_by_token("tok-1").await.unwrap().unwrap();
  assert_eq!(found.status, RequestStatus::Resolved);
  assert_eq!(found.resolved_at, Some(now));
  assert_eq!(
    found.download_url.as_deref(),
    Some("https://files.example.cl/x.pdf")
  );
  assert_eq!(
    found.download_url_expiry,
    Some(now + chrono::Duration::hours(48))
  );
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn aggregate_counts_by_status_kind_and_format() {
  let s = store().await;

  let mut a = sample_request("tok-1", "a@example.cl");
  a.preferred_format = PreferredFormat::Csv;
  s.append(&a).await.unwrap();

  let mut b = sample_request("tok-2", "b@example.cl");
  b.status = RequestStatus::Validated;
  s.append(&b).await.unwrap();

  s.append(&sample_request("tok-3", "c@example.cl")).await.unwrap();

  let stats = s.aggregate_counts().await.unwrap();
  assert_eq!(stats.total, 3);
  assert_eq!(stats.by_status.get("PENDING"), Some(&2));
  assert_eq!(stats.by_status.get("VALIDATED"), Some(&1));
  assert_eq!(stats.by_kind.get("ACCESS"), Some(&3));
  assert_eq!(stats.by_format.get("CSV"), Some(&1));
  assert_eq!(stats.by_format.get("PDF"), Some(&2));
}

#[tokio::test]
async fn aggregate_counts_on_empty_store() {
  let s = store().await;
  let stats = s.aggregate_counts().await.unwrap();
  assert_eq!(stats.total, 0);
  assert!(stats.by_status.is_empty());
}

// ─── Audit log ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn logs_append_and_list_in_order() {
  let s = store().await;
  let at = Utc.with_ymd_and_hms(2025, 1, 6, 10, 0, 0).unwrap();

  s.append_log(&LogEntry::new(
    LogAction::RequestCreated,
    "SOL-2025-00001",
    "kind ACCESS scope ALL",
    "portal",
    at,
  ))
  .await
  .unwrap();
  s.append_log(&LogEntry::new(
    LogAction::IdentityValidated,
    "SOL-2025-00001",
    "identity confirmed",
    "portal",
    at + chrono::Duration::minutes(5),
  ))
  .await
  .unwrap();

  let logs = s.list_logs().await.unwrap();
  assert_eq!(logs.len(), 2);
  assert_eq!(logs[0].action, LogAction::RequestCreated);
  assert_eq!(logs[1].action, LogAction::IdentityValidated);
  assert_eq!(logs[1].reference, "SOL-2025-00001");
  assert_eq!(logs[1].timestamp, at + chrono::Duration::minutes(5));
}
