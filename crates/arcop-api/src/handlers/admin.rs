//! Handlers for the `/admin` surface (HTTP Basic auth).
//!
//! These drive the administrative lifecycle transitions the public portal
//! never touches: assign, progress, resolve, close, reject, plus the expiry
//! sweep and reporting reads. The authenticated admin username is recorded
//! as the acting user in the audit trail.

use axum::{
  Json,
  extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use arcop_core::{
  notify::Notifier,
  request::Request,
  store::{RequestStats, RequestStore},
};

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /admin/requests`
pub async fn list_all<S, N>(
  _auth: Authenticated,
  State(state): State<AppState<S, N>>,
) -> Result<Json<Vec<Request>>, ApiError>
where
  S: RequestStore + Clone + 'static,
  N: Notifier + 'static,
{
  let requests = state
    .store
    .list_all()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(requests))
}

/// `GET /admin/stats`
pub async fn stats<S, N>(
  _auth: Authenticated,
  State(state): State<AppState<S, N>>,
) -> Result<Json<RequestStats>, ApiError>
where
  S: RequestStore + Clone + 'static,
  N: Notifier + 'static,
{
  let stats = state
    .store
    .aggregate_counts()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(stats))
}

/// `GET /admin/requests/due-soon` — non-terminal requests whose response
/// deadline falls inside the configured alert window.
pub async fn due_soon<S, N>(
  _auth: Authenticated,
  State(state): State<AppState<S, N>>,
) -> Result<Json<Vec<Request>>, ApiError>
where
  S: RequestStore + Clone + 'static,
  N: Notifier + 'static,
{
  let due = state.portal.due_soon().await?;
  Ok(Json(due))
}

// ─── Transitions ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AssignBody {
  pub assignee: String,
}

/// `POST /admin/requests/:token/assign` — body: `{"assignee":"..."}`
pub async fn assign<S, N>(
  _auth: Authenticated,
  State(state): State<AppState<S, N>>,
  Path(token): Path<String>,
  Json(body): Json<AssignBody>,
) -> Result<Json<Request>, ApiError>
where
  S: RequestStore + Clone + 'static,
  N: Notifier + 'static,
{
  let updated = state
    .portal
    .assign(&token, &body.assignee, &state.auth.username)
    .await?;
  Ok(Json(updated))
}

/// `POST /admin/requests/:token/progress`
pub async fn progress<S, N>(
  _auth: Authenticated,
  State(state): State<AppState<S, N>>,
  Path(token): Path<String>,
) -> Result<Json<Request>, ApiError>
where
  S: RequestStore + Clone + 'static,
  N: Notifier + 'static,
{
  let updated = state
    .portal
    .begin_processing(&token, &state.auth.username)
    .await?;
  Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
  pub download_url: String,
}

/// `POST /admin/requests/:token/resolve` — body: `{"download_url":"..."}`.
/// Emails the download link to the requester.
pub async fn resolve<S, N>(
  _auth: Authenticated,
  State(state): State<AppState<S, N>>,
  Path(token): Path<String>,
  Json(body): Json<ResolveBody>,
) -> Result<Json<Request>, ApiError>
where
  S: RequestStore + Clone + 'static,
  N: Notifier + 'static,
{
  let updated = state
    .portal
    .resolve(&token, &body.download_url, &state.auth.username)
    .await?;
  Ok(Json(updated))
}

/// `POST /admin/requests/:token/close`
pub async fn close<S, N>(
  _auth: Authenticated,
  State(state): State<AppState<S, N>>,
  Path(token): Path<String>,
) -> Result<Json<Request>, ApiError>
where
  S: RequestStore + Clone + 'static,
  N: Notifier + 'static,
{
  let updated = state.portal.close(&token, &state.auth.username).await?;
  Ok(Json(updated))
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
  pub reason: Option<String>,
}

/// `POST /admin/requests/:token/reject` — body: `{"reason":"..."}` (optional).
pub async fn reject<S, N>(
  _auth: Authenticated,
  State(state): State<AppState<S, N>>,
  Path(token): Path<String>,
  Json(body): Json<RejectBody>,
) -> Result<Json<Request>, ApiError>
where
  S: RequestStore + Clone + 'static,
  N: Notifier + 'static,
{
  let updated = state
    .portal
    .reject(&token, body.reason.as_deref(), &state.auth.username)
    .await?;
  Ok(Json(updated))
}

// ─── Sweeps ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SweepOutcome {
  pub expired: usize,
}

/// `POST /admin/requests/expire-sweep` — expire everything past deadline.
pub async fn expire_sweep<S, N>(
  _auth: Authenticated,
  State(state): State<AppState<S, N>>,
) -> Result<Json<SweepOutcome>, ApiError>
where
  S: RequestStore + Clone + 'static,
  N: Notifier + 'static,
{
  let expired = state.portal.expire_overdue().await?;
  Ok(Json(SweepOutcome { expired }))
}
