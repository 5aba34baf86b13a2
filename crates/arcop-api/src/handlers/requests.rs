//! Handlers for the public `/requests` surface.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/requests` | Body: the intake form; 201 + receipt, 422 on bad input |
//! | `GET`  | `/requests?email=` | Summaries for an email, case-insensitive |
//! | `GET`  | `/requests/:token` | Single non-sensitive summary |
//! | `POST` | `/requests/:token/validate` | Confirm identity via the emailed link |
//!
//! Every response is a real acknowledgment of what the server did — the
//! intake form can rely on the status code instead of firing and forgetting.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use serde::Deserialize;

use arcop_core::{
  notify::Notifier,
  request::{NewRequest, RequestMeta, RequestSummary},
  store::RequestStore,
};

use crate::{AppState, error::ApiError};

/// Pull the audit metadata out of the transport headers.
fn request_meta(headers: &HeaderMap) -> RequestMeta {
  let origin_ip = headers
    .get("x-forwarded-for")
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split(',').next())
    .map(|v| v.trim().to_owned());
  let user_agent = headers
    .get(header::USER_AGENT)
    .and_then(|v| v.to_str().ok())
    .map(str::to_owned);
  RequestMeta { origin_ip, user_agent }
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /requests` — file a new request.
pub async fn create<S, N>(
  State(state): State<AppState<S, N>>,
  headers: HeaderMap,
  Json(draft): Json<NewRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RequestStore + Clone + 'static,
  N: Notifier + 'static,
{
  let meta = request_meta(&headers);
  let receipt = state.portal.create_request(draft, meta).await?;
  Ok((StatusCode::CREATED, Json(receipt)))
}

// ─── Validate identity ───────────────────────────────────────────────────────

/// `POST /requests/:token/validate` — confirm control of the email address.
pub async fn validate<S, N>(
  State(state): State<AppState<S, N>>,
  Path(token): Path<String>,
) -> Result<Json<RequestSummary>, ApiError>
where
  S: RequestStore + Clone + 'static,
  N: Notifier + 'static,
{
  let summary = state.portal.validate_identity(&token).await?;
  Ok(Json(summary))
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// `GET /requests/:token`
pub async fn get_one<S, N>(
  State(state): State<AppState<S, N>>,
  Path(token): Path<String>,
) -> Result<Json<RequestSummary>, ApiError>
where
  S: RequestStore + Clone + 'static,
  N: Notifier + 'static,
{
  let request = state
    .store
    .find_by_token(&token)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound("no request matches the supplied token".to_owned())
    })?;
  Ok(Json(RequestSummary::of(&request)))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub email: String,
}

/// `GET /requests?email=<address>`
pub async fn list_by_email<S, N>(
  State(state): State<AppState<S, N>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<RequestSummary>>, ApiError>
where
  S: RequestStore + Clone + 'static,
  N: Notifier + 'static,
{
  let requests = state
    .store
    .find_by_email(&params.email)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(requests.iter().map(RequestSummary::of).collect()))
}
