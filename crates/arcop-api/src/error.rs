//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use arcop_core::validate::ValidationFailures;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("validation failed")]
  Validation(ValidationFailures),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("gone: {0}")]
  Gone(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("delivery error: {0}")]
  Delivery(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<arcop_core::Error> for ApiError {
  fn from(e: arcop_core::Error) -> Self {
    use arcop_core::Error as Core;
    match e {
      Core::Validation(failures) => ApiError::Validation(failures),
      Core::NotFound => {
        ApiError::NotFound("no request matches the supplied token".to_owned())
      }
      Core::TokenExpired { expired_at } => {
        ApiError::Gone(format!("validation token expired at {expired_at}"))
      }
      Core::AlreadyValidated { number } => {
        ApiError::Conflict(format!("identity already validated for {number}"))
      }
      Core::InvalidTransition { from, to } => {
        ApiError::Conflict(format!("invalid transition: {from} -> {to}"))
      }
      Core::StoreUnavailable(source) => ApiError::Store(source),
      Core::DeliveryFailed(source) => ApiError::Delivery(source),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Unauthorized => {
        let mut res =
          (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"arcop\""),
        );
        res
      }
      ApiError::Validation(failures) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
          "error": "validation failed",
          "failures": failures.failures,
        })),
      )
        .into_response(),
      ApiError::NotFound(msg) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": msg })))
          .into_response()
      }
      ApiError::Gone(msg) => {
        (StatusCode::GONE, Json(json!({ "error": msg }))).into_response()
      }
      ApiError::Conflict(msg) => {
        (StatusCode::CONFLICT, Json(json!({ "error": msg }))).into_response()
      }
      ApiError::BadRequest(msg) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": msg })))
          .into_response()
      }
      ApiError::Store(e) => (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": e.to_string() })),
      )
        .into_response(),
      ApiError::Delivery(e) => (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "error": e.to_string() })),
      )
        .into_response(),
    }
  }
}
