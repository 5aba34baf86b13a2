//! Router tests: the public and admin surfaces driven through
//! `tower::ServiceExt::oneshot` against an in-memory SQLite store.

use std::sync::{Arc, Mutex};

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Router,
  body::Body,
  http::{Request as HttpRequest, StatusCode, header},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use arcop_core::{notify::Notifier, request::Request};
use arcop_store_sqlite::SqliteStore;

use crate::{AppState, ServerConfig, api_router};

const ADMIN_USER: &str = "dpo";
const ADMIN_PASSWORD: &str = "hunter2";

// ─── Test notifier ───────────────────────────────────────────────────────────

/// Records the validation token of every confirmation it "sends".
#[derive(Clone, Default)]
struct CapturingNotifier {
  tokens: Arc<Mutex<Vec<String>>>,
}

impl CapturingNotifier {
  fn last_token(&self) -> String {
    self.tokens.lock().unwrap().last().cloned().expect("a confirmation")
  }
}

impl Notifier for CapturingNotifier {
  type Error = std::convert::Infallible;

  async fn send_confirmation(
    &self,
    request: &Request,
  ) -> Result<(), Self::Error> {
    self
      .tokens
      .lock()
      .unwrap()
      .push(request.validation_token.clone());
    Ok(())
  }

  async fn send_identity_confirmed(
    &self,
    _: &Request,
  ) -> Result<(), Self::Error> {
    Ok(())
  }

  async fn send_data_ready(
    &self,
    _: &Request,
    _: &str,
  ) -> Result<(), Self::Error> {
    Ok(())
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn server_config() -> ServerConfig {
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(ADMIN_PASSWORD.as_bytes(), &salt)
    .expect("argon2")
    .to_string();

  // Deserialise through serde so defaults apply exactly as in production.
  serde_json::from_value(json!({
    "host": "127.0.0.1",
    "port": 0,
    "store_path": ":memory:",
    "admin_username": ADMIN_USER,
    "admin_password_hash": hash,
    "portal": {
      "base_url": "https://portal.example.cl",
      "company": {
        "name": "Empresa XYZ SpA",
        "rut": "76.543.210-K",
        "dpo_email": "dpo@example.cl",
        "dpo_phone": "+56 2 2345 6789"
      }
    }
  }))
  .expect("server config")
}

async fn test_router() -> (Router, CapturingNotifier) {
  let store = SqliteStore::open_in_memory().await.expect("store");
  let notifier = CapturingNotifier::default();
  let state = AppState::new(store, notifier.clone(), &server_config());
  (api_router(state), notifier)
}

fn post_json(uri: &str, body: Value) -> HttpRequest<Body> {
  HttpRequest::builder()
    .method("POST")
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

fn get(uri: &str) -> HttpRequest<Body> {
  HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
}

fn basic_auth(user: &str, password: &str) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{password}")))
}

async fn body_json(response: axum::response::Response) -> Value {
  let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
    .await
    .unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

fn intake_form() -> Value {
  json!({
    "full_name": "Carlos Jerez",
    "rut": "12.345.678-5",
    "email": "Carlos@Example.CL",
    "phone": "+56 9 8765 4321",
    "scope": "SPECIFIC",
    "categories": ["contact"],
    "preferred_format": "PDF",
    "terms_accepted": true
  })
}

// ─── Public surface ──────────────────────────────────────────────────────────

#[tokio::test]
async fn create_request_returns_receipt() {
  let (app, _) = test_router().await;

  let response = app.oneshot(post_json("/requests", intake_form())).await.unwrap();
  assert_eq!(response.status(), StatusCode::CREATED);

  let receipt = body_json(response).await;
  assert_eq!(receipt["status"], "PENDING");
  assert_eq!(receipt["email"], "carlos@example.cl");
  assert!(
    receipt["number"].as_str().unwrap().starts_with("SOL-"),
    "got {receipt}"
  );
  assert!(receipt["response_deadline"].is_string());
}

#[tokio::test]
async fn create_with_missing_categories_is_unprocessable() {
  let (app, _) = test_router().await;

  let mut form = intake_form();
  form["categories"] = json!([]);

  let response = app.oneshot(post_json("/requests", form)).await.unwrap();
  assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

  let detail = body_json(response).await;
  assert_eq!(detail["failures"][0]["field"], "categories");
}

#[tokio::test]
async fn validate_identity_round_trip() {
  let (app, notifier) = test_router().await;

  app
    .clone()
    .oneshot(post_json("/requests", intake_form()))
    .await
    .unwrap();
  let token = notifier.last_token();

  let response = app
    .clone()
    .oneshot(post_json(&format!("/requests/{token}/validate"), json!({})))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  let summary = body_json(response).await;
  assert_eq!(summary["status"], "VALIDATED");
  assert_eq!(summary["identity_validated"], true);

  // Second click on the same link: conflict, not a second transition.
  let response = app
    .oneshot(post_json(&format!("/requests/{token}/validate"), json!({})))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn validate_unknown_token_is_not_found() {
  let (app, _) = test_router().await;
  let response = app
    .oneshot(post_json("/requests/bogus/validate", json!({})))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn summary_by_token_and_email() {
  let (app, notifier) = test_router().await;
  app
    .clone()
    .oneshot(post_json("/requests", intake_form()))
    .await
    .unwrap();
  let token = notifier.last_token();

  let response =
    app.clone().oneshot(get(&format!("/requests/{token}"))).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  let summary = body_json(response).await;
  assert_eq!(summary["rut"], "12.345.678-5");
  // The token itself is never echoed back.
  assert!(summary.get("validation_token").is_none());

  let response = app
    .oneshot(get("/requests?email=CARLOS@example.cl"))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  let list = body_json(response).await;
  assert_eq!(list.as_array().unwrap().len(), 1);
}

// ─── Admin surface ───────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_requires_credentials() {
  let (app, _) = test_router().await;

  let response = app.clone().oneshot(get("/admin/requests")).await.unwrap();
  assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
  assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

  let bad = HttpRequest::builder()
    .uri("/admin/requests")
    .header(header::AUTHORIZATION, basic_auth(ADMIN_USER, "wrong"))
    .body(Body::empty())
    .unwrap();
  let response = app.oneshot(bad).await.unwrap();
  assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_stats_with_credentials() {
  let (app, _) = test_router().await;
  app
    .clone()
    .oneshot(post_json("/requests", intake_form()))
    .await
    .unwrap();

  let request = HttpRequest::builder()
    .uri("/admin/stats")
    .header(header::AUTHORIZATION, basic_auth(ADMIN_USER, ADMIN_PASSWORD))
    .body(Body::empty())
    .unwrap();
  let response = app.oneshot(request).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);

  let stats = body_json(response).await;
  assert_eq!(stats["total"], 1);
  assert_eq!(stats["by_status"]["PENDING"], 1);
}

#[tokio::test]
async fn admin_assign_records_actor() {
  let (app, notifier) = test_router().await;
  app
    .clone()
    .oneshot(post_json("/requests", intake_form()))
    .await
    .unwrap();
  let token = notifier.last_token();
  app
    .clone()
    .oneshot(post_json(&format!("/requests/{token}/validate"), json!({})))
    .await
    .unwrap();

  let request = HttpRequest::builder()
    .method("POST")
    .uri(format!("/admin/requests/{token}/assign"))
    .header(header::AUTHORIZATION, basic_auth(ADMIN_USER, ADMIN_PASSWORD))
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(json!({ "assignee": "ana@example.cl" }).to_string()))
    .unwrap();
  let response = app.oneshot(request).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);

  let updated = body_json(response).await;
  assert_eq!(updated["status"], "ASSIGNED");
  assert_eq!(updated["assigned_to"], "ana@example.cl");
}
