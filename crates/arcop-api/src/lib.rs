//! JSON REST API for the ARCOP request portal.
//!
//! Exposes an axum [`Router`] backed by any [`RequestStore`] and
//! [`Notifier`]. The public surface is the two-command boundary consumed by
//! the intake form (create request, validate identity) plus the read-only
//! token/email queries; the `/admin` surface drives the administrative
//! lifecycle transitions behind HTTP Basic auth.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", arcop_api::api_router(state))
//! ```

pub mod auth;
pub mod error;
pub mod handlers;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;

use arcop_core::{
  clock::SystemClock,
  config::PortalConfig,
  engine::Portal,
  notify::Notifier,
  store::RequestStore,
};
use arcop_mailer::SmtpSettings;

use auth::AuthConfig;
use handlers::{admin, requests};

pub use error::ApiError;

#[cfg(test)]
mod tests;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub admin_username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub admin_password_hash: String,
  pub portal:              PortalConfig,
  /// Absent means no SMTP transport: notifications are logged instead.
  #[serde(default)]
  pub smtp:                Option<SmtpSettings>,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, N> {
  pub portal: Arc<Portal<S, N, SystemClock>>,
  pub store:  Arc<S>,
  pub auth:   Arc<AuthConfig>,
  pub config: Arc<PortalConfig>,
}

impl<S, N> Clone for AppState<S, N> {
  fn clone(&self) -> Self {
    AppState {
      portal: self.portal.clone(),
      store:  self.store.clone(),
      auth:   self.auth.clone(),
      config: self.config.clone(),
    }
  }
}

impl<S, N> AppState<S, N>
where
  S: RequestStore + Clone,
  N: Notifier,
{
  pub fn new(store: S, notifier: N, config: &ServerConfig) -> Self {
    let portal = Portal::new(
      store.clone(),
      notifier,
      SystemClock,
      config.portal.clone(),
    );
    AppState {
      portal: Arc::new(portal),
      store:  Arc::new(store),
      auth:   Arc::new(AuthConfig {
        username:      config.admin_username.clone(),
        password_hash: config.admin_password_hash.clone(),
      }),
      config: Arc::new(config.portal.clone()),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for the given state.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N>(state: AppState<S, N>) -> Router<()>
where
  S: RequestStore + Clone + 'static,
  N: Notifier + 'static,
{
  Router::new()
    // Public surface
    .route(
      "/requests",
      post(requests::create::<S, N>).get(requests::list_by_email::<S, N>),
    )
    .route("/requests/{token}", get(requests::get_one::<S, N>))
    .route(
      "/requests/{token}/validate",
      post(requests::validate::<S, N>),
    )
    // Administrative surface (Basic auth)
    .route("/admin/requests", get(admin::list_all::<S, N>))
    .route("/admin/requests/due-soon", get(admin::due_soon::<S, N>))
    .route(
      "/admin/requests/expire-sweep",
      post(admin::expire_sweep::<S, N>),
    )
    .route("/admin/requests/{token}/assign", post(admin::assign::<S, N>))
    .route(
      "/admin/requests/{token}/progress",
      post(admin::progress::<S, N>),
    )
    .route(
      "/admin/requests/{token}/resolve",
      post(admin::resolve::<S, N>),
    )
    .route("/admin/requests/{token}/close", post(admin::close::<S, N>))
    .route("/admin/requests/{token}/reject", post(admin::reject::<S, N>))
    .route("/admin/stats", get(admin::stats::<S, N>))
    .with_state(state)
}
