//! SMTP implementation of the portal's [`Notifier`] seam.
//!
//! [`SmtpNotifier`] wraps the `lettre` async SMTP transport and renders the
//! three portal emails (confirmation link, identity confirmed, data ready)
//! from the templates in [`templates`]. For development without an SMTP
//! server, [`TracingNotifier`] logs what would have been sent instead.

pub mod templates;

use arcop_core::{
  config::PortalConfig,
  notify::Notifier,
  request::Request,
};
use lettre::{
  AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
  message::{Mailbox, header::ContentType},
  transport::smtp::authentication::Credentials,
};
use serde::Deserialize;
use thiserror::Error;

// ─── Error ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum Error {
  /// SMTP transport-level failure (connection, authentication, ...).
  #[error("smtp transport error: {0}")]
  Transport(#[from] lettre::transport::smtp::Error),

  /// A sender or recipient address could not be parsed.
  #[error("email address parse error: {0}")]
  Address(#[from] lettre::address::AddressError),

  /// The MIME message could not be assembled.
  #[error("email build error: {0}")]
  Build(#[from] lettre::error::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Configuration ───────────────────────────────────────────────────────────

const DEFAULT_SMTP_PORT: u16 = 587;

fn default_smtp_port() -> u16 {
  DEFAULT_SMTP_PORT
}

/// SMTP connection settings, deserialised from the `[smtp]` config section.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpSettings {
  pub host:         String,
  #[serde(default = "default_smtp_port")]
  pub port:         u16,
  /// RFC 5322 "From" address, e.g. `Portal ARCOP <no-reply@example.cl>`.
  pub from_address: String,
  pub username:     Option<String>,
  pub password:     Option<String>,
}

// ─── SMTP notifier ───────────────────────────────────────────────────────────

/// Sends the portal emails over STARTTLS SMTP.
pub struct SmtpNotifier {
  transport: AsyncSmtpTransport<Tokio1Executor>,
  from:      Mailbox,
  portal:    PortalConfig,
}

impl SmtpNotifier {
  pub fn new(settings: &SmtpSettings, portal: PortalConfig) -> Result<Self> {
    let mut builder =
      AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
        .port(settings.port);

    if let (Some(user), Some(password)) =
      (settings.username.clone(), settings.password.clone())
    {
      builder = builder.credentials(Credentials::new(user, password));
    }

    Ok(SmtpNotifier {
      transport: builder.build(),
      from:      settings.from_address.parse()?,
      portal,
    })
  }

  async fn send_html(
    &self,
    to: &str,
    subject: &str,
    html: String,
  ) -> Result<()> {
    let message = Message::builder()
      .from(self.from.clone())
      .to(to.parse()?)
      .subject(subject)
      .header(ContentType::TEXT_HTML)
      .body(html)?;

    self.transport.send(message).await?;
    tracing::debug!(to, subject, "email sent");
    Ok(())
  }
}

impl Notifier for SmtpNotifier {
  type Error = Error;

  async fn send_confirmation(&self, request: &Request) -> Result<()> {
    self
      .send_html(
        &request.email,
        "Portal ARCOP - Confirme su solicitud de acceso a datos",
        templates::confirmation_html(request, &self.portal),
      )
      .await
  }

  async fn send_identity_confirmed(&self, request: &Request) -> Result<()> {
    self
      .send_html(
        &request.email,
        "Portal ARCOP - Identidad confirmada",
        templates::identity_confirmed_html(request, &self.portal),
      )
      .await
  }

  async fn send_data_ready(
    &self,
    request: &Request,
    download_url: &str,
  ) -> Result<()> {
    self
      .send_html(
        &request.email,
        "Portal ARCOP - Sus datos personales",
        templates::data_ready_html(request, download_url, &self.portal),
      )
      .await
  }
}

// ─── Tracing notifier ────────────────────────────────────────────────────────

/// Development stand-in: logs each notification instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  type Error = std::convert::Infallible;

  async fn send_confirmation(
    &self,
    request: &Request,
  ) -> std::result::Result<(), Self::Error> {
    tracing::info!(
      number = %request.number,
      email = %request.email,
      token = %request.validation_token,
      "confirmation email suppressed (no smtp configured)"
    );
    Ok(())
  }

  async fn send_identity_confirmed(
    &self,
    request: &Request,
  ) -> std::result::Result<(), Self::Error> {
    tracing::info!(
      number = %request.number,
      email = %request.email,
      "identity-confirmed email suppressed (no smtp configured)"
    );
    Ok(())
  }

  async fn send_data_ready(
    &self,
    request: &Request,
    download_url: &str,
  ) -> std::result::Result<(), Self::Error> {
    tracing::info!(
      number = %request.number,
      email = %request.email,
      download_url,
      "data-ready email suppressed (no smtp configured)"
    );
    Ok(())
  }
}
