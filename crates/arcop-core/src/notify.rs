//! The `Notifier` trait — the engine's outbound email seam.
//!
//! Implemented by `arcop-mailer` over SMTP; tests substitute a recording
//! notifier. Transport failures surface through the associated error type
//! and abort the running command (the engine never retries silently).

use std::future::Future;

use crate::request::Request;

pub trait Notifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Deliver the validation-link email for a freshly created request.
  fn send_confirmation<'a>(
    &'a self,
    request: &'a Request,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Tell the requester their identity was confirmed.
  fn send_identity_confirmed<'a>(
    &'a self,
    request: &'a Request,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Deliver the download link once the request is resolved.
  fn send_data_ready<'a>(
    &'a self,
    request: &'a Request,
    download_url: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
