//! Immutable domain configuration.
//!
//! Shared constants (deadlines, company identity, the public base URL the
//! validation links point at) are a plain value handed to the engine and
//! notifier at construction — never process-wide mutable state.

use serde::Deserialize;

/// Statutory and operational time limits.
#[derive(Debug, Clone, Deserialize)]
pub struct DeadlinePolicy {
  /// Business days allowed for answering a request.
  #[serde(default = "default_response_business_days")]
  pub response_business_days: u32,
  /// Validity window of the emailed validation link.
  #[serde(default = "default_token_ttl_minutes")]
  pub token_ttl_minutes: i64,
  /// Validity window of the data download link.
  #[serde(default = "default_download_link_ttl_hours")]
  pub download_link_ttl_hours: i64,
  /// How close to the response deadline a request counts as due soon.
  #[serde(default = "default_expiry_alert_days")]
  pub expiry_alert_days: i64,
}

fn default_response_business_days() -> u32 {
  15
}
fn default_token_ttl_minutes() -> i64 {
  30
}
fn default_download_link_ttl_hours() -> i64 {
  48
}
fn default_expiry_alert_days() -> i64 {
  3
}

impl Default for DeadlinePolicy {
  fn default() -> Self {
    DeadlinePolicy {
      response_business_days:  default_response_business_days(),
      token_ttl_minutes:       default_token_ttl_minutes(),
      download_link_ttl_hours: default_download_link_ttl_hours(),
      expiry_alert_days:       default_expiry_alert_days(),
    }
  }
}

/// Identity of the data controller, shown in every notification footer.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyInfo {
  pub name:      String,
  pub rut:       String,
  pub dpo_email: String,
  pub dpo_phone: String,
}

/// The full domain configuration value.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
  /// Public URL the validation links are built against,
  /// e.g. `https://portal.example.cl`.
  pub base_url: String,
  pub company:  CompanyInfo,
  #[serde(default)]
  pub deadlines: DeadlinePolicy,
}
