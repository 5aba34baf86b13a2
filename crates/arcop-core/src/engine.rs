//! The request lifecycle engine.
//!
//! [`Portal`] owns every state transition: it is the sole writer of
//! `status`, `identity_validated`, `assigned_to` and the resolution fields.
//! The store and notifier are injected seams; the clock is sampled exactly
//! once per command. Transitions are all-or-nothing — a failed precondition
//! mutates nothing.
//!
//! Concurrency: per-request mutations are serialised through the store's
//! compare-and-swap primitive
//! ([`RequestStore::update_fields_if_status`]). Two concurrent
//! `validate_identity` calls against the same token race on the swap; the
//! loser re-reads and reports [`Error::AlreadyValidated`] instead of
//! double-counting the transition.

use chrono::{DateTime, Datelike, Duration, Utc};
use uuid::Uuid;

use crate::{
  audit::{LogAction, LogEntry},
  clock::{Clock, SystemClock},
  config::PortalConfig,
  deadline,
  error::{Error, Result},
  lifecycle::RequestStatus,
  notify::Notifier,
  request::{
    AccessScope, CreateReceipt, NewRequest, PreferredFormat, Request,
    RequestMeta, RequestSummary,
  },
  rut,
  store::{RequestPatch, RequestStore},
  validate,
};

/// Actor recorded for operations triggered from the public surface.
const PORTAL_ACTOR: &str = "portal";
/// Actor recorded for automatic operations (expiry sweeps).
const SYSTEM_ACTOR: &str = "system";

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The lifecycle engine, generic over its store, notifier and clock.
pub struct Portal<S, N, C = SystemClock> {
  store:    S,
  notifier: N,
  clock:    C,
  config:   PortalConfig,
}

impl<S, N, C> Portal<S, N, C>
where
  S: RequestStore,
  N: Notifier,
  C: Clock,
{
  pub fn new(store: S, notifier: N, clock: C, config: PortalConfig) -> Self {
    Portal { store, notifier, clock, config }
  }

  pub fn config(&self) -> &PortalConfig {
    &self.config
  }

  fn store_err(e: S::Error) -> Error {
    Error::StoreUnavailable(Box::new(e))
  }

  fn delivery_err(e: N::Error) -> Error {
    Error::DeliveryFailed(Box::new(e))
  }

  /// Append an audit record; a failed append is logged and swallowed so it
  /// never rolls back an already-committed transition.
  async fn log_quietly(&self, entry: LogEntry) {
    if let Err(e) = self.store.append_log(&entry).await {
      tracing::warn!(error = %e, action = entry.action.as_str(), "audit log append failed");
    }
  }

  // ── Create ────────────────────────────────────────────────────────────

  /// Validate, persist and confirm a new request.
  ///
  /// On a notifier failure the request remains persisted in `PENDING` with
  /// its token intact, so the confirmation can be re-sent manually.
  pub async fn create_request(
    &self,
    draft: NewRequest,
    meta: RequestMeta,
  ) -> Result<CreateReceipt> {
    validate::validate(&draft).map_err(Error::Validation)?;

    let now = self.clock.now();
    let request = self.assemble(draft, meta, now);

    self.store.append(&request).await.map_err(Self::store_err)?;
    self
      .log_quietly(LogEntry::new(
        LogAction::RequestCreated,
        &request.number,
        format!("kind {} scope {}", request.kind.as_str(), request.scope.as_str()),
        PORTAL_ACTOR,
        now,
      ))
      .await;

    self
      .notifier
      .send_confirmation(&request)
      .await
      .map_err(Self::delivery_err)?;
    self
      .log_quietly(LogEntry::new(
        LogAction::ConfirmationSent,
        &request.number,
        format!("confirmation sent to {}", request.email),
        PORTAL_ACTOR,
        now,
      ))
      .await;

    tracing::info!(number = %request.number, "request created");
    Ok(CreateReceipt::of(&request))
  }

  /// Build the full entity from a validated draft.
  fn assemble(
    &self,
    draft: NewRequest,
    meta: RequestMeta,
    now: DateTime<Utc>,
  ) -> Request {
    let policy = &self.config.deadlines;
    // Presence of scope and preferred_format is guaranteed by validation.
    let scope = draft.scope.unwrap_or(AccessScope::All);
    let preferred_format =
      draft.preferred_format.unwrap_or(PreferredFormat::Pdf);
    let categories = match scope {
      AccessScope::All => Vec::new(),
      AccessScope::Specific => draft.categories,
    };
    let phone = draft
      .phone
      .map(|p| p.trim().to_owned())
      .filter(|p| !p.is_empty());

    Request {
      id: Uuid::new_v4(),
      number: generate_number(now),
      submitted_at: now,
      kind: draft.kind,
      status: RequestStatus::Pending,
      full_name: draft.full_name.trim().to_owned(),
      rut: rut::format(&draft.rut),
      email: draft.email.trim().to_lowercase(),
      phone,
      scope,
      categories,
      preferred_format,
      identity_validated: false,
      validation_token: generate_token(),
      validation_token_expiry: deadline::fixed_offset_from(
        now,
        policy.token_ttl_minutes,
      ),
      response_deadline: deadline::business_days_from(
        now,
        policy.response_business_days,
      ),
      days_remaining: i64::from(policy.response_business_days),
      assigned_to: None,
      resolved_at: None,
      download_url: None,
      download_url_expiry: None,
      origin_ip: meta.origin_ip,
      user_agent: meta.user_agent,
      created_at: now,
      updated_at: now,
    }
  }

  // ── Validate identity ─────────────────────────────────────────────────

  /// Confirm control of the requester's email address via the one-time
  /// token, transitioning `PENDING → VALIDATED` atomically.
  pub async fn validate_identity(&self, token: &str) -> Result<RequestSummary> {
    let now = self.clock.now();

    let current = self
      .store
      .find_by_token(token)
      .await
      .map_err(Self::store_err)?
      .ok_or(Error::NotFound)?;

    if current.identity_validated {
      return Err(Error::AlreadyValidated { number: current.number });
    }
    if !current.status.permits(RequestStatus::Validated) {
      return Err(Error::InvalidTransition {
        from: current.status,
        to:   RequestStatus::Validated,
      });
    }
    if now > current.validation_token_expiry {
      // The request keeps its state; the requester must file again.
      return Err(Error::TokenExpired {
        expired_at: current.validation_token_expiry,
      });
    }

    let patch = RequestPatch {
      status:             Some(RequestStatus::Validated),
      identity_validated: Some(true),
      ..Default::default()
    };
    let swapped = self
      .store
      .update_fields_if_status(token, current.status, patch.clone(), now)
      .await
      .map_err(Self::store_err)?;

    if !swapped {
      // Lost the race against a concurrent call (or an admin action).
      return match self
        .store
        .find_by_token(token)
        .await
        .map_err(Self::store_err)?
      {
        Some(r) if r.identity_validated => {
          Err(Error::AlreadyValidated { number: r.number })
        }
        _ => Err(Error::NotFound),
      };
    }

    let mut updated = current;
    patch.apply(&mut updated, now);

    self
      .log_quietly(LogEntry::new(
        LogAction::IdentityValidated,
        &updated.number,
        format!("identity confirmed for {}", updated.email),
        PORTAL_ACTOR,
        now,
      ))
      .await;

    self
      .notifier
      .send_identity_confirmed(&updated)
      .await
      .map_err(Self::delivery_err)?;

    tracing::info!(number = %updated.number, "identity validated");
    Ok(RequestSummary::of(&updated))
  }

  // ── Administrative transitions ────────────────────────────────────────

  /// Shared compare-and-swap transition used by the administrative
  /// commands. `now` is the single sampled instant of the calling command.
  async fn transition(
    &self,
    token: &str,
    to: RequestStatus,
    mut patch: RequestPatch,
    now: DateTime<Utc>,
    action: LogAction,
    detail: String,
    actor: &str,
  ) -> Result<Request> {
    let current = self
      .store
      .find_by_token(token)
      .await
      .map_err(Self::store_err)?
      .ok_or(Error::NotFound)?;

    if !current.status.permits(to) {
      return Err(Error::InvalidTransition { from: current.status, to });
    }

    patch.status = Some(to);
    let swapped = self
      .store
      .update_fields_if_status(token, current.status, patch.clone(), now)
      .await
      .map_err(Self::store_err)?;

    if !swapped {
      let from = self
        .store
        .find_by_token(token)
        .await
        .map_err(Self::store_err)?
        .map(|r| r.status)
        .ok_or(Error::NotFound)?;
      return Err(Error::InvalidTransition { from, to });
    }

    let mut updated = current;
    patch.apply(&mut updated, now);

    self
      .log_quietly(LogEntry::new(action, &updated.number, detail, actor, now))
      .await;
    tracing::info!(number = %updated.number, status = to.as_str(), "request transitioned");
    Ok(updated)
  }

  /// `VALIDATED → ASSIGNED`.
  pub async fn assign(
    &self,
    token: &str,
    assignee: &str,
    actor: &str,
  ) -> Result<Request> {
    let now = self.clock.now();
    let patch = RequestPatch {
      assigned_to: Some(assignee.to_owned()),
      ..Default::default()
    };
    self
      .transition(
        token,
        RequestStatus::Assigned,
        patch,
        now,
        LogAction::Assigned,
        format!("assigned to {assignee}"),
        actor,
      )
      .await
  }

  /// `ASSIGNED → IN_PROGRESS`.
  pub async fn begin_processing(
    &self,
    token: &str,
    actor: &str,
  ) -> Result<Request> {
    let now = self.clock.now();
    self
      .transition(
        token,
        RequestStatus::InProgress,
        RequestPatch::default(),
        now,
        LogAction::ProcessingStarted,
        "processing started".to_owned(),
        actor,
      )
      .await
  }

  /// `IN_PROGRESS → RESOLVED`: stamp the resolution, attach the download
  /// link (valid for the configured number of hours) and email it to the
  /// requester.
  pub async fn resolve(
    &self,
    token: &str,
    download_url: &str,
    actor: &str,
  ) -> Result<Request> {
    let now = self.clock.now();
    let link_expiry = deadline::fixed_offset_from(
      now,
      self.config.deadlines.download_link_ttl_hours * 60,
    );
    let patch = RequestPatch {
      resolved_at:         Some(now),
      download_url:        Some(download_url.to_owned()),
      download_url_expiry: Some(link_expiry),
      ..Default::default()
    };
    let updated = self
      .transition(
        token,
        RequestStatus::Resolved,
        patch,
        now,
        LogAction::Resolved,
        "request resolved".to_owned(),
        actor,
      )
      .await?;

    self
      .notifier
      .send_data_ready(&updated, download_url)
      .await
      .map_err(Self::delivery_err)?;
    self
      .log_quietly(LogEntry::new(
        LogAction::DataReadySent,
        &updated.number,
        format!("download link sent to {}", updated.email),
        actor,
        now,
      ))
      .await;

    Ok(updated)
  }

  /// `RESOLVED → CLOSED`.
  pub async fn close(&self, token: &str, actor: &str) -> Result<Request> {
    let now = self.clock.now();
    self
      .transition(
        token,
        RequestStatus::Closed,
        RequestPatch::default(),
        now,
        LogAction::Closed,
        "request closed".to_owned(),
        actor,
      )
      .await
  }

  /// Any non-terminal state `→ REJECTED`.
  pub async fn reject(
    &self,
    token: &str,
    reason: Option<&str>,
    actor: &str,
  ) -> Result<Request> {
    let now = self.clock.now();
    let detail = match reason {
      Some(r) => format!("rejected: {r}"),
      None => "rejected".to_owned(),
    };
    self
      .transition(
        token,
        RequestStatus::Rejected,
        RequestPatch::default(),
        now,
        LogAction::Rejected,
        detail,
        actor,
      )
      .await
  }

  // ── Sweeps ────────────────────────────────────────────────────────────

  /// Expire every non-terminal request whose response deadline has passed.
  /// Returns how many requests transitioned.
  pub async fn expire_overdue(&self) -> Result<usize> {
    let now = self.clock.now();
    let mut expired = 0;

    for request in self.store.list_all().await.map_err(Self::store_err)? {
      if !request.is_overdue(now) {
        continue;
      }
      let swapped = self
        .store
        .update_fields_if_status(
          &request.validation_token,
          request.status,
          RequestPatch {
            status: Some(RequestStatus::Expired),
            ..Default::default()
          },
          now,
        )
        .await
        .map_err(Self::store_err)?;
      if swapped {
        expired += 1;
        self
          .log_quietly(LogEntry::new(
            LogAction::Expired,
            &request.number,
            format!("deadline {} passed", request.response_deadline),
            SYSTEM_ACTOR,
            now,
          ))
          .await;
      }
    }

    if expired > 0 {
      tracing::info!(count = expired, "expired overdue requests");
    }
    Ok(expired)
  }

  /// Non-terminal requests whose deadline falls within the alert window.
  pub async fn due_soon(&self) -> Result<Vec<Request>> {
    let now = self.clock.now();
    let window = Duration::days(self.config.deadlines.expiry_alert_days);

    let due = self
      .store
      .list_all()
      .await
      .map_err(Self::store_err)?
      .into_iter()
      .filter(|r| {
        !r.status.is_terminal()
          && !r.is_overdue(now)
          && r.response_deadline - now <= window
      })
      .collect();
    Ok(due)
  }
}

// ─── Generated identifiers ───────────────────────────────────────────────────

/// `SOL-<year>-<5 digits>`, the suffix derived from the creation instant.
fn generate_number(now: DateTime<Utc>) -> String {
  format!("SOL-{}-{:05}", now.year(), now.timestamp_millis().rem_euclid(100_000))
}

/// Opaque one-time token: 64 hex characters of v4-UUID randomness.
fn generate_token() -> String {
  format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
