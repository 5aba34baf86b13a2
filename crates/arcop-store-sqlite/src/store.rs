//! [`SqliteStore`] — the SQLite implementation of [`RequestStore`].

use std::path::Path;

use chrono::{DateTime, Utc};

use arcop_core::{
  audit::LogEntry,
  lifecycle::RequestStatus,
  request::Request,
  store::{RequestPatch, RequestStats, RequestStore},
};

use crate::{
  Error, Result,
  encode::{
    RawLogEntry, RawRequest, encode_bool, encode_categories, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Row helpers ─────────────────────────────────────────────────────────────

const REQUEST_COLUMNS: &str = "id, number, submitted_at, kind, status, \
   full_name, rut, email, phone, scope, categories, preferred_format, \
   identity_validated, validation_token, token_expiry, response_deadline, \
   days_remaining, assigned_to, resolved_at, download_url, \
   download_url_expiry, origin_ip, user_agent, created_at, updated_at";

fn read_request_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRequest> {
  Ok(RawRequest {
    id:                  row.get(0)?,
    number:              row.get(1)?,
    submitted_at:        row.get(2)?,
    kind:                row.get(3)?,
    status:              row.get(4)?,
    full_name:           row.get(5)?,
    rut:                 row.get(6)?,
    email:               row.get(7)?,
    phone:               row.get(8)?,
    scope:               row.get(9)?,
    categories:          row.get(10)?,
    preferred_format:    row.get(11)?,
    identity_validated:  row.get(12)?,
    validation_token:    row.get(13)?,
    token_expiry:        row.get(14)?,
    response_deadline:   row.get(15)?,
    days_remaining:      row.get(16)?,
    assigned_to:         row.get(17)?,
    resolved_at:         row.get(18)?,
    download_url:        row.get(19)?,
    download_url_expiry: row.get(20)?,
    origin_ip:           row.get(21)?,
    user_agent:          row.get(22)?,
    created_at:          row.get(23)?,
    updated_at:          row.get(24)?,
  })
}

/// Build the `SET` clause and positional arguments for a patch.
/// `updated_at` is always the first assignment.
fn patch_assignments(
  patch: &RequestPatch,
  now: DateTime<Utc>,
) -> (String, Vec<String>) {
  let mut sets = vec!["updated_at = ?1".to_owned()];
  let mut args = vec![encode_dt(now)];

  if let Some(status) = patch.status {
    args.push(status.as_str().to_owned());
    sets.push(format!("status = ?{}", args.len()));
  }
  if let Some(validated) = patch.identity_validated {
    args.push(encode_bool(validated).to_owned());
    sets.push(format!("identity_validated = ?{}", args.len()));
  }
  if let Some(assignee) = &patch.assigned_to {
    args.push(assignee.clone());
    sets.push(format!("assigned_to = ?{}", args.len()));
  }
  if let Some(at) = patch.resolved_at {
    args.push(encode_dt(at));
    sets.push(format!("resolved_at = ?{}", args.len()));
  }
  if let Some(url) = &patch.download_url {
    args.push(url.clone());
    sets.push(format!("download_url = ?{}", args.len()));
  }
  if let Some(at) = patch.download_url_expiry {
    args.push(encode_dt(at));
    sets.push(format!("download_url_expiry = ?{}", args.len()));
  }

  (sets.join(", "), args)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An ARCOP request store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Apply a patch, optionally guarded by an expected current status.
  /// The guard and the update are a single SQL statement, so concurrent
  /// transitions against the same request cannot both win.
  async fn apply_patch(
    &self,
    token: &str,
    expected: Option<RequestStatus>,
    patch: RequestPatch,
    now: DateTime<Utc>,
  ) -> Result<bool> {
    let (sets, mut args) = patch_assignments(&patch, now);

    args.push(token.to_owned());
    let mut sql = format!(
      "UPDATE requests SET {sets} WHERE validation_token = ?{}",
      args.len()
    );
    if let Some(expected) = expected {
      args.push(expected.as_str().to_owned());
      sql.push_str(&format!(" AND status = ?{}", args.len()));
    }

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(&sql, rusqlite::params_from_iter(args))?)
      })
      .await?;

    Ok(affected > 0)
  }
}

// ─── RequestStore impl ───────────────────────────────────────────────────────

impl RequestStore for SqliteStore {
  type Error = Error;

  async fn append(&self, request: &Request) -> Result<()> {
    let id_str         = encode_uuid(request.id);
    let number         = request.number.clone();
    let submitted_str  = encode_dt(request.submitted_at);
    let kind           = request.kind.as_str().to_owned();
    let status         = request.status.as_str().to_owned();
    let full_name      = request.full_name.clone();
    let rut            = request.rut.clone();
    let email          = request.email.clone();
    let phone          = request.phone.clone();
    let scope          = request.scope.as_str().to_owned();
    let categories     = encode_categories(&request.categories)?;
    let format         = request.preferred_format.as_str().to_owned();
    let validated      = encode_bool(request.identity_validated).to_owned();
    let token          = request.validation_token.clone();
    let token_expiry   = encode_dt(request.validation_token_expiry);
    let deadline       = encode_dt(request.response_deadline);
    let days_remaining = request.days_remaining;
    let assigned_to    = request.assigned_to.clone();
    let resolved_at    = request.resolved_at.map(encode_dt);
    let download_url   = request.download_url.clone();
    let download_exp   = request.download_url_expiry.map(encode_dt);
    let origin_ip      = request.origin_ip.clone();
    let user_agent     = request.user_agent.clone();
    let created_str    = encode_dt(request.created_at);
    let updated_str    = encode_dt(request.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO requests (
             id, number, submitted_at, kind, status,
             full_name, rut, email, phone, scope,
             categories, preferred_format, identity_validated,
             validation_token, token_expiry, response_deadline,
             days_remaining, assigned_to, resolved_at,
             download_url, download_url_expiry,
             origin_ip, user_agent, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                     ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22,
                     ?23, ?24, ?25)",
          rusqlite::params![
            id_str,
            number,
            submitted_str,
            kind,
            status,
            full_name,
            rut,
            email,
            phone,
            scope,
            categories,
            format,
            validated,
            token,
            token_expiry,
            deadline,
            days_remaining,
            assigned_to,
            resolved_at,
            download_url,
            download_exp,
            origin_ip,
            user_agent,
            created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_by_token(&self, token: &str) -> Result<Option<Request>> {
    use rusqlite::OptionalExtension as _;

    let token = token.to_owned();
    let raw: Option<RawRequest> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {REQUEST_COLUMNS} FROM requests \
                 WHERE validation_token = ?1"
              ),
              rusqlite::params![token],
              read_request_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRequest::into_request).transpose()
  }

  async fn find_by_email(&self, email: &str) -> Result<Vec<Request>> {
    // Stored lowercased; lowering the needle makes the match
    // case-insensitive while still using the email index.
    let needle = email.to_lowercase();

    let raws: Vec<RawRequest> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REQUEST_COLUMNS} FROM requests WHERE email = ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![needle], read_request_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRequest::into_request).collect()
  }

  async fn update_fields(
    &self,
    token: &str,
    patch: RequestPatch,
    now: DateTime<Utc>,
  ) -> Result<bool> {
    self.apply_patch(token, None, patch, now).await
  }

  async fn update_fields_if_status(
    &self,
    token: &str,
    expected: RequestStatus,
    patch: RequestPatch,
    now: DateTime<Utc>,
  ) -> Result<bool> {
    self.apply_patch(token, Some(expected), patch, now).await
  }

  async fn list_all(&self) -> Result<Vec<Request>> {
    let raws: Vec<RawRequest> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REQUEST_COLUMNS} FROM requests ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map([], read_request_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRequest::into_request).collect()
  }

  async fn aggregate_counts(&self) -> Result<RequestStats> {
    type Buckets = Vec<(String, i64)>;

    let (total, by_status, by_kind, by_format) = self
      .conn
      .call(|conn| {
        let total: i64 =
          conn.query_row("SELECT COUNT(*) FROM requests", [], |r| r.get(0))?;

        let group = |sql: &str| -> rusqlite::Result<Buckets> {
          let mut stmt = conn.prepare(sql)?;
          let rows = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<rusqlite::Result<Buckets>>()?;
          Ok(rows)
        };

        let by_status = group(
          "SELECT status, COUNT(*) FROM requests GROUP BY status",
        )?;
        let by_kind =
          group("SELECT kind, COUNT(*) FROM requests GROUP BY kind")?;
        let by_format = group(
          "SELECT preferred_format, COUNT(*) FROM requests \
           GROUP BY preferred_format",
        )?;

        Ok((total, by_status, by_kind, by_format))
      })
      .await?;

    let mut stats = RequestStats { total: total as usize, ..Default::default() };
    stats.by_status = by_status.into_iter().map(|(k, n)| (k, n as usize)).collect();
    stats.by_kind = by_kind.into_iter().map(|(k, n)| (k, n as usize)).collect();
    stats.by_format = by_format.into_iter().map(|(k, n)| (k, n as usize)).collect();
    Ok(stats)
  }

  async fn append_log(&self, entry: &LogEntry) -> Result<()> {
    let log_id    = encode_uuid(entry.log_id);
    let timestamp = encode_dt(entry.timestamp);
    let action    = entry.action.as_str().to_owned();
    let reference = entry.reference.clone();
    let detail    = entry.detail.clone();
    let actor     = entry.actor.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO logs (log_id, timestamp, action, reference, detail, actor)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![log_id, timestamp, action, reference, detail, actor],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_logs(&self) -> Result<Vec<LogEntry>> {
    let raws: Vec<RawLogEntry> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT log_id, timestamp, action, reference, detail, actor
           FROM logs ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawLogEntry {
              log_id:    row.get(0)?,
              timestamp: row.get(1)?,
              action:    row.get(2)?,
              reference: row.get(3)?,
              detail:    row.get(4)?,
              actor:     row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLogEntry::into_entry).collect()
  }
}
