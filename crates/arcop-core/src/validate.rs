//! Field-level validation of a submitted request.
//!
//! Every rule that fails contributes one `(field, message)` entry, in
//! declaration order, so the caller can surface either the first failure or
//! the full list.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::{
  request::{AccessScope, NewRequest},
  rut,
};

const NAME_MIN_LEN: usize = 3;
const NAME_MAX_LEN: usize = 100;

static NAME_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[\p{L} ]+$").expect("name pattern"));

static EMAIL_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

/// Chilean mobile number: `+56 9 XXXX XXXX`, separators and leading `+`
/// optional.
static PHONE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\+?56 ?9 ?\d{4} ?\d{4}$").expect("phone pattern"));

// ─── Failure types ───────────────────────────────────────────────────────────

/// A single violated field rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
  pub field:   &'static str,
  pub message: &'static str,
}

/// The ordered list of violated rules for one submission.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationFailures {
  pub failures: Vec<FieldFailure>,
}

impl ValidationFailures {
  pub fn is_empty(&self) -> bool {
    self.failures.is_empty()
  }

  /// The minimal contract: just the first violated rule.
  pub fn first(&self) -> Option<&FieldFailure> {
    self.failures.first()
  }

  fn push(&mut self, field: &'static str, message: &'static str) {
    self.failures.push(FieldFailure { field, message });
  }
}

impl fmt::Display for ValidationFailures {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, failure) in self.failures.iter().enumerate() {
      if i > 0 {
        f.write_str("; ")?;
      }
      write!(f, "{}: {}", failure.field, failure.message)?;
    }
    Ok(())
  }
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Validate a submitted request, collecting every violated rule.
pub fn validate(draft: &NewRequest) -> Result<(), ValidationFailures> {
  let mut failures = ValidationFailures::default();

  let name = draft.full_name.trim();
  if name.is_empty() {
    failures.push("full_name", "full name is required");
  } else if name.chars().count() < NAME_MIN_LEN {
    failures.push("full_name", "full name must have at least 3 characters");
  } else if name.chars().count() > NAME_MAX_LEN {
    failures.push("full_name", "full name is too long");
  } else if !NAME_RE.is_match(name) {
    failures.push("full_name", "full name may only contain letters and spaces");
  }

  if draft.rut.trim().is_empty() {
    failures.push("rut", "RUT is required");
  } else if !rut::is_valid(&draft.rut) {
    failures.push("rut", "RUT is not valid");
  }

  let email = draft.email.trim();
  if email.is_empty() {
    failures.push("email", "email is required");
  } else if !EMAIL_RE.is_match(email) {
    failures.push("email", "email is not valid");
  }

  // Phone is optional; an empty string counts as absent.
  if let Some(phone) = draft.phone.as_deref() {
    let phone = phone.trim();
    if !phone.is_empty() && !PHONE_RE.is_match(phone) {
      failures.push("phone", "phone must match +56 9 XXXX XXXX");
    }
  }

  match draft.scope {
    None => failures.push("scope", "scope is required"),
    Some(AccessScope::Specific) if draft.categories.is_empty() => {
      failures.push("categories", "select at least one data category");
    }
    Some(_) => {}
  }

  if draft.preferred_format.is_none() {
    failures.push("preferred_format", "preferred format is required");
  }

  if !draft.terms_accepted {
    failures.push("terms_accepted", "terms and conditions must be accepted");
  }

  if failures.is_empty() {
    Ok(())
  } else {
    Err(failures)
  }
}
