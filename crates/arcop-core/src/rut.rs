//! Chilean RUT checksum validation and formatting.
//!
//! A RUT is a numeric body plus a modulus-11 check digit (`0`–`9` or `K`).
//! Both functions are total: malformed input yields `false` (or the input
//! unchanged) rather than an error.

/// Strip every character that is not a digit or the letter K, upper-casing
/// the result.
fn normalize(rut: &str) -> String {
  rut
    .chars()
    .filter(|c| c.is_ascii_digit() || c.eq_ignore_ascii_case(&'k'))
    .map(|c| c.to_ascii_uppercase())
    .collect()
}

/// Compute the expected check digit for a numeric body.
///
/// Digits are weighted from least-significant to most-significant with the
/// cycle 2, 3, 4, 5, 6, 7, 2, … and summed; the digit is `11 - (sum mod 11)`
/// with 11 mapping to `0` and 10 mapping to `K`.
fn check_digit(body: &str) -> char {
  let mut sum = 0u32;
  let mut multiplier = 2u32;

  for c in body.chars().rev() {
    sum += c.to_digit(10).unwrap_or(0) * multiplier;
    multiplier = if multiplier == 7 { 2 } else { multiplier + 1 };
  }

  match 11 - (sum % 11) {
    11 => '0',
    10 => 'K',
    d => char::from_digit(d, 10).unwrap_or('0'),
  }
}

/// Validate a RUT, accepting it with or without dots and hyphen.
///
/// Inputs whose normalised form is shorter than 8 characters, or whose body
/// contains anything but digits, are invalid.
pub fn is_valid(rut: &str) -> bool {
  let clean = normalize(rut);
  if clean.len() < 8 {
    return false;
  }

  let (body, dv) = clean.split_at(clean.len() - 1);
  if !body.chars().all(|c| c.is_ascii_digit()) {
    return false;
  }

  dv.starts_with(check_digit(body))
}

/// Format a RUT with thousands separators and a hyphen before the check
/// digit, e.g. `12345678-5` becomes `12.345.678-5`.
///
/// Inputs shorter than 2 normalised characters are returned as-is.
pub fn format(rut: &str) -> String {
  let clean = normalize(rut);
  if clean.len() < 2 {
    return clean;
  }

  let (body, dv) = clean.split_at(clean.len() - 1);

  // Group the body in blocks of 3, counting from the right.
  let mut reversed = String::with_capacity(body.len() + body.len() / 3);
  for (i, c) in body.chars().rev().enumerate() {
    if i > 0 && i % 3 == 0 {
      reversed.push('.');
    }
    reversed.push(c);
  }
  let grouped: String = reversed.chars().rev().collect();

  format!("{grouped}-{dv}")
}
