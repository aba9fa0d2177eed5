//! Field-level validation rules shared by registration, task creation,
//! list filters and partial updates.
//!
//! The `check_*` functions return a static reason on failure; the
//! `validate_*` wrappers adapt them to the `validator` crate so request
//! structs can use `#[validate(custom = "...")]`.

use std::borrow::Cow;

use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use validator::ValidationError;

/// Literal format of every due date accepted or returned by the API.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const MAX_EMAIL_LEN: usize = 254;
const MAX_LOCAL_PART_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 253;
const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 64;

const PASSWORD_SYMBOLS: &str = ".-!@#$%^&*()_+={}[]|:;\"'<>,?/~` ";

lazy_static! {
    // chrono alone accepts single-digit fields, so the shape is pinned first.
    static ref DUE_DATE_LITERAL: Regex =
        Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").unwrap();
}

/// A rejected input value, naming the offending field or query key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid `{field}`: {reason}")]
pub struct FieldError {
    pub field: &'static str,
    pub reason: Cow<'static, str>,
}

impl FieldError {
    pub fn new(field: &'static str, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Printable ASCII (`'!'..='~'`) or a plain space.
pub fn is_printable_text(value: &str) -> bool {
    value.chars().all(|c| ('!'..='~').contains(&c) || c == ' ')
}

/// Trims `raw` and checks it is non-empty printable text.
pub fn clean_text(field: &'static str, raw: &str) -> Result<String, FieldError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(FieldError::new(field, "can't be empty"));
    }
    if !is_printable_text(value) {
        return Err(FieldError::new(
            field,
            "only printable ASCII characters and spaces are allowed",
        ));
    }
    Ok(value.to_owned())
}

/// Parses a `YYYY-MM-DD HH:MM:SS` literal.
pub fn parse_due_date(field: &'static str, raw: &str) -> Result<NaiveDateTime, FieldError> {
    let value = raw.trim();
    if !DUE_DATE_LITERAL.is_match(value) {
        return Err(FieldError::new(field, "expected format YYYY-MM-DD HH:MM:SS"));
    }
    NaiveDateTime::parse_from_str(value, DUE_DATE_FORMAT)
        .map_err(|_| FieldError::new(field, "not a valid calendar date and time"))
}

/// Parses a due date and requires it to be strictly after `now`.
pub fn future_due_date(
    field: &'static str,
    raw: &str,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, FieldError> {
    let due = parse_due_date(field, raw)?;
    if due <= now {
        return Err(FieldError::new(field, "must be in the future"));
    }
    Ok(due)
}

pub fn check_email(email: &str) -> Result<(), &'static str> {
    if email.len() > MAX_EMAIL_LEN {
        return Err("email is too long");
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err("email must contain exactly one '@'"),
    };

    if local.is_empty() || local.len() > MAX_LOCAL_PART_LEN {
        return Err("local part must be 1-64 characters");
    }
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
        return Err("domain must be 1-253 characters");
    }
    if !domain.contains('.') {
        return Err("domain must contain at least one '.'");
    }

    check_email_segment(local)?;
    for label in domain.split('.') {
        check_email_segment(label)?;
    }
    Ok(())
}

// Local part or a single domain label.
fn check_email_segment(segment: &str) -> Result<(), &'static str> {
    let (Some(first), Some(last)) = (segment.chars().next(), segment.chars().last()) else {
        return Err("email contains an empty label");
    };
    if matches!(first, '.' | '-') || matches!(last, '.' | '-') {
        return Err("email parts can't start or end with '.' or '-'");
    }
    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err("email contains a forbidden character");
    }
    if segment.contains("..") || segment.contains("--") {
        return Err("email can't repeat '.' or '-'");
    }
    Ok(())
}

pub fn check_password(password: &str) -> Result<(), &'static str> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err("password is too short");
    }
    if len > MAX_PASSWORD_LEN {
        return Err("password is too long");
    }
    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c))
    {
        return Err("password contains a forbidden character");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    check_email(email).map_err(|reason| rejected("email", reason))
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    check_password(password).map_err(|reason| rejected("password", reason))
}

fn rejected(code: &'static str, reason: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(reason));
    error
}
