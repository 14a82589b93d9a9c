//! Field validation for request bodies.
//!
//! Rules are checked field by field in declaration order. Within a field the
//! first failing rule wins; across fields only the message of the last failing
//! field (or the trailing cross-field check) is reported.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$"
    )
    .unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Human-readable description of the last rule that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn message(&self) -> &str {
        &self.0
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Email,
}

impl Rule {
    fn check(self, value: &str) -> bool {
        match self {
            Rule::Required => !value.is_empty(),
            Rule::MinLength(n) => value.chars().count() >= n,
            Rule::MaxLength(n) => value.chars().count() <= n,
            Rule::Email => is_valid_email(value),
        }
    }

    fn message(self, field: &str) -> String {
        match self {
            Rule::Required => format!("Field {field} is required"),
            Rule::MinLength(n) => format!("Field {field} min length {n}"),
            Rule::MaxLength(n) => format!("Field {field} max length {n}"),
            Rule::Email => format!("Field {field} must be a valid email"),
        }
    }
}

pub const AT_LEAST_ONE_FIELD: &str = "At least one field is required";

/// Accumulates rule outcomes for one request body.
#[derive(Debug, Default)]
pub struct Validator {
    last_failure: Option<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks a field that must be present.
    pub fn field(&mut self, name: &str, value: &str, rules: &[Rule]) -> &mut Self {
        if let Some(rule) = rules.iter().copied().find(|r| !r.check(value)) {
            self.last_failure = Some(rule.message(name));
        }
        self
    }

    /// Checks a field only when it carries a non-empty value.
    pub fn optional(&mut self, name: &str, value: Option<&str>, rules: &[Rule]) -> &mut Self {
        match value {
            Some(v) if !v.is_empty() => self.field(name, v, rules),
            _ => self,
        }
    }

    /// Records a failure that is not tied to a single field.
    pub fn require(&mut self, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.last_failure = Some(message.to_string());
        }
        self
    }

    pub fn finish(&self) -> Result<(), ValidationError> {
        match &self.last_failure {
            Some(msg) => Err(ValidationError(msg.clone())),
            None => Ok(()),
        }
    }
}
