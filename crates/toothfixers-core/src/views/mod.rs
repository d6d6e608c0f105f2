//! Screen view models.
//!
//! Each screen owns its form state and issues at most one request per
//! user action. Entity data lives in the session's shared store.

mod create_patient;
mod create_record;
mod home;
mod search_patient;
mod search_record;

pub use create_patient::*;
pub use create_record::*;
pub use home::*;
pub use search_patient::*;
pub use search_record::*;

use std::fmt;

use crate::api::{ApiError, ErrorKind};

/// Error shown inline by a screen: generic text plus the tagged cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ViewError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Wrap a gateway error under a screen's message.
    pub fn from_api(err: &ApiError, message: &str) -> Self {
        Self::new(err.kind(), message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ViewError {}

/// Result of a screen action whose request completed.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The response was applied to the screen.
    Applied(T),
    /// A newer request for the same action was issued; this one was dropped.
    Superseded,
}

impl<T> Outcome<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(v) => Some(v),
            Outcome::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Outcome::Superseded)
    }
}

pub type ViewResult<T> = Result<Outcome<T>, ViewError>;

/// True when a required text input is blank.
fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Empty optional text inputs are sent as `null`.
fn non_empty(value: &str) -> Option<String> {
    if is_blank(value) {
        None
    } else {
        Some(value.to_string())
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
