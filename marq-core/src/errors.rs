//! # Errors
//!
//! MarqRS carries a small structured error through `anyhow::Error`.
//! Core goals:
//! - consistent kinds that callers can dispatch on (NotFound vs everything else)
//! - transport-agnostic (the resolver layer decides how to serialize)
//! - recoverable conditions stay recoverable: cleanup paths downcast for
//!   `NotFound` and continue instead of failing the surrounding mutation.

use std::fmt;

use anyhow::Error as AnyError;

/// A convenience result type for MarqRS core APIs.
pub type MarqResult<T> = std::result::Result<T, AnyError>;

/// Error classes the content core distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Conflict,
    Unprocessable,
    GeneralError,
    Unavailable,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::Unavailable => "Unavailable",
        }
    }
}

/// A structured MarqRS error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct MarqError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<AnyError>,
}

impl MarqError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    /// Convert into `anyhow::Error` so it flows through the mutation pipeline.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` to a `MarqError` if possible.
    pub fn from_any(err: &AnyError) -> Option<&MarqError> {
        err.downcast_ref::<MarqError>()
    }

    /// True when `err` is a structured NotFound.
    pub fn is_not_found(err: &AnyError) -> bool {
        Self::from_any(err).map(|e| e.kind == ErrorKind::NotFound) == Some(true)
    }

    // ---- Constructors ----

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, msg)
    }
}

impl fmt::Display for MarqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)
    }
}

impl std::error::Error for MarqError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_survives_anyhow_roundtrip() {
        let err = MarqError::not_found("entity 42").into_anyhow();
        assert!(MarqError::is_not_found(&err));
        assert_eq!(MarqError::from_any(&err).unwrap().kind, ErrorKind::NotFound);
    }

    #[test]
    fn plain_anyhow_is_not_a_not_found() {
        let err = anyhow::anyhow!("boom");
        assert!(!MarqError::is_not_found(&err));
    }
}
