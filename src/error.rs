use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Location of a value inside a profile: a section, optionally narrowed to one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub section: String,
    pub key: Option<String>,
}

impl FieldRef {
    pub fn key(section: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            key: Some(key.into()),
        }
    }

    pub fn section(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            key: None,
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "[{}] {}", self.section, key),
            None => write!(f, "[{}]", self.section),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse error for {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    #[error("{path}: {field} {reason}")]
    MissingField {
        path: PathBuf,
        field: FieldRef,
        reason: &'static str,
    },

    #[error("model '{model}' does not seem to use the {controller} EC ({path})")]
    NotSupported {
        path: PathBuf,
        model: String,
        controller: String,
        found: Option<String>,
    },

    #[error("{path}: {field} = '{value}': {detail}")]
    FieldFormat {
        path: PathBuf,
        field: FieldRef,
        value: String,
        detail: String,
    },
}

/// Coarse classification of an [`Error`], used by reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Read,
    Parse,
    MissingField,
    NotSupported,
    FieldFormat,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Read { .. } => ErrorKind::Read,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::MissingField { .. } => ErrorKind::MissingField,
            Error::NotSupported { .. } => ErrorKind::NotSupported,
            Error::FieldFormat { .. } => ErrorKind::FieldFormat,
        }
    }

    /// The profile the error was raised for.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Error::Read { path, .. }
            | Error::Parse { path, .. }
            | Error::MissingField { path, .. }
            | Error::NotSupported { path, .. }
            | Error::FieldFormat { path, .. } => path.as_path(),
        }
    }

    /// A profile for another controller is an expected outcome, not a defect.
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Error::NotSupported { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
