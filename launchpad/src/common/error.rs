//! Common Error Types
//!
//! Every failure in the fetch → validate → load chain is normalised into a
//! [`LoadError`] before it reaches event subscribers.

use std::fmt;

use launchpad_manifest::ManifestError;
use serde::Serialize;

use crate::driver::DriverError;
use crate::transport::TransportError;

/// Failure categories surfaced by a load attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Fetch succeeded but produced no usable value
    ManifestMissing,
    /// Response body was not valid JSON
    ManifestParse,
    /// `manifestVersion` is outside the supported range
    VersionIncompatible,
    /// `files` or `domNodes` has the wrong shape
    ManifestMalformed,
    /// HTTP primitive or host bridge failed
    Transport,
    /// The asset driver rejected the load
    Driver,
    /// Default collaborators could not be created
    Setup,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManifestMissing => "manifest_missing",
            Self::ManifestParse => "manifest_parse",
            Self::VersionIncompatible => "version_incompatible",
            Self::ManifestMalformed => "manifest_malformed",
            Self::Transport => "transport",
            Self::Driver => "driver",
            Self::Setup => "setup",
        }
    }
}

/// Loader error with a kind, a user-presentable message and optional context
#[derive(Debug, Clone, Serialize)]
pub struct LoadError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl LoadError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn setup(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Setup, message)
    }

    /// Text carried by the `error` event: the message, or the whole error as
    /// pretty JSON when there is no message.
    pub fn event_message(&self) -> String {
        if !self.message.is_empty() {
            return self.message.clone();
        }
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.kind.as_str().to_string())
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for LoadError {}

impl From<ManifestError> for LoadError {
    fn from(err: ManifestError) -> Self {
        let kind = match &err {
            ManifestError::Missing => ErrorKind::ManifestMissing,
            ManifestError::Parse => ErrorKind::ManifestParse,
            ManifestError::VersionIncompatible { .. } => ErrorKind::VersionIncompatible,
            ManifestError::FilesNotObject | ManifestError::DomNodesNotArray => {
                ErrorKind::ManifestMalformed
            }
        };

        let error = Self::new(kind, err.to_string());
        match err {
            ManifestError::VersionIncompatible { found, required } => error.with_data(
                serde_json::json!({ "found": found, "required": required }),
            ),
            _ => error,
        }
    }
}

impl From<TransportError> for LoadError {
    fn from(err: TransportError) -> Self {
        Self::transport(err.to_string())
    }
}

impl From<DriverError> for LoadError {
    fn from(err: DriverError) -> Self {
        Self::new(ErrorKind::Driver, err.to_string())
    }
}

// Convert to String (for callers that only want the event text)
impl From<LoadError> for String {
    fn from(err: LoadError) -> String {
        err.event_message()
    }
}
