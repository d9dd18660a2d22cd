use crate::CapabilityKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error kinds that cross the protocol boundary as structured errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    UnknownCapability,
    InvalidArguments,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub kind: ErrorKind,
    pub message: String,
    pub variant: CapabilityKind,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

/// Failures of `Dispatcher::handle`.
///
/// The first two are rejected before any handler runs. `Internal` marks a programming fault
/// (a registered id with no bound handler) and is the only kind allowed to escape as a
/// channel-level error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown {kind} `{id}`")]
    UnknownCapability { kind: CapabilityKind, id: String },

    #[error("Invalid arguments for {kind} `{id}`: parameter `{parameter}` {reason}")]
    InvalidArguments {
        kind: CapabilityKind,
        id: String,
        parameter: String,
        reason: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn unknown(kind: CapabilityKind, id: impl Into<String>) -> Self {
        Self::UnknownCapability {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid(
        kind: CapabilityKind,
        id: impl Into<String>,
        parameter: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArguments {
            kind,
            id: id.into(),
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::UnknownCapability { .. } => Some(ErrorKind::UnknownCapability),
            Self::InvalidArguments { .. } => Some(ErrorKind::InvalidArguments),
            Self::Internal(_) => None,
        }
    }

    /// Structured form of a protocol error; `None` for internal faults.
    pub fn envelope(&self) -> Option<ErrorEnvelope> {
        let message = self.to_string();
        match self {
            Self::UnknownCapability { kind, id } => Some(ErrorEnvelope {
                kind: ErrorKind::UnknownCapability,
                message,
                variant: *kind,
                id: id.clone(),
                parameter: None,
            }),
            Self::InvalidArguments {
                kind,
                id,
                parameter,
                ..
            } => Some(ErrorEnvelope {
                kind: ErrorKind::InvalidArguments,
                message,
                variant: *kind,
                id: id.clone(),
                parameter: Some(parameter.clone()),
            }),
            Self::Internal(_) => None,
        }
    }
}
