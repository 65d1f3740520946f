//! Error types surfaced by hooks and the runtime.

use thiserror::Error;

use crate::element::ViewId;

pub type HookResult<T> = Result<T, HookError>;

/// Errors delivered to the host through [`HostBus::report_error`](crate::HostBus::report_error).
#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    ConfigParse(#[from] ConfigParseError),

    #[error("no hook registered under `{0}`")]
    UnknownHook(String),

    #[error("view `{0}` is already mounted")]
    AlreadyMounted(ViewId),

    #[error("view `{0}` is not mounted")]
    NotMounted(ViewId),
}

/// A configuration payload could not be turned into a usable value.
#[derive(Debug, Error)]
pub enum ConfigParseError {
    #[error("configuration source `{0}` is absent")]
    MissingSource(&'static str),

    #[error("malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// A rendering library rejected a specification.
///
/// Recovered inside the adapter that started the construction; never reaches
/// the host error channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RenderConstructionError {
    message: String,
}

impl RenderConstructionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
