//! Error types.
//!
//! Reconciliation is total and never fails. Errors only come from the host
//! adapter while a script is applied, or from a scheduler that cannot reach
//! a quiet state.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RenderError>;

/// Failure reported by a [`HostAdapter`](crate::host::HostAdapter).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("unknown host handle: {handle}")]
    UnknownHandle { handle: String },

    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: String, child: String },

    #[error("host operation `{op}` failed (injected)")]
    Injected { op: &'static str },

    #[error("host error: {message}")]
    Other { message: String },
}

impl HostError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Error surfaced by mounting, applying or flushing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// An adapter call failed. The rest of the edit script was abandoned.
    #[error("host adapter failure: {0}")]
    Host(#[from] HostError),

    #[error("nothing is mounted")]
    NotMounted,

    /// A child index in the script does not fit the mounted tree.
    #[error("edit script does not match the mounted tree at child index {index}")]
    ScriptMismatch { index: usize },

    /// Updates kept scheduling more updates.
    #[error("scheduler still busy after {passes} flush passes")]
    FlushLimitExceeded { passes: usize },
}

impl RenderError {
    /// True if the host tree may be left partially patched.
    #[must_use]
    pub fn is_host_failure(&self) -> bool {
        matches!(self, Self::Host(_))
    }
}
