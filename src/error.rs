//! Error types for the facade.
//!
//! Configuration problems (bad descriptors, incomplete builders, unusable conditions) are
//! raised eagerly as [`FacadeError::Configuration`]. Failures reported by an executor are
//! carried through unchanged in [`FacadeError::Execution`].

use std::fmt;

use crate::executor::ExecutionError;
use crate::value::ValueError;

/// Error returned by every facade operation.
#[derive(Debug)]
pub enum FacadeError {
    /// Descriptor, builder or condition misconfiguration. Never retried.
    Configuration(String),
    /// Error reported by the executor, passed through untranslated
    Execution(ExecutionError),
    /// A row value could not be written into an entity field
    Materialization {
        column: String,
        source: ValueError,
    },
}

impl FacadeError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        FacadeError::Configuration(message.into())
    }

    /// Returns `true` for [`FacadeError::Configuration`].
    pub fn is_configuration(&self) -> bool {
        matches!(self, FacadeError::Configuration(_))
    }
}

impl fmt::Display for FacadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacadeError::Configuration(s) => write!(f, "Configuration error: {s}"),
            FacadeError::Execution(e) => write!(f, "Execution error: {e}"),
            FacadeError::Materialization { column, source } => {
                write!(f, "Failed to materialize column '{column}': {source}")
            }
        }
    }
}

impl std::error::Error for FacadeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FacadeError::Configuration(_) => None,
            FacadeError::Execution(e) => Some(e),
            FacadeError::Materialization { source, .. } => Some(source),
        }
    }
}

impl From<ExecutionError> for FacadeError {
    fn from(err: ExecutionError) -> Self {
        FacadeError::Execution(err)
    }
}
