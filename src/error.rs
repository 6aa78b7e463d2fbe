//! Error types shared by the reactive runtime, the scene registry and the
//! component binder.

use std::fmt;

use thiserror::Error;

use crate::engine::NodeId;

pub type Result<T> = std::result::Result<T, UikitError>;

#[derive(Debug, Error)]
pub enum UikitError {
    #[error("scene node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("cannot attach {child} under {parent}: {child} is an ancestor of {parent}")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("construction of {kind} failed: {message}")]
    Construction { kind: &'static str, message: String },

    #[error("cleanup failed: {message}")]
    Cleanup { message: String },

    #[error(transparent)]
    Teardown(#[from] TeardownError),

    #[error("reactive flush exceeded {runs} effect runs; an effect keeps invalidating itself")]
    RunawayFlush { runs: usize },
}

impl UikitError {
    #[must_use]
    pub fn construction(kind: &'static str, message: impl Into<String>) -> Self {
        Self::Construction {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn cleanup(message: impl Into<String>) -> Self {
        Self::Cleanup {
            message: message.into(),
        }
    }
}

/// Aggregate of every cleanup that failed while releasing one subscription list.
///
/// Only produced after all cleanups in the list have been attempted.
#[derive(Debug)]
pub struct TeardownError {
    failures: Vec<UikitError>,
}

impl TeardownError {
    pub(crate) fn new(failures: Vec<UikitError>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[UikitError] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<UikitError> {
        self.failures
    }
}

impl fmt::Display for TeardownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cleanup(s) failed during teardown", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            write!(f, "{}{failure}", if i == 0 { ": " } else { "; " })?;
        }
        Ok(())
    }
}

impl std::error::Error for TeardownError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teardown_error_lists_every_failure() {
        let err = TeardownError::new(vec![
            UikitError::cleanup("panel"),
            UikitError::cleanup("listener"),
        ]);
        assert_eq!(
            err.to_string(),
            "2 cleanup(s) failed during teardown: cleanup failed: panel; cleanup failed: listener"
        );
        assert_eq!(err.failures().len(), 2);
    }

    #[test]
    fn teardown_converts_into_uikit_error() {
        let err: UikitError = TeardownError::new(vec![UikitError::cleanup("x")]).into();
        assert!(matches!(err, UikitError::Teardown(_)));
    }
}
