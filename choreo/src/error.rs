use chrono::Duration;
use choreo_store::StoreError;

use crate::time::LogicalTime;

/// Expectation mismatch, carrying the expected-versus-actual description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AssertionFailure {
    message: String,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot move logical time backward from {now} to {target}")]
    InvalidTime {
        now: LogicalTime,
        target: LogicalTime,
    },

    #[error("logical time overflow while adding {0}")]
    TimeOverflow(Duration),

    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    #[error("{count} events scheduled at <{at}> match <{expected}>, expected exactly one")]
    AmbiguousMatch {
        at: LogicalTime,
        expected: String,
        count: usize,
    },

    #[error("more than {0} events delivered for a single trigger")]
    CascadeLimit(usize),

    #[error("store `{0}`")]
    Store(#[from] StoreError),

    #[error("handler `{0}`")]
    Handler(#[from] anyhow::Error),
}

impl Error {
    pub fn is_assertion(&self) -> bool {
        matches!(self, Error::Assertion(_) | Error::AmbiguousMatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
