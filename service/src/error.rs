use core::fmt;
use std::error;

/// Error produced by a [`crate::Flow`] operation.
///
/// Concrete stages report their own failure modes (a deadline, a full
/// buffer, an upstream decode failure) through [`Error::Other`] rather than
/// growing this enum per stage; the three named variants are the outcomes
/// every stage in a pipeline needs to recognize and react to uniformly
/// (the outer retry driver treats all three as terminal).
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The flow (or the session underneath it) has been closed.
    Closed,
    /// The caller's context, or the flow's own context, was cancelled.
    Cancelled,
    /// A per-operation deadline (e.g. the heartbeat stage's) elapsed.
    DeadlineExceeded,
    /// A stage-specific failure that doesn't fit the variants above.
    Other(Box<dyn error::Error + Send + Sync>),
}

impl Error {
    pub fn other(err: impl Into<Box<dyn error::Error + Send + Sync>>) -> Self {
        Self::Other(err.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("flow is closed"),
            Self::Cancelled => f.write_str("operation cancelled"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
            Self::Other(e) => write!(f, "{e}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Other(e) => Some(e.as_ref()),
            Self::Closed | Self::Cancelled | Self::DeadlineExceeded => None,
        }
    }
}
