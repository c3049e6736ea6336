use core::fmt;
use std::error;

/// Error produced by a [`crate::LeaderClient`] call.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Every candidate endpoint (and every redirect chain off of each)
    /// was exhausted without finding a reachable leader.
    NoAvailableLeader { last_error: Box<xsched_http::Error> },
    /// A redirect's `Location` pointed somewhere that couldn't be turned
    /// back into a request URI for the original endpoint's scheme/path.
    InvalidRedirectTarget(String),
    /// No candidate endpoint was tried at all (`max_redirects` is 0).
    NoCandidatesTried,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAvailableLeader { last_error } => {
                write!(f, "request failed on all endpoints, last error: {last_error}")
            }
            Self::InvalidRedirectTarget(loc) => write!(f, "could not redirect to {loc}"),
            Self::NoCandidatesTried => f.write_str("no candidate endpoint was tried (max_redirects is 0)"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::NoAvailableLeader { last_error } => Some(last_error),
            Self::InvalidRedirectTarget(_) | Self::NoCandidatesTried => None,
        }
    }
}
