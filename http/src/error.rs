use core::fmt;
use std::error;

use xsched_codec::CodecError;

/// Error produced by a single [`crate::Client::send`] call.
///
/// Variants below `Transport`/`Codec` are the decoded meaning of an HTTP
/// status code the master/agent returned, per the scheduler API's status
/// contract: a 2xx means the call was accepted, everything else carries a
/// specific, actionable meaning rather than a bare status code.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The underlying HTTP request/response exchange failed (DNS, connect,
    /// TLS, or the request/response timeout expiring).
    Transport(reqwest::Error),
    /// The response body could not be decoded as a message.
    Codec(CodecError),
    /// `307 Temporary Redirect`: the current master is no longer the
    /// leader. `leader_host_port` is parsed out of the `Location` header.
    Redirect { leader_host_port: String },
    /// `400 Bad Request`: the call was rejected with the given body text.
    Malformed(String),
    /// `401 Unauthorized`.
    Unauthenticated,
    /// `403 Forbidden`: the framework is not (yet, or any longer) subscribed.
    Unsubscribed,
    /// `404 Not Found`.
    NotFound,
    /// `406 Not Acceptable`: server rejected the `Accept` media type.
    MediaType(String),
    /// `409 Conflict`: framework/master version mismatch.
    Version,
    /// `429 Too Many Requests`.
    RateLimited,
    /// `503 Service Unavailable`.
    Unavailable,
    /// Any other non-success status code.
    Protocol(u16),
    /// A `307`'s `Location` header was missing or not a `host:port` URI.
    InvalidRedirectLocation(String),
    /// A client-side timeout budget (see [`crate::TimeoutConfig`]) elapsed
    /// before the phase it bounds completed.
    Timeout(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Codec(e) => write!(f, "codec error: {e}"),
            Self::Redirect { leader_host_port } => write!(f, "leader changed, now at {leader_host_port}"),
            Self::Malformed(body) => write!(f, "malformed request: {body}"),
            Self::Unauthenticated => f.write_str("unauthenticated"),
            Self::Unsubscribed => f.write_str("framework is not subscribed"),
            Self::NotFound => f.write_str("not found"),
            Self::MediaType(ct) => write!(f, "unacceptable media type: {ct}"),
            Self::Version => f.write_str("version conflict"),
            Self::RateLimited => f.write_str("rate limited"),
            Self::Unavailable => f.write_str("master unavailable"),
            Self::Protocol(code) => write!(f, "protocol error, status {code}"),
            Self::InvalidRedirectLocation(loc) => write!(f, "redirect location is not host:port: {loc}"),
            Self::Timeout(phase) => write!(f, "{phase} timed out"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

/// `true` if `err` is a [`Error::Redirect`], with the new leader's address.
pub fn is_redirect(err: &Error) -> Option<&str> {
    match err {
        Error::Redirect { leader_host_port } => Some(leader_host_port),
        _ => None,
    }
}
