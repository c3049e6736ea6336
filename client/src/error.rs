use core::fmt;
use std::error;

/// Error produced by a [`crate::Session`] operation or a flow stage.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The first call pushed through a fresh session was not `SUBSCRIBE`.
    FirstMessageMustBeSubscribe,
    /// `SUBSCRIBE` was pushed while a previous subscribe attempt was still
    /// in flight or had already succeeded.
    AlreadySubscribing,
    /// The subscribe response carried an empty (or missing)
    /// `Mesos-Stream-Id` header.
    EmptyStreamId,
    /// A loopback [`crate::Session::push`]/[`crate::Session::inject`] found
    /// the event buffer full.
    BufferFull,
    /// The session (or the flow wrapping it) has been closed.
    Closed,
    /// The caller's or the session's context was cancelled.
    Cancelled,
    /// The implicit-ack stage observed an `Update` event before any
    /// `Subscribed` event.
    NotYetSubscribed,
    /// The outer retry driver exhausted its configured attempts without a
    /// surviving subscription.
    RetriesExhausted,
    /// A call to the leader-following HTTP layer failed.
    Leader(xsched_leader::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstMessageMustBeSubscribe => f.write_str("first message pushed must be a SUBSCRIBE call"),
            Self::AlreadySubscribing => f.write_str("a subscribe attempt is already in flight or completed"),
            Self::EmptyStreamId => f.write_str("subscribe response carried no Mesos-Stream-Id"),
            Self::BufferFull => f.write_str("event buffer is full"),
            Self::Closed => f.write_str("session is closed"),
            Self::Cancelled => f.write_str("operation cancelled"),
            Self::NotYetSubscribed => f.write_str("update event observed before subscribed"),
            Self::RetriesExhausted => f.write_str("retry driver exhausted its attempts"),
            Self::Leader(e) => write!(f, "leader client error: {e}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Leader(e) => Some(e),
            _ => None,
        }
    }
}

impl From<xsched_leader::Error> for Error {
    fn from(e: xsched_leader::Error) -> Self {
        Self::Leader(e)
    }
}

impl From<Error> for xsched_service::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Closed => xsched_service::Error::Closed,
            Error::Cancelled => xsched_service::Error::Cancelled,
            other => xsched_service::Error::other(other),
        }
    }
}
