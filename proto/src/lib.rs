//! Generated Call/Event message types plus the small amount of
//! hand-written glue (a closed `Message` sum, call builders, and event
//! predicates) that keeps stages from having to `match` on raw `Type`
//! enums at every call site.

mod calls;

pub use calls::*;

#[allow(clippy::all)]
pub mod gen {
    include!(concat!(env!("OUT_DIR"), "/scheduler.rs"));
}

pub use gen::{
    call::{Accept, Acknowledge, Decline, Kill, Subscribe},
    event::{Error as EventError, Offers, Subscribed, Update},
    offer_operation::LaunchGroup,
    value::Scalar,
    AgentID, Call, Event, ExecutorID, ExecutorInfo, Filters, FrameworkID, FrameworkInfo, KillPolicy, Offer,
    OfferID, OfferOperation, Ping, Resource, TaskID, TaskStatus, Value,
};

/// The closed set of messages that can travel through a [session][1] or a
/// [flow][2]: outbound `Call`s, inbound `Event`s, and the internal-only
/// `Ping` used for [loopback][3] injection.
///
/// Modeled as a tagged `enum` rather than a trait object so stages that
/// only care about `Call`s or only about `Event`s can pattern-match
/// directly, per the data model's "closed sum" design note.
///
/// [1]: https://docs.rs/xsched-client (`Session`)
/// [2]: https://docs.rs/xsched-service (`Flow`)
/// [3]: https://docs.rs/xsched-client (`Session::inject`)
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Call(Call),
    Event(Event),
    Ping(Ping),
}

impl Msg {
    /// Lowest-common accessor used by instrumentation: the message's type
    /// name, regardless of which variant it is.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Call(c) => c.type_name(),
            Self::Event(e) => e.type_name(),
            Self::Ping(_) => "PING",
        }
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Self::Call(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_call_mut(&mut self) -> Option<&mut Call> {
        match self {
            Self::Call(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Self::Event(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Call> for Msg {
    fn from(c: Call) -> Self {
        Self::Call(c)
    }
}

impl From<Event> for Msg {
    fn from(e: Event) -> Self {
        Self::Event(e)
    }
}

impl From<Ping> for Msg {
    fn from(p: Ping) -> Self {
        Self::Ping(p)
    }
}
