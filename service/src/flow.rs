use core::future::Future;

use crate::Error;

/// A pull/push duplex endpoint: the operational surface every stage and
/// sink in a pipeline shares.
///
/// `pull` and `push` operate on the same [`Flow::Message`] in both
/// directions (the Call/Event/Ping tagged variant at the session boundary),
/// so stages that only care about one direction simply pass the other
/// through unchanged.
pub trait Flow: Send {
    type Message: Send;

    /// Receive the next message, waiting for one if none is buffered.
    fn pull(&mut self) -> impl Future<Output = Result<Self::Message, Error>> + Send;

    /// Send a message downstream.
    fn push(&mut self, msg: Self::Message) -> impl Future<Output = Result<(), Error>> + Send;

    /// Idempotent teardown. Does not consume `self` so a stage can close
    /// its downstream from within its own `close`.
    fn close(&mut self);
}

/// A stage that has not yet been wired to a downstream [`Flow`].
///
/// Linking stages through a stored, mutable downstream reference is a
/// cyclic-ownership hazard: stage N would hold a `&mut` into stage N+1 for
/// as long as the pipeline lives. `via` sidesteps that by consuming both
/// `self` and `downstream` and returning the wired flow by value, so a
/// pipeline is built back-to-front, sink first, then the stage adjacent to
/// it, and so on out to the head, with plain ownership transfer at every
/// step and no reference that could alias or outlive its target.
///
/// ```ignore
/// let flow = s1.via(s2.via(s3.via(sink)));
/// ```
pub trait Stage<D: Flow>: Sized {
    /// The flow produced once `downstream` is wired in. Carries the same
    /// message type as `D`: a pipeline is homogeneous end to end.
    type Wired: Flow<Message = D::Message>;

    fn via(self, downstream: D) -> Self::Wired;
}
