//! Generic pull/push pipeline abstraction for wrapping a long-lived
//! session: [`Flow`] is the shared surface, [`Stage`] wires one flow in
//! front of another by ownership transfer, and [`Blueprint`] re-materializes
//! a whole pipeline on reconnect.
//!
//! This crate knows nothing about Mesos `Call`/`Event` messages; it is
//! generic over `Flow::Message` so it can be reused for any duplex,
//! bounded-buffer session. The concrete stages (heartbeat, implicit-ack,
//! framework-id, monitor/call-opt) live alongside the session they wrap.

mod blueprint;
mod error;
mod flow;

pub use blueprint::{fn_blueprint, Blueprint, FnBlueprint, MatOpts};
pub use error::Error;
pub use flow::{Flow, Stage};

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    struct VecSink<M> {
        buf: VecDeque<M>,
        closed: bool,
    }

    impl<M> VecSink<M> {
        fn new() -> Self {
            Self {
                buf: VecDeque::new(),
                closed: false,
            }
        }
    }

    impl<M: Send> Flow for VecSink<M> {
        type Message = M;

        async fn pull(&mut self) -> Result<M, Error> {
            self.buf.pop_front().ok_or(Error::Closed)
        }

        async fn push(&mut self, msg: M) -> Result<(), Error> {
            if self.closed {
                return Err(Error::Closed);
            }
            self.buf.push_back(msg);
            Ok(())
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    /// A stage that forwards every pull/push unchanged, standing in for a
    /// real stage (heartbeat, implicit-ack, ...) in tests of the wiring
    /// machinery itself.
    struct Passthrough;

    struct PassthroughWired<D> {
        downstream: D,
    }

    impl<D: Flow> Stage<D> for Passthrough {
        type Wired = PassthroughWired<D>;

        fn via(self, downstream: D) -> Self::Wired {
            PassthroughWired { downstream }
        }
    }

    impl<D: Flow> Flow for PassthroughWired<D> {
        type Message = D::Message;

        async fn pull(&mut self) -> Result<Self::Message, Error> {
            self.downstream.pull().await
        }

        async fn push(&mut self, msg: Self::Message) -> Result<(), Error> {
            self.downstream.push(msg).await
        }

        fn close(&mut self) {
            self.downstream.close();
        }
    }

    #[tokio::test]
    async fn stage_via_wires_downstream_by_ownership_transfer() {
        let mut flow = Passthrough.via(VecSink::new());
        flow.push(42).await.unwrap();
        assert_eq!(flow.pull().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn nested_stages_compose_back_to_front() {
        let mut flow = Passthrough.via(Passthrough.via(VecSink::new()));
        flow.push("hello").await.unwrap();
        assert_eq!(flow.pull().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn close_is_idempotent_and_rejects_further_pushes() {
        let mut flow = Passthrough.via(VecSink::new());
        flow.close();
        flow.close();
        assert!(matches!(flow.push(1).await, Err(Error::Closed)));
    }

    #[tokio::test]
    async fn blueprint_materializes_independent_instances() {
        let blueprint = fn_blueprint(|_opts: &MatOpts| VecSink::<u32>::new());

        let mut first = blueprint.materialize(&MatOpts::new());
        first.push(1).await.unwrap();

        let mut second = blueprint.materialize(&MatOpts::new());
        assert!(matches!(second.pull().await, Err(Error::Closed)));
        assert_eq!(first.pull().await.unwrap(), 1);
    }

    #[test]
    fn error_display_and_source() {
        let err = Error::other(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert!(err.to_string().contains("boom"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(std::error::Error::source(&Error::Closed).is_none());
    }
}
