use tracing::warn;
use xsched_proto::{acknowledge, Msg};
use xsched_service::{Error, Flow, Stage};

/// Synthesizes and pushes an `ACKNOWLEDGE` call for every `Update` event
/// whose status carries a non-empty UUID, before handing the event back
/// to the caller.
pub struct ImplicitAckStage {
    propagate_push_errors: bool,
}

impl ImplicitAckStage {
    pub fn new() -> Self {
        Self {
            propagate_push_errors: false,
        }
    }

    /// If set, a failed acknowledgement push fails the pull that triggered
    /// it instead of being logged and ignored.
    pub fn propagate_push_errors(mut self) -> Self {
        self.propagate_push_errors = true;
        self
    }
}

impl<D: Flow<Message = Msg>> Stage<D> for ImplicitAckStage {
    type Wired = ImplicitAckFlow<D>;

    fn via(self, downstream: D) -> Self::Wired {
        ImplicitAckFlow {
            downstream,
            framework_id: None,
            propagate_push_errors: self.propagate_push_errors,
        }
    }
}

pub struct ImplicitAckFlow<D> {
    downstream: D,
    framework_id: Option<xsched_proto::FrameworkID>,
    propagate_push_errors: bool,
}

impl<D: Flow<Message = Msg>> Flow for ImplicitAckFlow<D> {
    type Message = Msg;

    async fn pull(&mut self) -> Result<Msg, Error> {
        let msg = self.downstream.pull().await?;

        if let Msg::Event(event) = &msg {
            if event.is_subscribed() {
                if let Some(subscribed) = &event.subscribed {
                    self.framework_id = Some(subscribed.framework_id.clone());
                }
            } else if event.is_update() {
                let status = &event.update.as_ref().expect("UPDATE event carries a status").status;
                if !status.uuid.as_ref().map(|u| u.is_empty()).unwrap_or(true) {
                    let Some(framework_id) = self.framework_id.clone() else {
                        return Err(Error::other(crate::Error::NotYetSubscribed));
                    };
                    let agent_id = status.agent_id.clone().unwrap_or_default();
                    let uuid = status.uuid.clone().unwrap_or_default().to_vec();
                    let call = acknowledge(agent_id, status.task_id.clone(), uuid);
                    let call = xsched_proto::apply_opts(call, &[xsched_proto::framework_id(framework_id)]);
                    if let Err(e) = self.downstream.push(Msg::Call(call)).await {
                        if self.propagate_push_errors {
                            return Err(e);
                        }
                        warn!(error = %e, "implicit acknowledge push failed");
                    }
                }
            }
        }

        Ok(msg)
    }

    async fn push(&mut self, msg: Msg) -> Result<(), Error> {
        self.downstream.push(msg).await
    }

    fn close(&mut self) {
        self.downstream.close()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use xsched_proto::gen::{event, task_status};
    use xsched_proto::{AgentID, Event, Subscribed, TaskID, TaskStatus, Update};

    use super::*;

    struct Recording {
        inbox: VecDeque<Msg>,
        pushed: Vec<Msg>,
        fail_push: bool,
    }

    impl Flow for Recording {
        type Message = Msg;

        async fn pull(&mut self) -> Result<Msg, Error> {
            self.inbox.pop_front().ok_or(Error::Closed)
        }

        async fn push(&mut self, msg: Msg) -> Result<(), Error> {
            if self.fail_push {
                return Err(Error::other("boom"));
            }
            self.pushed.push(msg);
            Ok(())
        }

        fn close(&mut self) {}
    }

    fn subscribed() -> Msg {
        Msg::Event(Event {
            r#type: event::Type::Subscribed as i32,
            subscribed: Some(Subscribed {
                framework_id: xsched_proto::FrameworkID { value: "f1".into() },
                heartbeat_interval_seconds: None,
            }),
            offers: None,
            update: None,
            error: None,
        })
    }

    fn update(uuid: Vec<u8>) -> Msg {
        Msg::Event(Event {
            r#type: event::Type::Update as i32,
            subscribed: None,
            offers: None,
            update: Some(Update {
                status: TaskStatus {
                    task_id: TaskID { value: "t1".into() },
                    state: task_status::State::TaskRunning as i32,
                    agent_id: Some(AgentID { value: "a1".into() }),
                    uuid: Some(uuid.into()),
                    message: None,
                },
            }),
            error: None,
        })
    }

    #[tokio::test]
    async fn acknowledges_update_with_uuid_before_returning_it() {
        let downstream = Recording {
            inbox: VecDeque::from([subscribed(), update(vec![1, 2, 3])]),
            pushed: Vec::new(),
            fail_push: false,
        };
        let mut flow = ImplicitAckStage::new().via(downstream);

        flow.pull().await.unwrap();
        flow.pull().await.unwrap();

        assert_eq!(flow.downstream.pushed.len(), 1);
        assert!(matches!(&flow.downstream.pushed[0], Msg::Call(c) if c.r#type() == xsched_proto::gen::call::Type::Acknowledge));
    }

    #[tokio::test]
    async fn update_before_subscribed_is_an_error() {
        let downstream = Recording {
            inbox: VecDeque::from([update(vec![1])]),
            pushed: Vec::new(),
            fail_push: false,
        };
        let mut flow = ImplicitAckStage::new().via(downstream);
        assert!(flow.pull().await.is_err());
    }

    #[tokio::test]
    async fn push_failure_is_swallowed_by_default() {
        let downstream = Recording {
            inbox: VecDeque::from([subscribed(), update(vec![1])]),
            pushed: Vec::new(),
            fail_push: true,
        };
        let mut flow = ImplicitAckStage::new().via(downstream);
        flow.pull().await.unwrap();
        assert!(flow.pull().await.is_ok());
    }

    #[tokio::test]
    async fn push_failure_propagates_when_configured() {
        let downstream = Recording {
            inbox: VecDeque::from([subscribed(), update(vec![1])]),
            pushed: Vec::new(),
            fail_push: true,
        };
        let mut flow = ImplicitAckStage::new().propagate_push_errors().via(downstream);
        flow.pull().await.unwrap();
        assert!(flow.pull().await.is_err());
    }
}
