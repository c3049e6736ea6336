use xsched_proto::gen::offer_operation;
use xsched_proto::{FrameworkID, Msg};
use xsched_service::{Error, Flow, Stage};

/// Captures the framework id assigned on subscribe and stamps it onto
/// every outbound call, including the nested ids a `Subscribe` or an
/// `Accept`/`LaunchGroup` executor carries.
pub struct FrameworkIdStage {
    framework_id: Option<FrameworkID>,
    preconfigured: bool,
}

impl FrameworkIdStage {
    pub fn new() -> Self {
        Self {
            framework_id: None,
            preconfigured: false,
        }
    }

    /// Skip discovery: use `id` for every call from the start.
    pub fn set_framework_id(mut self, id: FrameworkID) -> Self {
        self.framework_id = Some(id);
        self.preconfigured = true;
        self
    }
}

impl<D: Flow<Message = Msg>> Stage<D> for FrameworkIdStage {
    type Wired = FrameworkIdFlow<D>;

    fn via(self, downstream: D) -> Self::Wired {
        FrameworkIdFlow {
            downstream,
            framework_id: self.framework_id,
            preconfigured: self.preconfigured,
        }
    }
}

pub struct FrameworkIdFlow<D> {
    downstream: D,
    framework_id: Option<FrameworkID>,
    preconfigured: bool,
}

impl<D: Flow<Message = Msg>> Flow for FrameworkIdFlow<D> {
    type Message = Msg;

    async fn pull(&mut self) -> Result<Msg, Error> {
        let msg = self.downstream.pull().await?;

        if !self.preconfigured {
            if let Msg::Event(event) = &msg {
                if event.is_subscribed() {
                    if let Some(subscribed) = &event.subscribed {
                        self.framework_id = Some(subscribed.framework_id.clone());
                    }
                }
            }
        }

        Ok(msg)
    }

    async fn push(&mut self, mut msg: Msg) -> Result<(), Error> {
        if let (Msg::Call(call), Some(id)) = (&mut msg, &self.framework_id) {
            call.framework_id = Some(id.clone());

            if call.is_accept() {
                if let Some(accept) = call.accept.as_mut() {
                    for op in &mut accept.operations {
                        if op.r#type() == offer_operation::Type::LaunchGroup {
                            if let Some(lg) = op.launch_group.as_mut() {
                                lg.executor.framework_id = Some(id.clone());
                            }
                        }
                    }
                }
            }

            if call.is_subscribe() {
                if let Some(subscribe) = call.subscribe.as_mut() {
                    subscribe.framework_info.id = Some(id.clone());
                }
            }
        }

        self.downstream.push(msg).await
    }

    fn close(&mut self) {
        self.downstream.close()
    }
}
